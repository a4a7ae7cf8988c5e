//! The authentication aggregate.

use std::fmt;
use std::sync::Arc;

use crate::auth::claims::TokenKind;
use crate::auth::clock::{Clock, SystemClock};
use crate::auth::error::LifespanError;
use crate::auth::keys::Keypair;

/// How long each kind of token stays valid, in seconds.
///
/// The two values are independent. A refresh lifespan shorter than the access
/// lifespan is accepted; refresh then simply fails sooner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifespans {
    access: u64,
    refresh: u64,
}

impl TokenLifespans {
    pub fn new(access: u64, refresh: u64) -> Result<Self, LifespanError> {
        if access == 0 {
            return Err(LifespanError {
                kind: TokenKind::Access,
            });
        }
        if refresh == 0 {
            return Err(LifespanError {
                kind: TokenKind::Refresh,
            });
        }
        Ok(Self { access, refresh })
    }

    pub fn access(&self) -> u64 {
        self.access
    }

    pub fn refresh(&self) -> u64 {
        self.refresh
    }
}

/// Issues, verifies and refreshes tokens.
///
/// Holds the keypair, the lifespans and a clock, all fixed at construction.
/// It never records issued tokens, so it can be shared freely across threads
/// behind an `Arc`.
pub struct Authenticator {
    pub(crate) keys: Keypair,
    pub(crate) lifespans: TokenLifespans,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Authenticator {
    pub fn new(keys: Keypair, lifespans: TokenLifespans) -> Self {
        Self::with_clock(keys, lifespans, Arc::new(SystemClock))
    }

    pub fn with_clock(keys: Keypair, lifespans: TokenLifespans, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys,
            lifespans,
            clock,
        }
    }

    pub fn lifespans(&self) -> TokenLifespans {
        self.lifespans
    }

    pub(crate) fn now(&self) -> i64 {
        self.clock.now()
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("keys", &self.keys)
            .field("lifespans", &self.lifespans)
            .field("clock", &self.clock)
            .finish()
    }
}
