//! Authentication error types
//!
//! One enum per concern: key material, password hashing, token handling and
//! token extraction. None of them log; callers decide what to record.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::auth::claims::TokenKind;

/// Which half of the keypair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Public,
    Private,
    /// Both halves are individually valid but do not belong together
    Pair,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Public => write!(f, "public"),
            KeyRole::Private => write!(f, "private"),
            KeyRole::Pair => write!(f, "key pair"),
        }
    }
}

/// Key loading, parsing and generation failures.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read {role} key from {}", path.display())]
    Load {
        role: KeyRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {role} key: {reason}")]
    Parse { role: KeyRole, reason: String },

    #[error("failed to generate keypair: {0}")]
    Generate(String),

    #[error("failed to write {role} key to {}", path.display())]
    Write {
        role: KeyRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Password hashing failures. A wrong password is not an error.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("malformed password hash: {0}")]
    HashFormat(String),

    #[error("password is longer than {max} bytes")]
    TooLong { max: usize },

    #[error("bcrypt cost {0} is outside the supported range 4..=31")]
    InvalidCost(u32),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Token issuance and verification failures.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign {kind} token: {reason}")]
    Sign { kind: TokenKind, reason: String },

    #[error("malformed {kind} token: {reason}")]
    Malformed { kind: TokenKind, reason: String },

    #[error("{kind} token signature is invalid")]
    BadSignature { kind: TokenKind },

    #[error("{kind} token expired at {expired_at}")]
    Expired { kind: TokenKind, expired_at: i64 },

    #[error("{kind} token is not valid before {not_before}")]
    NotYetValid { kind: TokenKind, not_before: i64 },

    /// The embedded refresh token is unusable; the client has to log in again.
    #[error("refresh denied, re-authentication required: {source}")]
    RefreshDenied {
        #[source]
        source: Box<TokenError>,
    },
}

impl TokenError {
    /// The token the failure concerns. Refresh denials always concern the
    /// refresh token.
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenError::Sign { kind, .. }
            | TokenError::Malformed { kind, .. }
            | TokenError::BadSignature { kind }
            | TokenError::Expired { kind, .. }
            | TokenError::NotYetValid { kind, .. } => *kind,
            TokenError::RefreshDenied { .. } => TokenKind::Refresh,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Expired { .. })
    }

    pub fn is_refresh_denied(&self) -> bool {
        matches!(self, TokenError::RefreshDenied { .. })
    }

    pub(crate) fn malformed(kind: TokenKind, reason: impl Into<String>) -> Self {
        TokenError::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}

/// Failure to pull a raw token out of an inbound request.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing {0}")]
    Missing(String),

    #[error("malformed {0}")]
    Malformed(String),
}

/// Token lifespans must be strictly positive.
#[derive(Debug, Error)]
#[error("{kind} token lifespan must be a positive number of seconds")]
pub struct LifespanError {
    pub kind: TokenKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_denied_keeps_source() {
        let err = TokenError::RefreshDenied {
            source: Box::new(TokenError::Expired {
                kind: TokenKind::Refresh,
                expired_at: 42,
            }),
        };

        assert!(err.is_refresh_denied());
        assert_eq!(err.kind(), TokenKind::Refresh);
        let source = std::error::Error::source(&err).expect("missing source");
        assert_eq!(source.to_string(), "refresh token expired at 42");
    }

    #[test]
    fn test_key_error_display_names_role() {
        let err = KeyError::Parse {
            role: KeyRole::Private,
            reason: "not RSA".to_string(),
        };
        assert_eq!(err.to_string(), "failed to parse private key: not RSA");
    }
}
