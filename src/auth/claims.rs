//! Token claims
//!
//! Payloads carried inside the signed access and refresh tokens.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which of the two token flavours a claim set (or an error) belongs to.
///
/// Serialized into every token as `token_use` so an access token can never be
/// accepted where a refresh token is expected, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims of the short-lived access token.
///
/// The embedded refresh token is opaque here; it is only ever parsed by the
/// refresh protocol.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Signed refresh token minted in the same issuance event
    pub refresh_token: String,
    pub token_use: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn new(refresh_token: String, now: i64, lifespan_seconds: u64) -> Self {
        Self {
            refresh_token,
            token_use: TokenKind::Access,
            iat: now,
            nbf: now,
            exp: expiry(now, lifespan_seconds),
        }
    }
}

/// Claims of the long-lived refresh token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshTokenClaims {
    pub username: String,
    pub token_use: TokenKind,
    /// Per-issuance nonce; two refresh tokens are never byte-identical
    pub jti: Uuid,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl RefreshTokenClaims {
    pub fn new(username: String, now: i64, lifespan_seconds: u64) -> Self {
        Self {
            username,
            token_use: TokenKind::Refresh,
            jti: Uuid::new_v4(),
            iat: now,
            nbf: now,
            exp: expiry(now, lifespan_seconds),
        }
    }
}

/// Common view over both claim sets used by the verifier.
pub(crate) trait TokenClaims: Serialize + DeserializeOwned {
    const KIND: TokenKind;

    fn token_use(&self) -> TokenKind;
    fn not_before(&self) -> i64;
    fn expires_at(&self) -> i64;
}

impl TokenClaims for AccessTokenClaims {
    const KIND: TokenKind = TokenKind::Access;

    fn token_use(&self) -> TokenKind {
        self.token_use
    }

    fn not_before(&self) -> i64 {
        self.nbf
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl TokenClaims for RefreshTokenClaims {
    const KIND: TokenKind = TokenKind::Refresh;

    fn token_use(&self) -> TokenKind {
        self.token_use
    }

    fn not_before(&self) -> i64 {
        self.nbf
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

fn expiry(now: i64, lifespan_seconds: u64) -> i64 {
    let lifespan = i64::try_from(lifespan_seconds).unwrap_or(i64::MAX);
    now.saturating_add(lifespan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims_creation() {
        let claims = AccessTokenClaims::new("refresh".to_string(), 1_000, 30);

        assert_eq!(claims.refresh_token, "refresh");
        assert_eq!(claims.token_use, TokenKind::Access);
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.nbf, 1_000);
        assert_eq!(claims.exp, 1_030);
    }

    #[test]
    fn test_refresh_claims_get_unique_jti() {
        let first = RefreshTokenClaims::new("alice".to_string(), 1_000, 180);
        let second = RefreshTokenClaims::new("alice".to_string(), 1_000, 180);

        assert_eq!(first.exp, 1_180);
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_huge_lifespan_saturates() {
        let claims = RefreshTokenClaims::new("alice".to_string(), 1_000, u64::MAX);
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn test_token_use_serializes_lowercase() {
        let claims = AccessTokenClaims::new("r".to_string(), 0, 1);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["token_use"], "access");
    }
}
