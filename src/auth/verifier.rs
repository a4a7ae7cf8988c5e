//! Token verification
//!
//! Signature and structure are checked first and are fatal in every mode.
//! Temporal checks follow: a token before its `nbf` is always rejected, a token
//! at or past its `exp` is rejected only in strict mode.

use crate::auth::authenticator::Authenticator;
use crate::auth::claims::{AccessTokenClaims, RefreshTokenClaims, TokenClaims};
use crate::auth::error::TokenError;
use crate::auth::jwt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Strict,
    /// Expiry alone is excused
    Tolerant,
}

impl Authenticator {
    /// Strictly verify an access token. Used to guard protected resources.
    pub fn verify_access_token(&self, raw: &str) -> Result<AccessTokenClaims, TokenError> {
        self.parse(raw, Mode::Strict)
    }

    /// Strictly verify a refresh token. Refresh tokens are never parsed
    /// tolerantly.
    pub fn verify_refresh_token(&self, raw: &str) -> Result<RefreshTokenClaims, TokenError> {
        self.parse(raw, Mode::Strict)
    }

    /// Parse an access token, returning its claims even when it has expired.
    /// Only the refresh protocol may use this.
    pub(crate) fn parse_access_token_tolerant(
        &self,
        raw: &str,
    ) -> Result<AccessTokenClaims, TokenError> {
        self.parse(raw, Mode::Tolerant)
    }

    fn parse<C: TokenClaims>(&self, raw: &str, mode: Mode) -> Result<C, TokenError> {
        let claims: C = jwt::decode_verified(raw, self.keys.decoding_key(), C::KIND)?;

        if claims.token_use() != C::KIND {
            return Err(TokenError::malformed(
                C::KIND,
                format!("token_use is {}", claims.token_use()),
            ));
        }

        let now = self.now();
        if now < claims.not_before() {
            return Err(TokenError::NotYetValid {
                kind: C::KIND,
                not_before: claims.not_before(),
            });
        }
        if now >= claims.expires_at() && mode == Mode::Strict {
            return Err(TokenError::Expired {
                kind: C::KIND,
                expired_at: claims.expires_at(),
            });
        }

        Ok(claims)
    }
}
