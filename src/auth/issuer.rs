//! Token issuance.

use serde::Serialize;

use crate::auth::authenticator::Authenticator;
use crate::auth::claims::{AccessTokenClaims, RefreshTokenClaims, TokenKind};
use crate::auth::error::TokenError;
use crate::auth::jwt;

/// A freshly minted access token and the refresh token embedded in it.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl Authenticator {
    /// Sign a refresh token for `username` valid for the refresh lifespan.
    pub fn issue_refresh_token(&self, username: &str) -> Result<String, TokenError> {
        let claims =
            RefreshTokenClaims::new(username.to_string(), self.now(), self.lifespans.refresh());
        jwt::sign(&claims, self.keys.encoding_key(), TokenKind::Refresh)
    }

    /// Sign an access token carrying `refresh_token`, valid for the access
    /// lifespan. The refresh token is embedded as-is and not checked here.
    pub fn issue_access_token(&self, refresh_token: &str) -> Result<String, TokenError> {
        let claims =
            AccessTokenClaims::new(refresh_token.to_string(), self.now(), self.lifespans.access());
        jwt::sign(&claims, self.keys.encoding_key(), TokenKind::Access)
    }

    /// Mint a refresh token, then an access token embedding it.
    pub fn issue_token_pair(&self, username: &str) -> Result<TokenPair, TokenError> {
        let refresh_token = self.issue_refresh_token(username)?;
        let access_token = self.issue_access_token(&refresh_token)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
