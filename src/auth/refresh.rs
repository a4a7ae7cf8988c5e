//! Refresh protocol
//!
//! An access token may be exchanged for a new one after its own expiry, as
//! long as the refresh token embedded in it is still valid. Each refresh
//! rotates the refresh token. The previous refresh token is not revoked:
//! nothing is stored server-side, so it stays usable until it expires.

use crate::auth::authenticator::Authenticator;
use crate::auth::error::TokenError;

impl Authenticator {
    /// Exchange an access token (expired or not) for a fresh one.
    ///
    /// # Errors
    /// - `Malformed`, `BadSignature` or `NotYetValid` if the access token is
    ///   invalid for any reason other than expiry
    /// - `RefreshDenied` if the embedded refresh token is expired or invalid;
    ///   the client must log in again
    /// - `Sign` if minting the new tokens fails
    pub fn refresh_access_token(&self, raw_access_token: &str) -> Result<String, TokenError> {
        let access = self.parse_access_token_tolerant(raw_access_token)?;

        let refresh = self
            .verify_refresh_token(&access.refresh_token)
            .map_err(|source| TokenError::RefreshDenied {
                source: Box::new(source),
            })?;

        let rotated = self.issue_refresh_token(&refresh.username)?;
        self.issue_access_token(&rotated)
    }
}
