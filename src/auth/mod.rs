//! Authentication module
//!
//! Stateless dual-token authentication: RSA-signed access tokens that embed
//! a longer-lived refresh token, plus bcrypt password hashing and key
//! loading. Nothing in here logs or performs I/O after key loading.

mod authenticator;
mod claims;
mod clock;
mod error;
mod extractor;
mod issuer;
mod jwt;
mod keys;
mod password;
mod refresh;
mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use authenticator::{Authenticator, TokenLifespans};
pub use claims::{AccessTokenClaims, RefreshTokenClaims, TokenKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ExtractError, KeyError, KeyRole, LifespanError, PasswordError, TokenError};
pub use extractor::{BearerExtractor, CookieExtractor, TokenExtractor};
pub use issuer::TokenPair;
pub use keys::{
    generate_keypair, load_keypair, GeneratedKeypair, KeySource, Keypair, MIN_KEY_BITS,
    SIGNING_ALGORITHM,
};
pub use password::{CredentialHasher, DEFAULT_PASSWORD_COST, MAX_PASSWORD_BYTES};
