//! JWT Encoding and Decoding
//!
//! Thin layer over `jsonwebtoken` that signs with RS512 and maps decode
//! failures onto [`TokenError`]. Time-based checks are left to the verifier,
//! which needs to excuse expiry in tolerant mode.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;

use crate::auth::claims::TokenKind;
use crate::auth::error::TokenError;
use crate::auth::keys::SIGNING_ALGORITHM;

pub(crate) fn sign<T: Serialize>(
    claims: &T,
    key: &EncodingKey,
    kind: TokenKind,
) -> Result<String, TokenError> {
    encode(&Header::new(SIGNING_ALGORITHM), claims, key).map_err(|e| TokenError::Sign {
        kind,
        reason: e.to_string(),
    })
}

/// Check structure and signature and deserialize the claims. Does not look
/// at `exp` or `nbf`.
pub(crate) fn decode_verified<T: DeserializeOwned>(
    raw: &str,
    key: &DecodingKey,
    kind: TokenKind,
) -> Result<T, TokenError> {
    decode::<T>(raw, key, &signature_only_validation())
        .map(|data| data.claims)
        .map_err(|e| classify(e, kind))
}

fn signature_only_validation() -> Validation {
    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.leeway = 0;
    validation.required_spec_claims = ["exp", "nbf"]
        .into_iter()
        .map(String::from)
        .collect::<HashSet<_>>();
    validation
}

fn classify(err: jsonwebtoken::errors::Error, kind: TokenKind) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::BadSignature { kind },
        _ => TokenError::malformed(kind, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::AccessTokenClaims;

    const PUBLIC_PEM: &[u8] = include_bytes!("../../tests/fixtures/rsa.app.pub");
    const PRIVATE_PEM: &[u8] = include_bytes!("../../tests/fixtures/rsa.app");
    const OTHER_PUBLIC_PEM: &[u8] = include_bytes!("../../tests/fixtures/other.app.pub");

    fn keys() -> (EncodingKey, DecodingKey) {
        (
            EncodingKey::from_rsa_pem(PRIVATE_PEM).unwrap(),
            DecodingKey::from_rsa_pem(PUBLIC_PEM).unwrap(),
        )
    }

    #[test]
    fn test_sign_and_decode() {
        let (encoding, decoding) = keys();
        let claims = AccessTokenClaims::new("refresh".to_string(), 0, 30);

        let token = sign(&claims, &encoding, TokenKind::Access).expect("Failed to sign token");
        let decoded: AccessTokenClaims =
            decode_verified(&token, &decoding, TokenKind::Access).expect("Failed to decode");

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_header_uses_rs512() {
        let (encoding, _) = keys();
        let token = sign(
            &AccessTokenClaims::new("r".to_string(), 0, 30),
            &encoding,
            TokenKind::Access,
        )
        .unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, SIGNING_ALGORITHM);
    }

    #[test]
    fn test_expired_claims_still_decode() {
        let (encoding, decoding) = keys();
        let token = sign(
            &AccessTokenClaims::new("r".to_string(), 0, 1),
            &encoding,
            TokenKind::Access,
        )
        .unwrap();

        let decoded: Result<AccessTokenClaims, _> =
            decode_verified(&token, &decoding, TokenKind::Access);
        assert!(decoded.is_ok());
    }

    #[test]
    fn test_wrong_key_is_bad_signature() {
        let (encoding, _) = keys();
        let other = DecodingKey::from_rsa_pem(OTHER_PUBLIC_PEM).unwrap();
        let token = sign(
            &AccessTokenClaims::new("r".to_string(), 0, 30),
            &encoding,
            TokenKind::Access,
        )
        .unwrap();

        let result: Result<AccessTokenClaims, _> =
            decode_verified(&token, &other, TokenKind::Access);
        assert!(matches!(
            result,
            Err(TokenError::BadSignature {
                kind: TokenKind::Access
            })
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (_, decoding) = keys();
        for raw in ["", "invalid.token.here", "a.b", "...."] {
            let result: Result<AccessTokenClaims, _> =
                decode_verified(raw, &decoding, TokenKind::Access);
            assert!(
                matches!(result, Err(TokenError::Malformed { .. })),
                "{:?} should be malformed",
                raw
            );
        }
    }

    #[test]
    fn test_hs256_token_is_rejected() {
        let (_, decoding) = keys();
        let forged = encode(
            &Header::default(),
            &AccessTokenClaims::new("r".to_string(), 0, 30),
            &EncodingKey::from_secret(PUBLIC_PEM),
        )
        .unwrap();

        let result: Result<AccessTokenClaims, _> =
            decode_verified(&forged, &decoding, TokenKind::Access);
        assert!(matches!(result, Err(TokenError::Malformed { .. })));
    }
}
