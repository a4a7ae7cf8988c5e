//! Token extraction strategies
//!
//! The authenticator does not care where a token travels. The transport
//! layer picks a [`TokenExtractor`] and hands the raw string over.

use actix_web::HttpRequest;

use crate::auth::error::ExtractError;

/// Pulls a raw token out of an inbound request of type `R`.
pub trait TokenExtractor<R: ?Sized> {
    fn extract(&self, request: &R) -> Result<String, ExtractError>;
}

/// `Authorization: Bearer <token>`
#[derive(Debug, Default, Clone, Copy)]
pub struct BearerExtractor;

impl TokenExtractor<HttpRequest> for BearerExtractor {
    fn extract(&self, request: &HttpRequest) -> Result<String, ExtractError> {
        let header = request
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .ok_or_else(|| ExtractError::Missing("authorization header".to_string()))?;

        let value = header
            .to_str()
            .map_err(|_| ExtractError::Malformed("authorization header".to_string()))?;

        match value.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
                let token = token.trim();
                if token.is_empty() {
                    Err(ExtractError::Missing("bearer token".to_string()))
                } else {
                    Ok(token.to_string())
                }
            }
            _ => Err(ExtractError::Malformed(
                "authorization header, expected Bearer scheme".to_string(),
            )),
        }
    }
}

/// Token carried in a named cookie.
#[derive(Debug, Clone)]
pub struct CookieExtractor {
    name: String,
}

impl CookieExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TokenExtractor<HttpRequest> for CookieExtractor {
    fn extract(&self, request: &HttpRequest) -> Result<String, ExtractError> {
        let cookie = request
            .cookie(&self.name)
            .ok_or_else(|| ExtractError::Missing(format!("{} cookie", self.name)))?;

        let value = cookie.value().trim();
        if value.is_empty() {
            return Err(ExtractError::Missing(format!("{} cookie value", self.name)));
        }
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_is_extracted() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_http_request();

        assert_eq!(BearerExtractor.extract(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "bearer abc"))
            .to_http_request();

        assert_eq!(BearerExtractor.extract(&req).unwrap(), "abc");
    }

    #[test]
    fn test_missing_header() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            BearerExtractor.extract(&req),
            Err(ExtractError::Missing(_))
        ));
    }

    #[test]
    fn test_wrong_scheme() {
        for value in ["Basic dXNlcjpwYXNz", "abc.def.ghi", "Token abc"] {
            let req = TestRequest::default()
                .insert_header(("Authorization", value))
                .to_http_request();
            assert!(
                matches!(BearerExtractor.extract(&req), Err(ExtractError::Malformed(_))),
                "{:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_empty_bearer_token() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer   "))
            .to_http_request();
        assert!(matches!(
            BearerExtractor.extract(&req),
            Err(ExtractError::Missing(_))
        ));
    }

    #[test]
    fn test_cookie_extractor() {
        let extractor = CookieExtractor::new("access_token");
        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new("access_token", "abc.def.ghi"))
            .to_http_request();
        assert_eq!(extractor.extract(&req).unwrap(), "abc.def.ghi");

        let req = TestRequest::default().to_http_request();
        assert!(matches!(extractor.extract(&req), Err(ExtractError::Missing(_))));
    }
}
