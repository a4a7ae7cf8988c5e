//! Application Error Handling
//!
//! Unifies the authentication domain errors with configuration and request
//! errors, maps them onto HTTP responses and logs them with request context.
//! Token failures become 403 responses; the `code` field tells a client
//! whether to refresh (`TOKEN_EXPIRED`) or to log in again
//! (`REFRESH_DENIED`).

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::auth::{ExtractError, KeyError, LifespanError, PasswordError, TokenError};

// ============================================================================
// 1. REQUEST-LEVEL AUTHENTICATION ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authentication token: {0}")]
    MissingToken(#[from] ExtractError),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required config: {0}")]
    MissingRequired(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("Config parse error: {0}")]
    ParseError(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<LifespanError> for ConfigError {
    fn from(err: LifespanError) -> Self {
        ConfigError::InvalidValue(err.to_string())
    }
}

// ============================================================================
// 2. UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::Auth(AuthError::MissingToken(err))
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(err.to_string())
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Status, machine-readable code and client-facing message.
    ///
    /// Internal details (key paths, hash formats) never reach the client.
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Token(e) => match e {
                TokenError::Expired { .. } => (
                    StatusCode::FORBIDDEN,
                    "TOKEN_EXPIRED",
                    "Access token has expired".to_string(),
                ),
                TokenError::NotYetValid { .. } => (
                    StatusCode::FORBIDDEN,
                    "TOKEN_NOT_YET_VALID",
                    "Token is not valid yet".to_string(),
                ),
                TokenError::RefreshDenied { .. } => (
                    StatusCode::FORBIDDEN,
                    "REFRESH_DENIED",
                    "Refresh denied, please log in again".to_string(),
                ),
                TokenError::Malformed { .. } | TokenError::BadSignature { .. } => (
                    StatusCode::FORBIDDEN,
                    "TOKEN_INVALID",
                    "Invalid token".to_string(),
                ),
                TokenError::Sign { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                ),
            },
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            AppError::Auth(AuthError::MissingToken(_)) => (
                StatusCode::FORBIDDEN,
                "MISSING_TOKEN",
                "Missing authentication token".to_string(),
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),
            AppError::Key(_) | AppError::Password(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    pub fn log_error(&self, request_id: &str) {
        match self {
            AppError::Token(e) => {
                tracing::warn!(
                    request_id = request_id,
                    token = %e.kind(),
                    error = %e,
                    "Token rejected"
                );
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Key(e) => {
                tracing::error!(request_id = request_id, error = %e, "Key error");
            }
            AppError::Password(e) => {
                tracing::error!(request_id = request_id, error = %e, "Password hashing error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }

    pub fn error_body(&self, request_id: &str) -> ErrorResponse {
        let (status, code, message) = self.classify();
        ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        )
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        HttpResponse::build(self.status_code()).json(self.error_body(&request_id))
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenKind;

    #[test]
    fn test_token_errors_are_forbidden() {
        let errors = vec![
            TokenError::Expired {
                kind: TokenKind::Access,
                expired_at: 0,
            },
            TokenError::BadSignature {
                kind: TokenKind::Access,
            },
            TokenError::Malformed {
                kind: TokenKind::Access,
                reason: "x".to_string(),
            },
        ];

        for err in errors {
            assert_eq!(AppError::from(err).status_code(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn test_refresh_denied_has_its_own_code() {
        let err = AppError::from(TokenError::RefreshDenied {
            source: Box::new(TokenError::Expired {
                kind: TokenKind::Refresh,
                expired_at: 0,
            }),
        });
        let body = err.error_body("test-123");

        assert_eq!(body.code, "REFRESH_DENIED");
        assert_eq!(body.status, 403);
        assert_eq!(body.error_id, "test-123");
    }

    #[test]
    fn test_expired_is_distinguishable_from_invalid() {
        let expired = AppError::from(TokenError::Expired {
            kind: TokenKind::Access,
            expired_at: 0,
        });
        let invalid = AppError::from(TokenError::BadSignature {
            kind: TokenKind::Access,
        });

        assert_eq!(expired.error_body("a").code, "TOKEN_EXPIRED");
        assert_eq!(invalid.error_body("b").code, "TOKEN_INVALID");
    }

    #[test]
    fn test_invalid_credentials_is_unauthorized() {
        let err = AppError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_error_becomes_missing_token() {
        let err = AppError::from(ExtractError::Missing("authorization header".to_string()));
        assert_eq!(err.error_body("c").code, "MISSING_TOKEN");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let err = AppError::from(PasswordError::HashFormat("$2b$ secret detail".to_string()));
        let body = err.error_body("d");
        assert_eq!(body.status, 500);
        assert!(!body.message.contains("secret detail"));
    }

    #[test]
    fn test_password_errors_are_internal() {
        let err = AppError::from(PasswordError::TooLong { max: 72 });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_body("e").code, "INTERNAL_ERROR");
    }
}
