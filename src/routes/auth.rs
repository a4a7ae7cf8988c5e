//! Authentication Routes
//!
//! Login with credentials, refresh an access token, and inspect the
//! current session.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AccessTokenClaims, Authenticator, BearerExtractor, TokenExtractor};
use crate::error::{AppError, AuthError};
use crate::users::UserDirectory;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Issued access token. The refresh token travels inside it.
#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl TokenResponse {
    fn bearer(access_token: String, authenticator: &Authenticator) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: authenticator.lifespans().access(),
        }
    }
}

/// Current session information
#[derive(Serialize, Deserialize)]
pub struct SessionResponse {
    pub issued_at: i64,
    pub expires_at: i64,
}

/// POST /auth/login
///
/// Verify username and password, then issue a fresh token pair.
///
/// # Errors
/// - 401: Invalid credentials (unknown user, wrong or over-long password)
/// - 500: Malformed stored hash or signing failure
pub async fn login(
    form: web::Json<LoginRequest>,
    users: web::Data<UserDirectory>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { username, password } = form.into_inner();

    let directory = users.clone();
    let candidate = username.clone();
    let valid = web::block(move || directory.authenticate(&candidate, &password)).await??;
    if !valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = authenticator.issue_token_pair(&username)?;

    tracing::info!(username = %username, "User logged in successfully");

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(pair.access_token, &authenticator)))
}

/// POST /auth/refresh
///
/// Exchange the access token in the `Authorization` header for a new one.
/// The presented token may already be expired.
///
/// # Errors
/// - 403 `REFRESH_DENIED`: the embedded refresh token expired; log in again
/// - 403 `TOKEN_INVALID` / `MISSING_TOKEN`: nothing usable was presented
pub async fn refresh(
    req: HttpRequest,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let raw = BearerExtractor.extract(&req)?;
    let access_token = authenticator.refresh_access_token(&raw)?;

    tracing::info!("Token refreshed successfully");

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(access_token, &authenticator)))
}

/// GET /api/session
///
/// **Requires a valid access token**; claims are injected by
/// `SecureMiddleware`.
pub async fn session(claims: web::ReqData<AccessTokenClaims>) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse {
        issued_at: claims.iat,
        expires_at: claims.exp,
    })
}
