mod auth;
mod health_check;

pub use auth::{login, refresh, session, LoginRequest, SessionResponse, TokenResponse};
pub use health_check::health_check;
