//! Middleware module
//!
//! Access token enforcement and CORS headers.

mod cors;
mod secure;

pub use cors::CorsMiddleware;
pub use secure::SecureMiddleware;
