use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{Authenticator, BearerExtractor};
use crate::configuration::{ApplicationSettings, CorsSettings, Settings};
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::middleware::{CorsMiddleware, SecureMiddleware};
use crate::routes::{health_check, login, refresh, session};
use crate::users::UserDirectory;

/// Everything the HTTP layer shares across workers. All of it is immutable.
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub users: Arc<UserDirectory>,
}

impl AppState {
    /// Build the state from validated settings. Fails if the keypair cannot
    /// be loaded; the server must not start in that case.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let authenticator = settings.authentication.authenticator()?;
        let users = UserDirectory::new(
            &settings.authentication.users,
            settings.authentication.hasher()?,
        )?;

        Ok(Self {
            authenticator: Arc::new(authenticator),
            users: Arc::new(users),
        })
    }
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    application: &ApplicationSettings,
    cors: &CorsSettings,
) -> Result<Server, AppError> {
    let authenticator = web::Data::from(state.authenticator.clone());
    let users = web::Data::from(state.users.clone());
    let secure = SecureMiddleware::new(state.authenticator, BearerExtractor);
    let cors = CorsMiddleware::new(cors)?;

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware; CORS is outermost so rejections carry its headers
            .wrap(LoggerMiddleware)
            .wrap(cors.clone())

            // Shared state
            .app_data(authenticator.clone())
            .app_data(users.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))

            // Protected routes (require a valid access token)
            .service(
                web::scope("/api")
                    .wrap(secure.clone())
                    .route("/session", web::get().to(session)),
            )
    })
    .client_request_timeout(application.request_timeout())
    .client_disconnect_timeout(application.disconnect_timeout())
    .shutdown_timeout(application.shutdown_timeout_secs)
    .listen(listener)
    .map_err(|e| AppError::Internal(format!("Failed to listen: {}", e)))?
    .run();

    Ok(server)
}
