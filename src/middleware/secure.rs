//! Access Token Middleware
//!
//! Extracts a token with the configured [`TokenExtractor`], verifies it
//! strictly and injects the claims into request extensions for use by route
//! handlers. Anything else is answered with 403.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::{Authenticator, TokenExtractor};
use crate::error::AppError;

/// Guards every route it wraps.
pub struct SecureMiddleware<E> {
    authenticator: Arc<Authenticator>,
    extractor: Arc<E>,
}

impl<E> SecureMiddleware<E> {
    pub fn new(authenticator: Arc<Authenticator>, extractor: E) -> Self {
        Self {
            authenticator,
            extractor: Arc::new(extractor),
        }
    }
}

impl<E> Clone for SecureMiddleware<E> {
    fn clone(&self) -> Self {
        Self {
            authenticator: self.authenticator.clone(),
            extractor: self.extractor.clone(),
        }
    }
}

impl<S, B, E> Transform<S, ServiceRequest> for SecureMiddleware<E>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    E: TokenExtractor<HttpRequest> + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SecureMiddlewareService<S, E>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SecureMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
            extractor: self.extractor.clone(),
        }))
    }
}

pub struct SecureMiddlewareService<S, E> {
    service: Rc<S>,
    authenticator: Arc<Authenticator>,
    extractor: Arc<E>,
}

impl<S, B, E> Service<ServiceRequest> for SecureMiddlewareService<S, E>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    E: TokenExtractor<HttpRequest> + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verified = self
            .extractor
            .extract(req.request())
            .map_err(AppError::from)
            .and_then(|token| {
                self.authenticator
                    .verify_access_token(&token)
                    .map_err(AppError::from)
            });

        match verified {
            Ok(claims) => {
                tracing::debug!(expires_at = claims.exp, "Access token verified");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move {
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                })
            }
            // Rendered here rather than returned as `Err` so outer middleware
            // sees an ordinary response.
            Err(e) => {
                let res = req.error_response(e).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}
