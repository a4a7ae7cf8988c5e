//! CORS Preflight Middleware
//!
//! Sets the configured `Access-Control-*` headers on every response and
//! answers `OPTIONS` requests directly with 200.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        Method,
    },
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::configuration::CorsSettings;
use crate::error::ConfigError;

pub struct CorsMiddleware {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl CorsMiddleware {
    /// # Errors
    /// `ConfigError::InvalidValue` if a setting is not a legal header value
    pub fn new(settings: &CorsSettings) -> Result<Self, ConfigError> {
        let headers = vec![
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                header_value("cors.allow_origin", &settings.allow_origin)?,
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                header_value("cors.allow_headers", &settings.allow_headers)?,
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                header_value("cors.allow_methods", &settings.allow_methods)?,
            ),
            (
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from(settings.max_age_secs),
            ),
        ];
        Ok(Self {
            headers: Arc::new(headers),
        })
    }
}

impl Clone for CorsMiddleware {
    fn clone(&self) -> Self {
        Self {
            headers: self.headers.clone(),
        }
    }
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value)
        .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", field, e)))
}

fn apply(target: &mut HeaderMap, headers: &[(HeaderName, HeaderValue)]) {
    for (name, value) in headers {
        target.insert(name.clone(), value.clone());
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CorsMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(CorsMiddlewareService {
            service: Rc::new(service),
            headers: self.headers.clone(),
        }))
    }
}

pub struct CorsMiddlewareService<S> {
    service: Rc<S>,
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl<S, B> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let headers = self.headers.clone();

        if req.method() == Method::OPTIONS {
            let mut response = HttpResponse::Ok().finish();
            apply(response.headers_mut(), &headers);
            let response = req.into_response(response).map_into_right_body();
            return Box::pin(async move { Ok(response) });
        }

        // The request must stay uniquely owned: the router mutates it
        // further down the chain.
        let service = self.service.clone();

        Box::pin(async move {
            let mut res = service.call(req).await?;
            apply(res.headers_mut(), &headers);
            Ok(res.map_into_left_body())
        })
    }
}
