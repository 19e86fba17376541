//! API-key middleware for the operational routes.
//!
//! Status transitions are driven by market staff, not customers, so the route that applies them
//! requires a shared key in the `oja-api-key` header. The middleware is fail-closed: when no key
//! is configured, every request is rejected with 401.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use log::warn;
use oja_common::Secret;

use crate::{errors::ServerError, helpers::constant_time_eq};

pub const API_KEY_HEADER: &str = "oja-api-key";

pub struct ApiKeyMiddlewareFactory {
    key: Option<Secret<String>>,
}

impl ApiKeyMiddlewareFactory {
    pub fn new(key: Option<Secret<String>>) -> Self {
        ApiKeyMiddlewareFactory { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = ApiKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddlewareService { key: self.key.clone(), service: Rc::new(service) }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    key: Option<Secret<String>>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let key = self.key.clone();
        Box::pin(async move {
            let Some(key) = key else {
                warn!("🔐️ No API key is configured. Denying access.");
                return Err(Error::from(ServerError::InvalidApiKey));
            };
            let presented = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
            match presented {
                Some(presented) if constant_time_eq(presented.as_bytes(), key.reveal().as_bytes()) => {
                    service.call(req).await
                },
                _ => {
                    warn!("🔐️ Invalid or missing API key. Denying access.");
                    Err(Error::from(ServerError::InvalidApiKey))
                },
            }
        })
    }
}
