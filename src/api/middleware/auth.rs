use crate::config::AppConfig;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
};
use tracing::warn;

/// The authenticated owner identity, resolved from the API key by the
/// middleware below. Handlers extract it; the core never sees a key.
#[derive(Debug, Clone)]
pub struct OwnerId(pub String);

impl FromRequest for OwnerId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<OwnerId>()
                .cloned()
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("Missing owner identity")),
        )
    }
}

pub struct ApiKeyAuth;

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct ApiKeyAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        // Skip auth for /health, the root landing page, and OPTIONS requests
        if req.method() == actix_web::http::Method::OPTIONS
            || req.path() == "/health"
            || req.path() == "/"
        {
            return Box::pin(async move { srv.call(req).await });
        }

        let config = match req.app_data::<actix_web::web::Data<AppConfig>>() {
            Some(c) => c,
            None => {
                warn!("AppConfig missing in app_data");
                return Box::pin(async move {
                    Err(actix_web::error::ErrorInternalServerError("Configuration error"))
                });
            }
        };

        // Resolve the Bearer key to the owner identity it belongs to
        let owner = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
            .and_then(|token| {
                config
                    .auth
                    .api_keys
                    .iter()
                    .find(|entry| entry.key == token)
                    .map(|entry| entry.owner.clone())
            });

        let owner = match owner {
            Some(owner) => owner,
            None => {
                return Box::pin(async move {
                    Err(actix_web::error::ErrorUnauthorized("Invalid or missing API key"))
                });
            }
        };

        req.extensions_mut().insert(OwnerId(owner));

        Box::pin(async move {
            let res = srv.call(req).await?;
            Ok(res)
        })
    }
}
