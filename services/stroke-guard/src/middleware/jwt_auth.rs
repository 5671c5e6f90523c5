use crate::auth::AuthService;
use crate::errors::StrokeGuardError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// Bearer-token guard.
///
/// Validated [`Claims`](crate::auth::Claims) are stored in the request
/// extensions, so handlers can take `web::ReqData<Claims>`.
#[derive(Default)]
pub struct JwtAuth;

impl JwtAuth {
    pub fn new() -> Self {
        JwtAuth
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

fn unauthorized(reason: &str) -> Error {
    StrokeGuardError::Unauthorized(reason.to_string()).into()
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match req.headers().get("Authorization") {
            Some(value) => match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
                Some(token) => token.trim().to_string(),
                None => {
                    return Box::pin(async { Err(unauthorized("invalid auth header format")) });
                }
            },
            None => {
                return Box::pin(async { Err(unauthorized("missing Authorization header")) });
            }
        };

        let auth = match req.app_data::<web::Data<Arc<AuthService>>>() {
            Some(auth) => auth.clone(),
            None => {
                tracing::error!("AuthService missing from app data");
                return Box::pin(async {
                    Err(StrokeGuardError::Internal("authentication unavailable".to_string()).into())
                });
            }
        };

        match auth.verify_token(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);

                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(err) => {
                tracing::warn!("JWT validation failed: {}", err);
                Box::pin(async { Err(unauthorized("invalid or expired token")) })
            }
        }
    }
}
