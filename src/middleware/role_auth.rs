use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::models::account::UserRole;

/// Must sit inside [`AuthMiddleware`](crate::middleware::auth::AuthMiddleware), which puts the
/// claims into the request extensions.
pub struct RequireRole {
    required_role: UserRole,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        RequireRole {
            required_role: role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            required_role: self.required_role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    required_role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req
            .extensions()
            .get::<Claims>()
            .map(|claims| UserRole::from_claim(claims.app_role()));

        let denied = match role {
            None => AppError::Unauthorized("No authorization".to_string()),
            Some(role) if role == self.required_role || role == UserRole::Admin => {
                let fut = self.service.call(req);
                return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
            }
            Some(role) => {
                log::warn!(
                    "Access denied: {:?} required, caller is {:?} ({})",
                    self.required_role,
                    role,
                    req.path()
                );
                AppError::Forbidden("Insufficient permissions".to_string())
            }
        };

        let res = req.error_response(denied).map_into_right_body();
        Box::pin(ready(Ok(res)))
    }
}
