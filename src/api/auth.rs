// Scheduler signature verification for the trigger endpoint.

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::api::models::RefreshResponse;

pub const SIGNATURE_HEADER: &str = "x-scheduler-signature";

/// Middleware verifying the scheduler's signature header. When no secret is
/// configured (non-production), verification is bypassed.
pub struct SchedulerSignature {
    secret: Option<String>,
}

impl SchedulerSignature {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.trim().is_empty()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SchedulerSignature
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = SchedulerSignatureMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SchedulerSignatureMiddleware {
            service,
            secret: self.secret.clone(),
        }))
    }
}

pub struct SchedulerSignatureMiddleware<S> {
    service: S,
    secret: Option<String>,
}

impl<S, B> Service<ServiceRequest> for SchedulerSignatureMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authorized = match self.secret.as_deref() {
            None => true,
            Some(secret) => req
                .headers()
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|sig| sig == secret)
                .unwrap_or(false),
        };

        if !authorized {
            let (request, _) = req.into_parts();
            let response = HttpResponse::Unauthorized()
                .json(RefreshResponse::failure("invalid scheduler signature"))
                .map_into_right_body();
            return Box::pin(async move { Ok(ServiceResponse::new(request, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
