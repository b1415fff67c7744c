//! Authentication layer
//!
//! Checks the `authorization` header on every request except page and
//! health fetches. Rejection happens before the handler runs, so a failed
//! request never reaches the player or the mixer.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use remplay_common::api::{validate_secret, SharedSecret};
use tower::{Layer, Service};
use tracing::warn;

use super::error::ApiError;

/// Tower layer enforcing the shared secret
#[derive(Clone)]
pub struct AuthLayer {
    pub secret: SharedSecret,
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            secret: self.secret.clone(),
        }
    }
}

/// Tower service performing the check
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    secret: SharedSecret,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let secret = self.secret.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Read-only fetches are public; the page prompts for the secret
            if matches!(*request.method(), Method::GET | Method::HEAD) {
                return inner.call(request).await;
            }

            let provided = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok());

            if let Err(e) = validate_secret(provided, &secret) {
                warn!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    reason = %e,
                    "Rejected unauthenticated request"
                );
                return Ok(ApiError::Unauthorized.into_response());
            }

            inner.call(request).await
        })
    }
}
