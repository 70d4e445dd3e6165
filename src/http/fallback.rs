//! Not-found interception for single-page style mounts.
//!
//! [`NotFoundRedirect`] wraps a mount's service. It waits for the inner
//! response head; when the status is `404 Not Found` the inner body is dropped
//! unread and a redirect to the fallback document is returned instead. Any
//! other response passes through untouched, body included.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tower::{Layer, Service};

#[derive(Debug, Clone)]
pub struct NotFoundRedirectLayer {
    target: Arc<str>,
}

impl NotFoundRedirectLayer {
    /// Redirect 404s to `target`, an absolute URL path such as `/index.html`.
    pub fn new(target: impl Into<Arc<str>>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl<S> Layer<S> for NotFoundRedirectLayer {
    type Service = NotFoundRedirect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        NotFoundRedirect {
            inner,
            target: self.target.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotFoundRedirect<S> {
    inner: S,
    target: Arc<str>,
}

impl<S> Service<Request<Body>> for NotFoundRedirect<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let target = self.target.clone();
        let requested_target = req.uri().path() == &*target;

        Box::pin(async move {
            let response = inner.call(req).await?;
            if response.status() != StatusCode::NOT_FOUND || requested_target {
                return Ok(response);
            }

            tracing::debug!(fallback = %target, "Not found, redirecting to fallback document");
            drop(response);
            Ok(Redirect::to(&target).into_response())
        })
    }
}
