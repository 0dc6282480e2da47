//! Request tracing middleware.
//!
//! One layer covers both concerns: every request gets an ID (reused
//! from the caller's `x-request-id` header, generated otherwise) and
//! a start/completion log line carrying that ID. The ID is echoed on
//! the response so clients can correlate log lines with their calls.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use axum::http::{HeaderValue, Request, Response};
use tower::{Layer, Service};
use tracing::info;
use uuid::Uuid;

/// HTTP header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Layer that tags requests with an ID and logs their lifecycle.
#[derive(Clone, Default)]
pub struct RequestTraceLayer;

impl RequestTraceLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestTraceLayer {
    type Service = RequestTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTraceService { inner }
    }
}

/// Service behind [`RequestTraceLayer`].
#[derive(Clone)]
pub struct RequestTraceService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestTraceService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        // Reusing the caller's ID keeps cross-service traces connected.
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            request.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let method = request.method().clone();
        let uri = request.uri().clone();
        let start = Instant::now();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            info!(
                target: "mailfan::http",
                request_id = %request_id,
                method = %method,
                uri = %uri,
                "request started"
            );

            let mut response = inner.call(request).await?;

            info!(
                target: "mailfan::http",
                request_id = %request_id,
                method = %method,
                uri = %uri,
                status = %response.status().as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "request completed"
            );

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            Ok(response)
        })
    }
}
