//! HTTP route definitions and handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::error;

use mailfan_server::handlers::{
    BroadcastError, CandidateContact, DedupError, DedupOutcome, InsertedContact,
};
use mailfan_server::{MailError, MailTransport};
use mailfan_storage::ContactStore;

use super::state::AppState;
use crate::middleware::RequestTraceLayer;

/// Header carrying the submitting user's identifier.
pub const USER_ID_HEADER: &str = "user_id";
/// Header carrying the conversation identifier.
pub const CONVERSATION_ID_HEADER: &str = "conversation_id";

/// Default request body size limit (1MB).
/// This prevents memory exhaustion from oversized payloads.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Creates the HTTP router with all endpoints and middleware.
///
/// Applies the default body size limit (1MB) to protect against
/// oversized payloads.
pub fn create_router<S: ContactStore, M: MailTransport>(state: AppState<S, M>) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

/// Creates the HTTP router with a custom body size limit.
///
/// # Arguments
///
/// * `state` - Application state with storage backend and mail transport
/// * `body_limit` - Maximum request body size in bytes
pub fn create_router_with_body_limit<S: ContactStore, M: MailTransport>(
    state: AppState<S, M>,
    body_limit: usize,
) -> Router {
    let shared_state = Arc::new(state);
    Router::new()
        .route("/get-unique-emails", post(get_unique_emails::<S, M>))
        .route("/send-email", post(send_email::<S, M>))
        .route("/ready", get(readiness_check::<S, M>))
        .route("/health", get(health_check))
        .with_state(shared_state)
        // Layers apply bottom-to-top; the trace layer is outermost so
        // body-limit rejections are logged too.
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(RequestTraceLayer::new())
}

// ============================================================
// Error Handling
// ============================================================

/// Error codes used internally to map [`ApiError`] to HTTP status codes.
///
/// The wire format exposes only the message (as `{"error": "..."}`);
/// the code never leaves the process.
pub mod error_codes {
    // 400 Bad Request codes
    /// Required identifier headers are absent.
    pub const MISSING_HEADERS: &str = "missing_headers";
    /// Request body is malformed or fails validation.
    pub const INVALID_BODY: &str = "invalid_body";
    /// No emails have been accumulated for broadcast yet.
    pub const NO_RECIPIENTS: &str = "no_recipients";

    // 5xx codes
    /// Unexpected internal server error.
    pub const INTERNAL_ERROR: &str = "internal_error";
    /// Request body exceeds maximum allowed size.
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
}

/// API error response.
///
/// Serializes as `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub code: &'static str,
    #[serde(rename = "error")]
    pub message: String,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a missing identifier headers error (400).
    pub fn missing_headers() -> Self {
        Self::new(
            error_codes::MISSING_HEADERS,
            "Missing user_id or conversation_id in headers",
        )
    }

    /// Creates an invalid request body error (400).
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_BODY, message)
    }

    /// Creates a no accumulated recipients error (400).
    pub fn no_recipients() -> Self {
        Self::new(error_codes::NO_RECIPIENTS, "No unique emails to send to.")
    }

    /// Creates an internal error (500).
    pub fn internal_error() -> Self {
        Self::new(error_codes::INTERNAL_ERROR, "Internal server error")
    }

    /// Creates a payload too large error (413).
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(error_codes::PAYLOAD_TOO_LARGE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use error_codes::*;

        let status = match self.code {
            MISSING_HEADERS | INVALID_BODY | NO_RECIPIENTS => StatusCode::BAD_REQUEST,
            PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps a body extraction failure to an [`ApiError`].
///
/// Preserves 413 Payload Too Large for body limit errors; everything
/// else collapses to the batch validation message.
fn body_rejection_error(rejection: &JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(rejection.body_text())
    } else {
        ApiError::invalid_body("Request must include an array of contacts")
    }
}

// ============================================================
// Contact Batch Submission
// ============================================================

/// A contact entry in a submitted batch.
#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// Request body for `POST /get-unique-emails`.
#[derive(Debug, Deserialize)]
pub struct GetUniqueEmailsRequest {
    pub contacts: Vec<ContactPayload>,
}

/// Response for a batch where every email already existed.
#[derive(Debug, Serialize)]
pub struct AllDuplicatesResponse {
    pub message: String,
}

/// Response for a batch that inserted at least the attempted records.
#[derive(Debug, Serialize)]
pub struct InsertedResponse {
    pub message: String,
    pub inserted: Vec<InsertedContact>,
}

/// Handles `POST /get-unique-emails`.
///
/// Header validation runs before body validation, so a request with
/// both problems reports the missing headers.
async fn get_unique_emails<S: ContactStore, M: MailTransport>(
    State(state): State<Arc<AppState<S, M>>>,
    headers: HeaderMap,
    body: Result<Json<GetUniqueEmailsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let user_id = header_value(&headers, USER_ID_HEADER);
    let conversation_id = header_value(&headers, CONVERSATION_ID_HEADER);
    let (user_id, conversation_id) = match (user_id, conversation_id) {
        (Some(u), Some(c)) => (u, c),
        _ => return Err(ApiError::missing_headers()),
    };

    let Json(request) = body.map_err(|rejection| body_rejection_error(&rejection))?;

    let candidates = request
        .contacts
        .into_iter()
        .map(|c| CandidateContact {
            email: c.email,
            name: c.name,
            company: c.company,
        })
        .collect();

    match state.dedup.submit(&user_id, &conversation_id, candidates).await {
        Ok(DedupOutcome::AllDuplicates) => Ok((
            StatusCode::OK,
            Json(AllDuplicatesResponse {
                message: "These emails already exist.".to_string(),
            }),
        )
            .into_response()),
        Ok(DedupOutcome::Inserted(inserted)) => {
            let emails: Vec<&str> = inserted.iter().map(|c| c.email.as_str()).collect();
            Ok((
                StatusCode::CREATED,
                Json(InsertedResponse {
                    message: format!("Unique emails are: {}", emails.join(", ")),
                    inserted,
                }),
            )
                .into_response())
        }
        Err(DedupError::EmptyBatch) => Err(ApiError::invalid_body(
            "Request must include an array of contacts",
        )),
        Err(DedupError::Storage(e)) => {
            error!("contact batch insert failed: {}", e);
            Err(ApiError::internal_error())
        }
    }
}

/// Reads a non-empty header value as an owned string.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

// ============================================================
// Broadcast
// ============================================================

/// Request body for `POST /send-email`.
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub text: String,
}

/// Success response for a completed broadcast.
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub message: String,
}

/// Failure response when the transport rejects a send.
#[derive(Debug, Serialize)]
pub struct SendEmailFailure {
    pub success: bool,
    pub message: String,
    pub error: String,
}

/// Handles `POST /send-email`.
async fn send_email<S: ContactStore, M: MailTransport>(
    State(state): State<Arc<AppState<S, M>>>,
    body: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(rejection.body_text())
        } else {
            ApiError::invalid_body("Missing required fields: subject, text")
        }
    })?;

    if request.subject.is_empty() || request.text.is_empty() {
        return Err(ApiError::invalid_body(
            "Missing required fields: subject, text",
        ));
    }

    match state.broadcast.broadcast(&request.subject, &request.text).await {
        Ok(count) => Ok((
            StatusCode::OK,
            Json(SendEmailResponse {
                message: format!(
                    "Email has been sent successfully to the provided {count} emails."
                ),
            }),
        )
            .into_response()),
        Err(BroadcastError::NoRecipients) => Err(ApiError::no_recipients()),
        Err(BroadcastError::Transport(e)) => {
            error!("broadcast failed: {}", e);
            Ok(transport_failure_response(&e))
        }
    }
}

/// Builds the 500 response body for a failed broadcast.
fn transport_failure_response(error: &MailError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SendEmailFailure {
            success: false,
            message: "Error sending email".to_string(),
            error: error.to_string(),
        }),
    )
        .into_response()
}

// ============================================================
// Health
// ============================================================

/// Basic health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness check, validates storage connectivity with a row count.
///
/// Returns 200 if ready, 503 if the storage backend is unavailable.
/// Error details are logged but not exposed in the response.
async fn readiness_check<S: ContactStore, M: MailTransport>(
    State(state): State<Arc<AppState<S, M>>>,
) -> impl IntoResponse {
    match state.storage.count().await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "checks": {
                    "storage": "ok"
                }
            })),
        ),
        Err(e) => {
            error!("Readiness check failed: storage unavailable: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "checks": {
                        "storage": "unavailable"
                    }
                })),
            )
        }
    }
}
