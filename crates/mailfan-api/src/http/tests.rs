//! HTTP API tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt; // for oneshot

use mailfan_server::{MailError, MailResult, MailTransport, OutboundEmail};
use mailfan_storage::{
    BatchInsert, ContactStore, MemoryContactStore, NewContact, StorageError, StorageResult,
};

use super::routes::{create_router, create_router_with_body_limit};
use super::state::AppState;

/// Transport double that records sends; can be told to fail.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: bool,
}

impl RecordingTransport {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &OutboundEmail) -> MailResult<()> {
        if self.fail {
            return Err(MailError::Transport {
                message: "relay rejected the message".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Store double whose every operation fails.
struct BrokenStore;

#[async_trait]
impl ContactStore for BrokenStore {
    async fn find_existing(&self, _emails: &HashSet<String>) -> StorageResult<HashSet<String>> {
        Err(StorageError::QueryError {
            message: "connection reset".to_string(),
        })
    }

    async fn insert_batch(&self, _records: Vec<NewContact>) -> StorageResult<BatchInsert> {
        Err(StorageError::QueryError {
            message: "connection reset".to_string(),
        })
    }

    async fn count(&self) -> StorageResult<u64> {
        Err(StorageError::ConnectionError {
            message: "connection reset".to_string(),
        })
    }
}

/// Helper to create a test app with in-memory storage.
fn test_app() -> (axum::Router, Arc<RecordingTransport>) {
    test_app_with_transport(RecordingTransport::default())
}

fn test_app_with_transport(
    transport: RecordingTransport,
) -> (axum::Router, Arc<RecordingTransport>) {
    let storage = Arc::new(MemoryContactStore::new());
    let transport = Arc::new(transport);
    let state = AppState::new(storage, Arc::clone(&transport));
    (create_router(state), transport)
}

fn post_contacts(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/get-unique-emails")
        .header("content-type", "application/json")
        .header("user_id", "u-1")
        .header("conversation_id", "c-1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_send_email(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/send-email")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check_returns_ok() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_readiness_check_reports_storage_ok() {
    let (app, _) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ready");
    assert_eq!(json["checks"]["storage"], "ok");
}

#[tokio::test]
async fn test_get_unique_emails_requires_identifier_headers() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/get-unique-emails")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"contacts": [{"email": "a@example.com"}]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing user_id or conversation_id in headers");
}

#[tokio::test]
async fn test_missing_headers_reported_before_malformed_body() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/get-unique-emails")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing user_id or conversation_id in headers");
}

#[tokio::test]
async fn test_empty_contacts_array_is_rejected() {
    let (app, _) = test_app();

    let response = app
        .oneshot(post_contacts(r#"{"contacts": []}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Request must include an array of contacts");
}

#[tokio::test]
async fn test_malformed_body_with_headers_is_rejected() {
    let (app, _) = test_app();

    let response = app
        .oneshot(post_contacts(r#"{"contacts": "not-an-array"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Request must include an array of contacts");
}

#[tokio::test]
async fn test_fresh_batch_is_inserted() {
    let (app, _) = test_app();

    let response = app
        .oneshot(post_contacts(
            r#"{"contacts": [
                {"email": "a@example.com", "name": "Ada", "company": "Acme"},
                {"email": "b@example.com"}
            ]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(
        json["message"],
        "Unique emails are: a@example.com, b@example.com"
    );
    assert_eq!(json["inserted"].as_array().unwrap().len(), 2);
    assert_eq!(json["inserted"][0]["email"], "a@example.com");
    assert_eq!(json["inserted"][0]["name"], "Ada");
    assert_eq!(json["inserted"][0]["company"], "Acme");
    assert_eq!(json["inserted"][1]["name"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_resubmitted_batch_reports_duplicates() {
    let (app, _) = test_app();

    let body = r#"{"contacts": [{"email": "a@example.com"}]}"#;
    let first = app.clone().oneshot(post_contacts(body)).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post_contacts(body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let json = body_json(second).await;
    assert_eq!(json["message"], "These emails already exist.");
    assert!(json.get("inserted").is_none());
}

#[tokio::test]
async fn test_partial_overlap_inserts_only_new_contacts() {
    let (app, _) = test_app();

    let first = app
        .clone()
        .oneshot(post_contacts(r#"{"contacts": [{"email": "a@example.com"}]}"#))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(post_contacts(
            r#"{"contacts": [{"email": "a@example.com"}, {"email": "b@example.com"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::CREATED);
    let json = body_json(second).await;
    assert_eq!(json["message"], "Unique emails are: b@example.com");
    assert_eq!(json["inserted"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_send_email_requires_subject_and_text() {
    let (app, _) = test_app();

    let response = app
        .oneshot(post_send_email(r#"{"subject": "Hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing required fields: subject, text");
}

#[tokio::test]
async fn test_send_email_without_accumulated_recipients() {
    let (app, _) = test_app();

    let response = app
        .oneshot(post_send_email(r#"{"subject": "Hi", "text": "Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No unique emails to send to.");
}

#[tokio::test]
async fn test_send_email_broadcasts_to_accumulated_recipients() {
    let (app, transport) = test_app();

    let insert = app
        .clone()
        .oneshot(post_contacts(
            r#"{"contacts": [{"email": "Ada@Example.com"}, {"email": "b@example.com"}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(insert.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_send_email(r#"{"subject": "Hi", "text": "Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["message"],
        "Email has been sent successfully to the provided 2 emails."
    );

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    // Recipients are lowercased at send time
    assert_eq!(sent[0].to, "ada@example.com");
    assert_eq!(sent[1].to, "b@example.com");
    assert_eq!(sent[0].subject, "Hi");
    assert_eq!(sent[0].text, "Hello");
}

#[tokio::test]
async fn test_send_email_transport_failure_returns_500() {
    let (app, _) = test_app_with_transport(RecordingTransport::failing());

    let insert = app
        .clone()
        .oneshot(post_contacts(r#"{"contacts": [{"email": "a@example.com"}]}"#))
        .await
        .unwrap();
    assert_eq!(insert.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_send_email(r#"{"subject": "Hi", "text": "Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Error sending email");
    assert!(json["error"].as_str().unwrap().contains("relay rejected"));
}

#[tokio::test]
async fn test_storage_failure_maps_to_internal_error() {
    let storage = Arc::new(BrokenStore);
    let transport = Arc::new(RecordingTransport::default());
    let app = create_router(AppState::new(storage, transport));

    let response = app
        .oneshot(post_contacts(r#"{"contacts": [{"email": "a@example.com"}]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Internal server error");
}

#[tokio::test]
async fn test_readiness_check_reports_storage_unavailable() {
    let storage = Arc::new(BrokenStore);
    let transport = Arc::new(RecordingTransport::default());
    let app = create_router(AppState::new(storage, transport));

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["status"], "not_ready");
    assert_eq!(json["checks"]["storage"], "unavailable");
}

#[tokio::test]
async fn test_oversized_body_returns_413() {
    let storage = Arc::new(MemoryContactStore::new());
    let transport = Arc::new(RecordingTransport::default());
    let state = AppState::new(storage, transport);
    let app = create_router_with_body_limit(state, 64);

    let big = format!(
        r#"{{"contacts": [{{"email": "{}@example.com"}}]}}"#,
        "a".repeat(256)
    );
    let response = app.oneshot(post_contacts(&big)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
