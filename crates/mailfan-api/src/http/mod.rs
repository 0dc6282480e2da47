//! HTTP REST API endpoints.
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/get-unique-emails` | POST | Dedupe and insert a contact batch |
//! | `/send-email` | POST | Broadcast a message to accumulated emails |
//! | `/health` | GET | Liveness check |
//! | `/ready` | GET | Readiness check (storage connectivity) |

pub mod routes;
pub mod state;

pub use routes::{create_router, create_router_with_body_limit, ApiError, DEFAULT_BODY_LIMIT};
pub use state::AppState;

#[cfg(test)]
mod tests;
