//! mailfan-api: HTTP API layer
//!
//! This crate provides the HTTP surface of the service:
//! - REST endpoints via Axum
//! - Middleware (request IDs, request logging)
//! - Logging initialization
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                mailfan-api                   │
//! ├─────────────────────────────────────────────┤
//! │  http/          - REST endpoints            │
//! │  middleware/    - Request IDs, logging      │
//! │  observability/ - tracing setup             │
//! └─────────────────────────────────────────────┘
//! ```

pub mod http;
pub mod middleware;
pub mod observability;
