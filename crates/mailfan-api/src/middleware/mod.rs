//! API middleware.
//!
//! Request tracing: per-request IDs plus start/completion logging.

mod trace;

pub use trace::{RequestTraceLayer, REQUEST_ID_HEADER};
