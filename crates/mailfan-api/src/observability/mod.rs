//! Observability setup.
//!
//! Currently covers structured logging; request-level details are
//! logged by the middleware layer.

pub mod logging;

pub use logging::{init_logging, LoggingConfig};
