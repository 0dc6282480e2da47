//! mailfan-server: Request handlers and business logic
//!
//! This crate contains the business logic layer including:
//! - Dedup handler for batch contact submission
//! - Broadcast handler for fanning a message out to accumulated recipients
//! - Recipient log shared between the two handlers
//! - Mail transport abstraction with an SMTP implementation
//! - Configuration management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              mailfan-server                  │
//! ├─────────────────────────────────────────────┤
//! │  config.rs     - Configuration management   │
//! │  mailer.rs     - MailTransport + SMTP       │
//! │  recipients.rs - Recipient accumulator      │
//! │  handlers/     - Request handlers           │
//! │    dedup.rs       - Batch deduplication     │
//! │    broadcast.rs   - Broadcast fan-out       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod handlers;
pub mod mailer;
pub mod recipients;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use mailer::{MailError, MailResult, MailTransport, OutboundEmail, SmtpMailer};
pub use recipients::RecipientLog;
