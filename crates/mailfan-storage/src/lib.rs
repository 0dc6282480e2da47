//! mailfan-storage: Contact storage abstraction layer
//!
//! This crate provides durable keyed storage of contact records with a
//! uniqueness invariant on email, including:
//! - ContactStore trait for storage operations
//! - In-memory implementation for testing
//! - PostgreSQL implementation for production
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              mailfan-storage                 │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - ContactStore trait definition│
//! │  memory.rs   - In-memory implementation     │
//! │  postgres.rs - PostgreSQL implementation    │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryContactStore;
pub use postgres::{PostgresConfig, PostgresContactStore};
pub use traits::{BatchInsert, ContactStore, NewContact, StoredContact};
