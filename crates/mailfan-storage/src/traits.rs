//! ContactStore trait definition.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::StorageResult;

/// A contact record as persisted by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContact {
    /// Identifier of the user the batch originated from.
    pub user_id: String,
    /// Identifier of the conversation the batch originated from.
    pub conversation_id: String,
    pub name: Option<String>,
    /// Globally unique, case-significant. No normalization is applied.
    pub email: String,
    pub company: Option<String>,
    /// Assigned by the store at insertion time.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A contact record to be inserted. `created_at` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub user_id: String,
    pub conversation_id: String,
    pub name: Option<String>,
    pub email: String,
    pub company: Option<String>,
}

/// Outcome of a batch insert with continue-on-error semantics.
///
/// A uniqueness collision on one record is not an error: the violating
/// record is dropped silently and counted in `duplicates` while the
/// rest of the batch goes through. `inserted` preserves the caller's
/// submission order.
#[derive(Debug, Clone, Default)]
pub struct BatchInsert {
    pub inserted: Vec<StoredContact>,
    pub duplicates: usize,
}

/// Abstract storage interface for contact records.
///
/// The store owns the uniqueness invariant on `email`; callers only
/// get an advisory view of it through `find_existing`. Implementations
/// must be thread-safe (Send + Sync) and support async operations.
#[async_trait]
pub trait ContactStore: Send + Sync + 'static {
    /// Returns the subset of the given emails already present in
    /// storage. An empty input yields an empty result.
    async fn find_existing(&self, emails: &HashSet<String>) -> StorageResult<HashSet<String>>;

    /// Attempts to insert every record, dropping per-record duplicates.
    ///
    /// Any failure other than a uniqueness collision fails the whole
    /// call and reports nothing inserted. The store's own transactional
    /// guarantees govern what was actually persisted, so callers must
    /// not assume the call is atomic across records.
    async fn insert_batch(&self, records: Vec<NewContact>) -> StorageResult<BatchInsert>;

    /// Total number of stored contacts. Used by readiness probes.
    async fn count(&self) -> StorageResult<u64>;
}
