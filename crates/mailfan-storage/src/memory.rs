//! In-memory storage implementation for testing.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StorageResult;
use crate::traits::{BatchInsert, ContactStore, NewContact, StoredContact};

/// In-memory implementation of ContactStore.
///
/// Contacts are keyed by email, which makes the uniqueness invariant
/// structural: a second record for the same email can never coexist
/// with the first. Uses DashMap for thread-safe concurrent access
/// without explicit locks.
#[derive(Debug, Default)]
pub struct MemoryContactStore {
    contacts: DashMap<String, StoredContact>,
}

impl MemoryContactStore {
    /// Creates a new in-memory contact store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory contact store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn find_existing(&self, emails: &HashSet<String>) -> StorageResult<HashSet<String>> {
        Ok(emails
            .iter()
            .filter(|email| self.contacts.contains_key(email.as_str()))
            .cloned()
            .collect())
    }

    async fn insert_batch(&self, records: Vec<NewContact>) -> StorageResult<BatchInsert> {
        use dashmap::mapref::entry::Entry;

        let mut inserted = Vec::new();
        let mut duplicates = 0usize;

        for record in records {
            // Atomic entry API so a concurrent insert of the same
            // email cannot slip between check and write.
            match self.contacts.entry(record.email.clone()) {
                Entry::Occupied(_) => duplicates += 1,
                Entry::Vacant(entry) => {
                    let contact = StoredContact {
                        user_id: record.user_id,
                        conversation_id: record.conversation_id,
                        name: record.name,
                        email: record.email,
                        company: record.company,
                        created_at: chrono::Utc::now(),
                    };
                    entry.insert(contact.clone());
                    inserted.push(contact);
                }
            }
        }

        Ok(BatchInsert {
            inserted,
            duplicates,
        })
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.contacts.len() as u64)
    }
}
