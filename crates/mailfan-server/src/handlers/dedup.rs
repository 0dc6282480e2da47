//! Batch deduplication handler.
//!
//! Filters a submitted batch of candidate contacts against the store,
//! persists the remainder, and records the newly inserted emails in
//! the shared recipient log for a later broadcast.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use mailfan_storage::{ContactStore, NewContact, StorageError};

use crate::recipients::RecipientLog;

/// A candidate contact as submitted by the client.
#[derive(Debug, Clone)]
pub struct CandidateContact {
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
}

/// Projection of a newly inserted contact for the response payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InsertedContact {
    pub name: Option<String>,
    pub email: String,
    pub company: Option<String>,
}

/// Outcome of a batch submission.
#[derive(Debug)]
pub enum DedupOutcome {
    /// Every candidate email was already stored; nothing was inserted
    /// and the recipient log was not touched.
    AllDuplicates,
    /// The records actually inserted, in submission order. May be
    /// empty when a uniqueness race left nothing to insert.
    Inserted(Vec<InsertedContact>),
}

/// Errors that can occur during batch submission.
#[derive(Debug, Error)]
pub enum DedupError {
    /// The contacts batch is empty.
    #[error("contacts batch cannot be empty")]
    EmptyBatch,

    /// Storage failure during lookup or insert.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Handler for batch contact submission.
///
/// Candidates are deduplicated against the store only, never against
/// each other: a batch containing the same email twice hands both
/// records to the store, whose uniqueness constraint decides which
/// one wins.
pub struct DedupHandler<S: ContactStore> {
    storage: Arc<S>,
    recipients: Arc<RecipientLog>,
}

impl<S: ContactStore> DedupHandler<S> {
    /// Creates a new dedup handler.
    pub fn new(storage: Arc<S>, recipients: Arc<RecipientLog>) -> Self {
        Self {
            storage,
            recipients,
        }
    }

    /// Submits a batch of candidates under the given identifier pair.
    pub async fn submit(
        &self,
        user_id: &str,
        conversation_id: &str,
        contacts: Vec<CandidateContact>,
    ) -> Result<DedupOutcome, DedupError> {
        if contacts.is_empty() {
            return Err(DedupError::EmptyBatch);
        }

        let candidate_emails: HashSet<String> =
            contacts.iter().map(|c| c.email.clone()).collect();
        let existing = self.storage.find_existing(&candidate_emails).await?;

        let fresh: Vec<NewContact> = contacts
            .into_iter()
            .filter(|c| !existing.contains(&c.email))
            .map(|c| NewContact {
                user_id: user_id.to_string(),
                conversation_id: conversation_id.to_string(),
                name: c.name,
                email: c.email,
                company: c.company,
            })
            .collect();

        if fresh.is_empty() {
            return Ok(DedupOutcome::AllDuplicates);
        }

        let batch = match self.storage.insert_batch(fresh).await {
            Ok(batch) => batch,
            // A call-level uniqueness violation means a concurrent
            // submission won the race between lookup and insert.
            // Benign: report nothing newly inserted.
            Err(StorageError::DuplicateEmail { email }) => {
                warn!(%email, "batch insert lost a uniqueness race");
                return Ok(DedupOutcome::Inserted(Vec::new()));
            }
            Err(err) => return Err(err.into()),
        };

        if batch.duplicates > 0 {
            debug!(
                dropped = batch.duplicates,
                "dropped duplicate records during batch insert"
            );
        }

        self.recipients
            .append(batch.inserted.iter().map(|c| c.email.clone()));

        let inserted = batch
            .inserted
            .into_iter()
            .map(|c| InsertedContact {
                name: c.name,
                email: c.email,
                company: c.company,
            })
            .collect();

        Ok(DedupOutcome::Inserted(inserted))
    }
}
