//! Recipient accumulator shared between the two handlers.

use std::sync::{PoisonError, RwLock};

/// Append-only log of every email newly inserted since process start.
///
/// The dedup handler appends, the broadcast handler reads in full;
/// nothing else touches it. Entries survive until process exit. The
/// log does no deduplication of its own: the store's uniqueness
/// constraint is what keeps entries unique in practice.
#[derive(Debug, Default)]
pub struct RecipientLog {
    emails: RwLock<Vec<String>>,
}

impl RecipientLog {
    /// Creates an empty recipient log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the given emails in order.
    pub fn append<I>(&self, emails: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.emails
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(emails);
    }

    /// Returns a copy of every accumulated email, in append order.
    pub fn snapshot(&self) -> Vec<String> {
        self.emails
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of accumulated emails.
    pub fn len(&self) -> usize {
        self.emails
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
