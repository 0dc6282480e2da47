//! Application state for HTTP handlers.

use std::sync::Arc;

use mailfan_server::handlers::{BroadcastHandler, DedupHandler};
use mailfan_server::{MailTransport, RecipientLog};
use mailfan_storage::ContactStore;

/// Application state shared across all HTTP handlers.
///
/// Both handlers hold the same `RecipientLog`, so emails inserted via
/// `/get-unique-emails` become broadcast recipients of `/send-email`.
///
/// # Type Parameters
///
/// * `S` - The storage backend implementing `ContactStore`
/// * `M` - The outbound mail transport implementing `MailTransport`
pub struct AppState<S: ContactStore, M: MailTransport> {
    /// The storage backend, exposed for readiness checks.
    pub storage: Arc<S>,
    /// Handler for contact batch deduplication and insert.
    pub dedup: Arc<DedupHandler<S>>,
    /// Handler for broadcasting to accumulated recipients.
    pub broadcast: Arc<BroadcastHandler<M>>,
}

impl<S: ContactStore, M: MailTransport> AppState<S, M> {
    /// Creates a new application state wired around a fresh recipient log.
    pub fn new(storage: Arc<S>, transport: Arc<M>) -> Self {
        let recipients = Arc::new(RecipientLog::new());
        let dedup = Arc::new(DedupHandler::new(
            Arc::clone(&storage),
            Arc::clone(&recipients),
        ));
        let broadcast = Arc::new(BroadcastHandler::new(transport, recipients));

        Self {
            storage,
            dedup,
            broadcast,
        }
    }
}
