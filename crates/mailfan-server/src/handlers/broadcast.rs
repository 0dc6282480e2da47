//! Broadcast fan-out handler.
//!
//! Sends one message per accumulated recipient through the mail
//! transport, all dispatched concurrently and awaited together.

use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::info;

use crate::mailer::{MailError, MailTransport, OutboundEmail};
use crate::recipients::RecipientLog;

/// Errors that can occur during a broadcast.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// No emails have been accumulated yet.
    #[error("no unique emails to send to")]
    NoRecipients,

    /// The transport failed at least one send. Which one is not
    /// tracked; the whole broadcast fails.
    #[error(transparent)]
    Transport(#[from] MailError),
}

/// Handler for broadcasting a message to every accumulated recipient.
pub struct BroadcastHandler<M: MailTransport> {
    transport: Arc<M>,
    recipients: Arc<RecipientLog>,
}

impl<M: MailTransport> BroadcastHandler<M> {
    /// Creates a new broadcast handler.
    pub fn new(transport: Arc<M>, recipients: Arc<RecipientLog>) -> Self {
        Self {
            transport,
            recipients,
        }
    }

    /// Sends the given subject and text to every accumulated email.
    ///
    /// Recipient addresses are lowercased at send time; the stored
    /// form is left untouched. Returns the number of recipients on
    /// full success. There is no timeout, no concurrency cap and no
    /// partial-success accounting.
    pub async fn broadcast(&self, subject: &str, text: &str) -> Result<usize, BroadcastError> {
        let recipients = self.recipients.snapshot();
        if recipients.is_empty() {
            return Err(BroadcastError::NoRecipients);
        }

        let sends = recipients.iter().map(|recipient| {
            let message = OutboundEmail {
                to: recipient.to_lowercase(),
                subject: subject.to_string(),
                text: text.to_string(),
            };
            let transport = Arc::clone(&self.transport);
            async move { transport.send(&message).await }
        });

        try_join_all(sends).await?;

        info!(recipients = recipients.len(), "broadcast dispatched");
        Ok(recipients.len())
    }
}
