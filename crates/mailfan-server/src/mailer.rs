//! Outbound mail transport.
//!
//! `MailTransport` is the seam between the broadcast handler and the
//! actual mail provider; `SmtpMailer` is the production implementation
//! on top of `lettre`'s async SMTP transport.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

/// Mail transport errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// A sender or recipient address failed to parse.
    #[error("invalid mail address {address}: {message}")]
    InvalidAddress { address: String, message: String },

    /// The message could not be assembled.
    #[error("failed building mail message: {message}")]
    BuildFailed { message: String },

    /// The provider rejected or failed the send.
    #[error("mail transport error: {message}")]
    Transport { message: String },
}

/// Result type for mail operations.
pub type MailResult<T> = Result<T, MailError>;

/// One outbound message, addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Abstract outbound mail interface.
///
/// Implementations must be thread-safe (Send + Sync); sends may run
/// concurrently.
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    /// Delivers one message to its recipient.
    async fn send(&self, email: &OutboundEmail) -> MailResult<()>;
}

/// SMTP implementation of MailTransport.
///
/// Every message is sent from the same fixed sender address, with the
/// text used for both the plain and the HTML body.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds an SMTP mailer against a STARTTLS relay.
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from: &str,
    ) -> MailResult<Self> {
        let from: Mailbox = from.parse().map_err(|e: lettre::address::AddressError| {
            MailError::InvalidAddress {
                address: from.to_string(),
                message: e.to_string(),
            }
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Transport {
                message: format!("invalid SMTP relay host {host}: {e}"),
            })?
            .credentials(Credentials::new(username, password))
            .port(port)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> MailResult<()> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
                address: email.to.clone(),
                message: e.to_string(),
            })?;

        // The HTML part is the raw text, no escaping applied.
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.text.clone(),
            ))
            .map_err(|e| MailError::BuildFailed {
                message: e.to_string(),
            })?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Transport {
                message: e.to_string(),
            })
    }
}
