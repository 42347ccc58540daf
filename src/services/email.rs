//! Outgoing email
//!
//! Contact replies go out through a [`MailTransport`]. Production uses
//! [`SmtpMailer`] (lettre over rustls); when email is not configured the
//! portal runs with [`DisabledMailer`], which refuses every send.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::{EmailConfig, SmtpEncryption};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Email is not configured")]
    Disabled,

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

pub type DynMailTransport = Arc<dyn MailTransport>;

/// Pick the transport `config` describes
pub fn create_mailer(config: &EmailConfig) -> Result<DynMailTransport, EmailError> {
    if !config.enabled || config.smtp_host.trim().is_empty() {
        tracing::info!("Email disabled; contact replies will fail with EMAIL_ERROR");
        return Ok(Arc::new(DisabledMailer));
    }
    Ok(Arc::new(SmtpMailer::new(config)?))
}

/// Compose the reply sent to a student who used the contact form
pub fn contact_reply(
    to: &str,
    student_id: &str,
    reply: &str,
    reply_to: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("Re: Your EITP query ({})", student_id),
        body: format!(
            "Hello {},\n\nThank you for contacting the EITP team. Our response to your query:\n\n{}\n\nYou can reply to this email to continue the conversation.\n\nEITP Team",
            student_id, reply
        ),
        reply_to: if reply_to.trim().is_empty() {
            None
        } else {
            Some(reply_to.to_string())
        },
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.parse().map_err(|e: lettre::address::AddressError| {
        EmailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let builder = match config.smtp_encryption {
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host),
            SmtpEncryption::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            }
            SmtpEncryption::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &config.smtp_host,
            )),
        }
        .map_err(|e| EmailError::Transport(e.to_string()))?;

        let mut builder = builder.port(config.smtp_port);
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        let from_address = if config.from_address.is_empty() {
            &config.smtp_username
        } else {
            &config.from_address
        };
        let from = parse_mailbox(&format!("{} <{}>", config.from_name, from_address))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }
        let message = builder
            .body(email.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        tracing::info!("Sent email to {}", email.to);
        Ok(())
    }
}

pub struct DisabledMailer;

#[async_trait]
impl MailTransport for DisabledMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::Disabled)
    }
}

/// Records sent mail instead of delivering it; fails on demand
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<OutgoingEmail>>,
    pub fail: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(EmailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
