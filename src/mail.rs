use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, instrument, warn};

use crate::config::SmtpConfig;
use crate::shared::AppError;

/// Outbound mail delivery seam. The production implementation talks SMTP;
/// tests substitute a recording or failing one.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Builds the link embedded in verification emails. The token travels as a
/// query parameter so the link works without an Authorization header.
pub fn verification_link(backend_url: &str, token: &str) -> String {
    format!("{}/user/verify?token={}", backend_url, token)
}

/// SMTP implementation of [`Mailer`] backed by lettre's async transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("invalid SMTP from address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::Config(format!("invalid SMTP relay host: {}", e)))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, body))]
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Validation(format!("invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("could not build mail: {}", e)))?;

        self.transport.send(message).await.map_err(|e| {
            warn!(error = %e, "could not send mail");
            AppError::Internal(format!("could not send mail: {}", e))
        })?;

        debug!("mail handed off to SMTP relay");
        Ok(())
    }
}

/// Captured outbound message, for assertions in tests.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// In-memory implementation of [`Mailer`] that records every message
/// instead of delivering it. Used in development and testing.
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_mail(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// [`Mailer`] that always fails, for exercising delivery-failure paths.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
        Err(AppError::Internal("could not send mail".to_string()))
    }
}
