use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{EmailConfig, EmailProvider};

pub mod resend;
pub mod smtp;

pub use resend::ResendMailer;
pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid email address {address}: {reason}")]
    Address { address: String, reason: String },
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Clone, Debug)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Clone, Debug)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Sends the message, returning the provider's message id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError>;
}

/// What the reviewer needs to hear about one stored submission.
#[derive(Clone, Debug)]
pub struct SubmissionNotice {
    pub submission_id: String,
    pub reference: String,
    pub consignee: Option<String>,
    pub file_urls: Vec<String>,
    pub summary_filename: String,
    pub summary_text: String,
}

pub fn compose_email(notice: &SubmissionNotice, from: &str, recipient: &str) -> OutgoingEmail {
    let links = if notice.file_urls.is_empty() {
        "Nenhum arquivo anexado".to_string()
    } else {
        notice
            .file_urls
            .iter()
            .map(|url| format!("- {url}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let text = format!(
        "Nova solicitação de dispute recebida.\n\n\
         ID: {id}\n\
         BL / Container: {reference}\n\
         Consignee: {consignee}\n\n\
         Arquivos anexados:\n{links}\n\n\
         O resumo completo segue em anexo ({summary}).\n",
        id = notice.submission_id,
        reference = notice.reference,
        consignee = notice.consignee.as_deref().unwrap_or("Não informado"),
        summary = notice.summary_filename,
    );

    OutgoingEmail {
        from: from.to_string(),
        to: vec![recipient.to_string()],
        subject: format!("Novo Dispute Recebido - BL {}", notice.reference),
        text,
        attachments: vec![EmailAttachment {
            filename: notice.summary_filename.clone(),
            content_type: crate::summary::SUMMARY_CONTENT_TYPE.to_string(),
            bytes: Bytes::from(notice.summary_text.clone().into_bytes()),
        }],
    }
}

/// Fire-and-forget delivery of submission notices.
#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Arc<dyn Mailer>>,
    from: String,
    recipient: Option<String>,
}

impl Notifier {
    pub fn new(
        mailer: Option<Arc<dyn Mailer>>,
        from: impl Into<String>,
        recipient: Option<String>,
    ) -> Self {
        Self {
            mailer,
            from: from.into(),
            recipient,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, crate::config::DEFAULT_EMAIL_FROM, None)
    }

    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Self> {
        let mailer: Option<Arc<dyn Mailer>> = match &config.provider {
            Some(EmailProvider::Resend { api_key, api_url }) => {
                Some(Arc::new(ResendMailer::new(api_key.clone(), api_url.clone())?))
            }
            Some(EmailProvider::Smtp {
                host,
                port,
                user,
                password,
            }) => Some(Arc::new(SmtpMailer::new(host, *port, user, password)?)),
            None => None,
        };
        Ok(Self::new(mailer, config.from.clone(), config.recipient.clone()))
    }

    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some() && self.recipient.is_some()
    }

    /// Spawns the delivery and returns immediately. The outcome is only logged.
    pub fn dispatch(&self, notice: SubmissionNotice) {
        let notifier = self.clone();
        tokio::spawn(async move {
            notifier.deliver(notice).await;
        });
    }

    async fn deliver(&self, notice: SubmissionNotice) {
        let (Some(mailer), Some(recipient)) = (self.mailer.as_ref(), self.recipient.as_deref())
        else {
            warn!(
                submission_id = %notice.submission_id,
                "email notification skipped: provider or recipient not configured"
            );
            return;
        };

        let email = compose_email(&notice, &self.from, recipient);
        match mailer.send(&email).await {
            Ok(message_id) => info!(
                submission_id = %notice.submission_id,
                reference = %notice.reference,
                message_id = %message_id,
                "email notification sent"
            ),
            Err(err) => error!(
                submission_id = %notice.submission_id,
                reference = %notice.reference,
                error = %err,
                "email notification failed"
            ),
        }
    }
}
