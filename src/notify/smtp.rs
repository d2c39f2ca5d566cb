use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{MailError, Mailer, OutgoingEmail};

/// Mailer relaying through an authenticated SMTP server with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, user: &str, password: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .with_context(|| format!("invalid SMTP relay {host}"))?
            .port(port)
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();
        info!(host = %host, port = port, "SMTP mailer initialized (STARTTLS)");
        Ok(Self { transport })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|err: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: err.to_string(),
    })
}

pub(crate) fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(mailbox(&email.from)?)
        .subject(email.subject.clone());
    for recipient in &email.to {
        builder = builder.to(mailbox(recipient)?);
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(email.text.clone()));
    for attachment in &email.attachments {
        let content_type =
            ContentType::parse(&attachment.content_type).unwrap_or(ContentType::TEXT_PLAIN);
        body = body.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.bytes.to_vec(), content_type),
        );
    }

    Ok(builder.multipart(body)?)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let message = build_message(email)?;
        let response = self.transport.send(message).await?;
        Ok(response.message().collect::<Vec<_>>().join(" "))
    }
}
