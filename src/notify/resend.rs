use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{MailError, Mailer, OutgoingEmail};

const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Mailer backed by the Resend transactional email API.
pub struct ResendMailer {
    client: Client,
    api_key: String,
    api_url: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload<'a>>,
}

#[derive(Serialize)]
struct AttachmentPayload<'a> {
    filename: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .context("failed to build email HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: api_url.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.api_url.trim_end_matches('/'))
    }
}

fn request_body(email: &OutgoingEmail) -> SendEmailRequest<'_> {
    SendEmailRequest {
        from: &email.from,
        to: &email.to,
        subject: &email.subject,
        text: &email.text,
        attachments: email
            .attachments
            .iter()
            .map(|attachment| AttachmentPayload {
                filename: &attachment.filename,
                content: STANDARD.encode(&attachment.bytes),
            })
            .collect(),
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendEmailResponse = response.json().await?;
        Ok(parsed.id)
    }
}
