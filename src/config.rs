use std::env;

use anyhow::{bail, Context, Result};

pub const DEFAULT_BUCKET: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";
pub const DEFAULT_EMAIL_FROM: &str = "onboarding@resend.dev";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    pub cors_allowed_origin: Option<String>,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub public_base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub provider: Option<EmailProvider>,
    pub from: String,
    pub recipient: Option<String>,
}

#[derive(Clone, Debug)]
pub enum EmailProvider {
    Resend {
        api_key: String,
        api_url: String,
    },
    Smtp {
        host: String,
        port: u16,
        user: String,
        password: String,
    },
}

impl EmailProvider {
    pub fn name(&self) -> &'static str {
        match self {
            EmailProvider::Resend { .. } => "resend",
            EmailProvider::Smtp { .. } => "smtp",
        }
    }
}

impl StorageConfig {
    /// Falls back to path-style URLs on the storage endpoint.
    pub fn public_base(&self) -> &str {
        self.public_base_url
            .as_deref()
            .unwrap_or(&self.endpoint_url)
    }
}

impl EmailConfig {
    pub fn disabled() -> Self {
        Self {
            provider: None,
            from: DEFAULT_EMAIL_FROM.to_string(),
            recipient: None,
        }
    }

    /// Notifications need both a provider and somebody to send to.
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some() && self.recipient.is_some()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| var(key).with_context(|| format!("{key} must be set"));

        let server_host = var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = var("SERVER_PORT")
            .or_else(|| var("PORT"))
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;

        let storage = StorageConfig {
            endpoint_url: required("STORAGE_ENDPOINT_URL")?,
            access_key_id: required("STORAGE_ACCESS_KEY_ID")?,
            secret_access_key: required("STORAGE_SECRET_ACCESS_KEY")?,
            region: var("STORAGE_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            bucket: var("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            public_base_url: var("STORAGE_PUBLIC_BASE_URL"),
        };
        if !storage.endpoint_url.starts_with("http://")
            && !storage.endpoint_url.starts_with("https://")
        {
            bail!("STORAGE_ENDPOINT_URL must be an http(s) URL");
        }

        let provider = if let Some(api_key) = var("RESEND_API_KEY") {
            Some(EmailProvider::Resend {
                api_key,
                api_url: var("RESEND_API_URL")
                    .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string()),
            })
        } else if let (Some(user), Some(password)) = (var("SMTP_USER"), var("SMTP_PASSWORD")) {
            Some(EmailProvider::Smtp {
                host: var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                port: var("SMTP_PORT")
                    .unwrap_or_else(|| "587".to_string())
                    .parse()
                    .context("SMTP_PORT must be a valid u16")?,
                user,
                password,
            })
        } else {
            None
        };

        // SMTP deployments send from the authenticated account unless told otherwise.
        let from = match (&provider, var("EMAIL_FROM")) {
            (_, Some(from)) => from,
            (Some(EmailProvider::Smtp { user, .. }), None) => user.clone(),
            _ => DEFAULT_EMAIL_FROM.to_string(),
        };

        let email = EmailConfig {
            provider,
            from,
            recipient: var("EMAIL_RECIPIENT"),
        };

        let cors_allowed_origin = var("CORS_ALLOWED_ORIGIN");
        let max_upload_bytes = match var("MAX_UPLOAD_BYTES") {
            Some(value) => value
                .parse()
                .context("MAX_UPLOAD_BYTES must be a positive integer")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            server_host,
            server_port,
            storage,
            email,
            cors_allowed_origin,
            max_upload_bytes,
        })
    }
}
