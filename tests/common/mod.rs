use std::sync::Arc;

use anyhow::{anyhow, ensure, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use bytes::Bytes;
use dispute_backend::config::{
    AppConfig, EmailConfig, StorageConfig, DEFAULT_BUCKET, DEFAULT_MAX_UPLOAD_BYTES,
};
use dispute_backend::notify::{MailError, Mailer, Notifier, OutgoingEmail};
use dispute_backend::routes;
use dispute_backend::state::AppState;
use dispute_backend::storage::ObjectStorage;
use http_body_util::BodyExt;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tower::util::ServiceExt;
use uuid::Uuid;

#[allow(dead_code)]
#[derive(Clone, Debug)]
pub struct StoredObject {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl StoredObject {
    #[allow(dead_code)]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// In-memory bucket that keeps writes in order and can be told to fail.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<Vec<StoredObject>>,
    fail_after: Option<usize>,
}

impl FakeStorage {
    #[allow(dead_code)]
    pub fn failing_after(writes: usize) -> Self {
        Self {
            objects: Mutex::new(Vec::new()),
            fail_after: Some(writes),
        }
    }

    #[allow(dead_code)]
    pub async fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().await.clone()
    }

    #[allow(dead_code)]
    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    #[allow(dead_code)]
    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        let guard = self.objects.lock().await;
        guard.iter().find(|obj| obj.key == key).cloned()
    }
}

pub const FAKE_PUBLIC_BASE: &str = "https://fake-storage/uploads";

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put_object(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        let mut guard = self.objects.lock().await;
        if let Some(limit) = self.fail_after {
            ensure!(guard.len() < limit, "bucket unavailable while writing {key}");
        }
        guard.push(StoredObject {
            key: key.to_string(),
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    async fn public_url(&self, key: &str) -> Result<String> {
        let guard = self.objects.lock().await;
        ensure!(
            guard.iter().any(|obj| obj.key == key),
            "object {key} missing"
        );
        Ok(format!("{FAKE_PUBLIC_BASE}/{key}"))
    }
}

/// Forwards every sent message to a channel the test can await.
pub struct RecordingMailer {
    sender: mpsc::UnboundedSender<OutgoingEmail>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let _ = self.sender.send(email.clone());
        Ok(format!("fake-{}", Uuid::new_v4()))
    }
}

/// Always rejects, recording the attempt.
pub struct RejectingMailer {
    attempts: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl Mailer for RejectingMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<String, MailError> {
        let _ = self.attempts.send(());
        Err(MailError::Rejected {
            status: 422,
            body: "invalid recipient".to_string(),
        })
    }
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

impl<'a> FilePart<'a> {
    #[allow(dead_code)]
    pub fn new(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            field: "arquivo",
            filename,
            content_type,
            data,
        }
    }
}

pub struct TestApp {
    router: Router,
    storage: Arc<FakeStorage>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        storage: StorageConfig {
            endpoint_url: "http://127.0.0.1:9000".to_string(),
            access_key_id: "test-access".to_string(),
            secret_access_key: "test-secret".to_string(),
            region: "us-east-1".to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            public_base_url: None,
        },
        email: EmailConfig::disabled(),
        cors_allowed_origin: None,
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(FakeStorage::default(), Notifier::disabled())
    }

    #[allow(dead_code)]
    pub fn with_storage(storage: FakeStorage) -> Self {
        Self::build(storage, Notifier::disabled())
    }

    #[allow(dead_code)]
    pub fn with_recording_mailer() -> (Self, mpsc::UnboundedReceiver<OutgoingEmail>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mailer: Arc<dyn Mailer> = Arc::new(RecordingMailer { sender });
        let notifier = Notifier::new(
            Some(mailer),
            "noreply@example.com",
            Some("reviewer@example.com".to_string()),
        );
        (Self::build(FakeStorage::default(), notifier), receiver)
    }

    #[allow(dead_code)]
    pub fn with_rejecting_mailer() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (attempts, receiver) = mpsc::unbounded_channel();
        let mailer: Arc<dyn Mailer> = Arc::new(RejectingMailer { attempts });
        let notifier = Notifier::new(
            Some(mailer),
            "noreply@example.com",
            Some("reviewer@example.com".to_string()),
        );
        (Self::build(FakeStorage::default(), notifier), receiver)
    }

    #[allow(dead_code)]
    pub fn with_config(config: AppConfig) -> Self {
        Self::build_with(config, FakeStorage::default(), Notifier::disabled())
    }

    fn build(storage: FakeStorage, notifier: Notifier) -> Self {
        Self::build_with(test_config(), storage, notifier)
    }

    fn build_with(config: AppConfig, storage: FakeStorage, notifier: Notifier) -> Self {
        let storage = Arc::new(storage);
        let storage_for_state: Arc<dyn ObjectStorage> = storage.clone();
        let state = AppState::new(config, storage_for_state, notifier);
        let router = routes::create_router(state);
        Self { router, storage }
    }

    #[allow(dead_code)]
    pub fn storage(&self) -> Arc<FakeStorage> {
        self.storage.clone()
    }

    pub async fn send(&self, request: Request<Body>) -> Result<hyper::Response<Body>> {
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        files: &[FilePart<'_>],
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();

        for (name, value) in fields {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
            body.extend(value.as_bytes());
            body.extend(b"\r\n");
        }

        for file in files {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    file.field, file.filename
                )
                .as_bytes(),
            );
            body.extend(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
            body.extend(file.data);
            body.extend(b"\r\n");
        }

        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))?;
        self.send(request).await
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

#[allow(dead_code)]
pub async fn body_to_json(body: Body) -> Result<serde_json::Value> {
    let bytes = body_to_vec(body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
