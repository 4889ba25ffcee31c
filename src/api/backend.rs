//! EchoFlix backend client
//!
//! HTTP boundary to the peer-to-peer distribution backend: upload a video
//! for seeding, seed from a `.torrent` descriptor, poll transfer status,
//! and resolve the stream and download-artifact endpoints.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{SessionCreated, SessionId, TransferKind, TransferStatus};

/// Default backend when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Connection establishment limit for every request
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total deadline for status polls and artifact downloads.
/// Uploads and seeds are not bounded: the backend replies only after it has
/// ingested the whole file.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend error types
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned HTTP {0}")]
    Http(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

/// The operations the session controller needs from the backend.
///
/// Implemented by [`BackendClient`] over HTTP; tests substitute scripted
/// in-memory backends.
pub trait Backend: Send + Sync + 'static {
    /// Create a session from a local file (`/upload` or `/seed`)
    fn create_session(
        &self,
        kind: TransferKind,
        file: &Path,
    ) -> impl Future<Output = Result<SessionId, BackendError>> + Send;

    /// Fetch one status snapshot for a session
    fn status(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<TransferStatus, BackendError>> + Send;

    /// Playback source for a session
    fn stream_url(&self, id: &SessionId) -> String;

    /// Download-artifact location for a session
    fn download_url(&self, id: &SessionId) -> String;
}

/// HTTP client for the EchoFlix backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl BackendClient {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Override the deadline applied to status polls and artifact downloads
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn session_url(&self, endpoint: &str, id: &SessionId) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            endpoint,
            urlencoding::encode(id.as_str())
        )
    }

    /// Upload a video file for seeding
    pub async fn upload(&self, file: &Path) -> Result<SessionId, BackendError> {
        self.post_file(TransferKind::Upload, file).await
    }

    /// Start fetching from the swarm using a `.torrent` descriptor
    pub async fn seed(&self, torrent: &Path) -> Result<SessionId, BackendError> {
        self.post_file(TransferKind::Seed, torrent).await
    }

    /// Post a file as multipart field `file` and read back the session id
    async fn post_file(&self, kind: TransferKind, file: &Path) -> Result<SessionId, BackendError> {
        let handle = tokio::fs::File::open(file).await?;
        let length = handle.metadata().await?.len();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut part = Part::stream_with_length(handle, length).file_name(file_name);
        if kind == TransferKind::Seed {
            part = part.mime_str("application/x-bittorrent")?;
        }
        let form = Form::new().part("file", part);

        let url = format!("{}{}", self.base_url, kind.endpoint());
        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await?;

        let created: SessionCreated = Self::read_json(response).await?;
        if created.session_id.as_str().is_empty() {
            return Err(BackendError::InvalidResponse("empty session_id".into()));
        }
        Ok(created.session_id)
    }

    /// Poll the transfer status of a session
    pub async fn status(&self, id: &SessionId) -> Result<TransferStatus, BackendError> {
        let response = self
            .client
            .get(self.session_url("status", id))
            .timeout(self.request_timeout)
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Stream endpoint for a session
    pub fn stream_url(&self, id: &SessionId) -> String {
        self.session_url("stream", id)
    }

    /// Download-artifact endpoint for a session
    pub fn download_url(&self, id: &SessionId) -> String {
        self.session_url("download", id)
    }

    /// Fetch the `.torrent` artifact of a session into `dir`.
    ///
    /// The file name comes from the response's `Content-Disposition`
    /// header when present, otherwise `{session_id}.torrent`.
    pub async fn download_artifact(
        &self,
        id: &SessionId,
        dir: &Path,
    ) -> Result<PathBuf, BackendError> {
        let response = self
            .client
            .get(self.download_url(id))
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http(status.as_u16()));
        }

        let file_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_disposition_filename)
            .unwrap_or_else(|| format!("{}.torrent", sanitize_file_name(id.as_str())));

        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }

    /// Check status and parse a JSON body
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("JSON parse error: {}", e)))
    }
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl Backend for BackendClient {
    async fn create_session(
        &self,
        kind: TransferKind,
        file: &Path,
    ) -> Result<SessionId, BackendError> {
        self.post_file(kind, file).await
    }

    async fn status(&self, id: &SessionId) -> Result<TransferStatus, BackendError> {
        BackendClient::status(self, id).await
    }

    fn stream_url(&self, id: &SessionId) -> String {
        BackendClient::stream_url(self, id)
    }

    fn download_url(&self, id: &SessionId) -> String {
        BackendClient::download_url(self, id)
    }
}

/// Extract the file name from a `Content-Disposition` header value
pub fn parse_disposition_filename(header: &str) -> Option<String> {
    let re = Regex::new(r#"filename\*?=(?:UTF-8'')?"?([^";]+)"?"#).ok()?;
    let caps = re.captures(header)?;
    let raw = caps.get(1)?.as_str().trim();
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let name = sanitize_file_name(&decoded);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Keep only the final path component and drop separators
fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim_matches('.')
        .to_string()
}
