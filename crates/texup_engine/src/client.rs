use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use texup_logging::{texup_debug, texup_info, texup_warn};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::sse::SseDecoder;
use crate::{ClientError, FailureKind, ServerEvent, UploadFile};

/// Multipart field the service reads the document from.
pub const FILE_FIELD: &str = "file";

/// Processing style requested from the service; selects the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    #[default]
    Verbatim,
    Rewriting,
    Summarizing,
}

impl TextMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TextMode::Verbatim => "verbatim",
            TextMode::Rewriting => "rewriting",
            TextMode::Summarizing => "summarizing",
        }
    }
}

impl fmt::Display for TextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verbatim" => Ok(TextMode::Verbatim),
            "rewriting" => Ok(TextMode::Rewriting),
            "summarizing" => Ok(TextMode::Summarizing),
            other => Err(format!(
                "unknown text mode '{other}' (expected verbatim, rewriting or summarizing)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub text_mode: TextMode,
    /// Overrides the `/api/{text_mode}` upload path.
    pub upload_path: Option<String>,
    pub status_path: String,
    pub download_path: String,
    pub process_path: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Longest silence tolerated on an open event stream.
    pub stream_idle_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            text_mode: TextMode::default(),
            upload_path: None,
            status_path: "/api/status".to_string(),
            download_path: "/api/dl".to_string(),
            process_path: "/api/process".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            stream_idle_timeout: Duration::from_secs(60),
            max_download_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ClientSettings {
    pub fn upload_path(&self) -> String {
        self.upload_path
            .clone()
            .unwrap_or_else(|| format!("/api/{}", self.text_mode))
    }

    /// Joins `path` (and an optional task segment, percent-encoded) onto the base URL.
    pub fn endpoint(&self, path: &str, task: Option<&str>) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ClientError::new(FailureKind::InvalidUrl, "base url cannot carry a path")
            })?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|part| !part.is_empty()));
            if let Some(task) = task {
                segments.push(task);
            }
        }
        Ok(url)
    }
}

/// Receives non-terminal events while a stream is open.
pub trait StreamSink: Send + Sync {
    fn on_event(&self, event: ServerEvent);
}

/// The conversion service as seen by the client.
#[async_trait::async_trait]
pub trait ConversionApi: Send + Sync {
    /// Uploads a document and returns the task id.
    async fn upload(&self, file: &UploadFile) -> Result<String, ClientError>;

    /// Uploads a document, caring only that the server accepted it.
    async fn submit(&self, file: &UploadFile) -> Result<(), ClientError>;

    /// Current status string of a task.
    async fn status(&self, task: &str) -> Result<String, ClientError>;

    /// Converted result of a finished task.
    async fn download(&self, task: &str) -> Result<Vec<u8>, ClientError>;

    /// Uploads a document as the payload of an event stream and follows it.
    ///
    /// Returns the `end` event, or `Ok(None)` when `cancel` fired first.
    async fn stream(
        &self,
        file: &UploadFile,
        sink: &dyn StreamSink,
        cancel: &CancellationToken,
    ) -> Result<Option<ServerEvent>, ClientError>;
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    settings: ClientSettings,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        // Validate early so a bad base URL fails at startup, not on first upload.
        settings.endpoint("/", None)?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.stream_idle_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            client,
            stream_client,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn form(file: &UploadFile) -> Result<Form, ClientError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|err| ClientError::new(FailureKind::InvalidRequest, err.to_string()))?;
        Ok(Form::new().part(FILE_FIELD, part))
    }

    async fn post_file(
        &self,
        client: &reqwest::Client,
        path: &str,
        file: &UploadFile,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.settings.endpoint(path, None)?;
        texup_debug!("POST {} file={:?}", url, file);
        let response = client
            .post(url)
            .multipart(Self::form(file)?)
            .header(ACCEPT, accept_for(path, &self.settings))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response)
    }

    async fn get(&self, path: &str, task: &str) -> Result<reqwest::Response, ClientError> {
        let url = self.settings.endpoint(path, Some(task))?;
        texup_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response)
    }

    async fn read_limited(&self, response: reqwest::Response) -> Result<Vec<u8>, ClientError> {
        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ClientError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ClientError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl ConversionApi for ReqwestClient {
    async fn upload(&self, file: &UploadFile) -> Result<String, ClientError> {
        let response = self
            .post_file(&self.client, &self.settings.upload_path(), file)
            .await?;
        let body = self.read_limited(response).await?;
        parse_task_id(&body)
    }

    async fn submit(&self, file: &UploadFile) -> Result<(), ClientError> {
        self.post_file(&self.client, &self.settings.upload_path(), file)
            .await
            .map(|_| ())
    }

    async fn status(&self, task: &str) -> Result<String, ClientError> {
        let response = self.get(&self.settings.status_path, task).await?;
        let body = self.read_limited(response).await?;
        let parsed: StatusBody = serde_json::from_slice(&body)
            .map_err(|err| ClientError::new(FailureKind::InvalidResponse, err.to_string()))?;
        Ok(parsed.status)
    }

    async fn download(&self, task: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.get(&self.settings.download_path, task).await?;
        self.read_limited(response).await
    }

    async fn stream(
        &self,
        file: &UploadFile,
        sink: &dyn StreamSink,
        cancel: &CancellationToken,
    ) -> Result<Option<ServerEvent>, ClientError> {
        let request = self.post_file(&self.stream_client, &self.settings.process_path, file);
        let response = tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            response = request => response?,
        };

        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Ok(None),
                chunk = body.next() => chunk,
            };
            let Some(chunk) = chunk else {
                decoder.finish();
                return Err(ClientError::new(
                    FailureKind::InvalidResponse,
                    "stream closed before end event",
                ));
            };
            let chunk = chunk.map_err(map_reqwest_error)?;
            for event in decoder.push(&chunk) {
                if event.is_end() {
                    texup_info!("stream end: {}", event.data);
                    return Ok(Some(event));
                }
                texup_info!("stream {}: {}", event.event, event.data);
                sink.on_event(event);
            }
        }
    }
}

fn accept_for(path: &str, settings: &ClientSettings) -> &'static str {
    if path == settings.process_path {
        "text/event-stream"
    } else {
        "application/json"
    }
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        texup_warn!("{} answered {}", response.url(), status);
        Err(ClientError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

/// Reads `tid` from an upload response. Numeric ids are accepted as well.
fn parse_task_id(body: &[u8]) -> Result<String, ClientError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|err| ClientError::new(FailureKind::InvalidResponse, err.to_string()))?;
    match value.get("tid") {
        Some(serde_json::Value::String(tid)) if !tid.is_empty() => Ok(tid.clone()),
        Some(serde_json::Value::Number(tid)) => Ok(tid.to_string()),
        _ => Err(ClientError::new(
            FailureKind::InvalidResponse,
            "upload response has no task id",
        )),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ClientError::new(FailureKind::InvalidRequest, err.to_string());
    }
    if err.is_decode() || err.is_body() {
        return ClientError::new(FailureKind::InvalidResponse, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
