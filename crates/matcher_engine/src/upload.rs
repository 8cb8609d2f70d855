use std::sync::{mpsc, Arc};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{stream, StreamExt};
use matcher_logging::{matcher_debug, matcher_info};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use url::Url;

use crate::activity::{parse_feed, RecentActivity};
use crate::{DispatchError, EngineEvent, FailureKind, RunId, UploadRequest};

pub const ANALYZE_PATH: &str = "analyze";
pub const RECENT_ACTIVITY_PATH: &str = "activity/recent";

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub api_base_url: String,
    pub connect_timeout: Duration,
    /// Covers the whole exchange; analysis is slow server-side.
    pub request_timeout: Duration,
    pub chunk_size: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(180),
            chunk_size: 64 * 1024,
        }
    }
}

impl UploadSettings {
    pub fn endpoint(&self, path: &str) -> Result<Url, DispatchError> {
        let base = self.api_base_url.trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|err| DispatchError::new(FailureKind::InvalidUrl, format!("{base}: {err}")))
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Uploads the document and returns the backend's JSON verbatim.
    async fn analyze(
        &self,
        run_id: RunId,
        request: &UploadRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Value, DispatchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestAnalysisClient {
    settings: UploadSettings,
}

impl ReqwestAnalysisClient {
    pub fn new(settings: UploadSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, DispatchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| DispatchError::new(FailureKind::Client, err.to_string()))
    }

    /// Latest backend activity for the idle dashboard.
    pub async fn recent_activity(&self) -> Result<Vec<RecentActivity>, DispatchError> {
        let url = self.settings.endpoint(RECENT_ACTIVITY_PATH)?;
        let client = self.build_client()?;
        let response = client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        parse_feed(&body)
    }
}

#[async_trait::async_trait]
impl AnalysisClient for ReqwestAnalysisClient {
    async fn analyze(
        &self,
        run_id: RunId,
        request: &UploadRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Value, DispatchError> {
        let url = self.settings.endpoint(ANALYZE_PATH)?;
        let client = self.build_client()?;

        let payload = tokio::fs::read(&request.path).await.map_err(|err| {
            DispatchError::new(
                FailureKind::Io,
                format!("{}: {err}", request.path.display()),
            )
        })?;
        let total = payload.len() as u64;
        let preferences = serde_json::to_string(&request.preferences)
            .map_err(|err| DispatchError::new(FailureKind::Decode, err.to_string()))?;

        let chunks = progress_chunks(
            run_id,
            Bytes::from(payload),
            self.settings.chunk_size,
            sink.clone(),
        );
        let part = Part::stream_with_length(reqwest::Body::wrap_stream(chunks), total)
            .file_name(request.file_name.clone())
            .mime_str(&request.content_type)
            .map_err(|err| {
                DispatchError::new(
                    FailureKind::Client,
                    format!("content type {:?}: {err}", request.content_type),
                )
            })?;
        let mut form = Form::new().part("file", part).text("preferences", preferences);
        if let Some(link) = &request.profile_link {
            form = form.text("profile_link", link.clone());
        }

        matcher_info!("Uploading {} ({} bytes) to {}", request.file_name, total, url);
        sink.emit(EngineEvent::UploadProgress {
            run_id,
            sent: 0,
            total,
        });

        let response = client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        matcher_debug!("Analysis response: {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        serde_json::from_slice(&body)
            .map_err(|err| DispatchError::new(FailureKind::Decode, err.to_string()))
    }
}

/// Splits the document into chunks and reports each one as it is handed to the transport.
fn progress_chunks(
    run_id: RunId,
    payload: Bytes,
    chunk_size: usize,
    sink: Arc<dyn ProgressSink>,
) -> impl futures_util::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = payload.len() as u64;
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<Bytes> = (0..payload.len())
        .step_by(chunk_size)
        .map(|start| payload.slice(start..(start + chunk_size).min(payload.len())))
        .collect();

    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        sink.emit(EngineEvent::UploadProgress { run_id, sent, total });
        Ok::<Bytes, std::io::Error>(chunk)
    })
}

fn status_error(status: reqwest::StatusCode, body: &[u8]) -> DispatchError {
    DispatchError::new(
        FailureKind::HttpStatus {
            status: status.as_u16(),
            body: serde_json::from_slice(body).ok(),
        },
        status.to_string(),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> DispatchError {
    if err.is_timeout() {
        DispatchError::new(FailureKind::Timeout, err.to_string())
    } else if err.is_decode() {
        DispatchError::new(FailureKind::Decode, err.to_string())
    } else {
        DispatchError::new(FailureKind::Network, err.to_string())
    }
}
