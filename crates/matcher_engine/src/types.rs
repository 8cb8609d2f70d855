use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::RecentActivity;

pub type RunId = u64;

/// Everything the driver needs to build the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub path: PathBuf,
    pub preferences: Vec<String>,
    pub profile_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadProgress {
        run_id: RunId,
        sent: u64,
        total: u64,
    },
    SimulatorTick {
        run_id: RunId,
        step_index: usize,
        step_label: String,
        percent: u8,
    },
    AnalysisFinished {
        run_id: RunId,
        result: Result<Value, DispatchError>,
    },
    RecentActivity(Result<Vec<RecentActivity>, DispatchError>),
    ExportWritten(Result<PathBuf, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    pub kind: FailureKind,
    pub message: String,
}

impl DispatchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for DispatchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// Non-success status; `body` is the parsed JSON body when there was one.
    HttpStatus { status: u16, body: Option<Value> },
    Timeout,
    Network,
    /// The document could not be read from disk.
    Io,
    /// Success status but the body was not JSON.
    Decode,
    /// The request could not be built locally.
    Client,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus { status, .. } => write!(f, "http status {status}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Client => write!(f, "client error"),
        }
    }
}
