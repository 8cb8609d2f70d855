use serde_json::Value;

pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please check your connection and try again.";
pub const CONNECTIVITY_MESSAGE: &str =
    "Cannot connect to the analysis server. Please check that it is running.";

/// Why a dispatched analysis did not produce a usable result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// The request exceeded its deadline.
    Timeout,
    /// The server answered with a non-success status.
    HttpStatus { status: u16, body: Option<Value> },
    /// The request was sent but no response arrived.
    Connectivity { detail: String },
    /// A success-shaped payload carried its own `error` field.
    EmbeddedError { message: String },
    /// Anything else.
    Unexpected { detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Timeout,
    Server,
    Connectivity,
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ErrorState {
    pub(crate) fn validation(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            retryable,
        }
    }
}

/// Maps a failure to exactly one user-facing message. First match wins:
/// timeout, HTTP status, connectivity, anything else.
pub fn classify(failure: &RequestFailure) -> ErrorState {
    let (kind, message) = match failure {
        RequestFailure::Timeout => (ErrorKind::Timeout, TIMEOUT_MESSAGE.to_string()),
        RequestFailure::HttpStatus { status, body } => (
            ErrorKind::Server,
            server_message(body.as_ref())
                .unwrap_or_else(|| format!("Request failed (status {status})")),
        ),
        RequestFailure::Connectivity { .. } => {
            (ErrorKind::Connectivity, CONNECTIVITY_MESSAGE.to_string())
        }
        RequestFailure::EmbeddedError { message } => {
            (ErrorKind::Unexpected, format!("Analysis failed: {message}"))
        }
        RequestFailure::Unexpected { detail } => (
            ErrorKind::Unexpected,
            format!("An unexpected error occurred: {detail}"),
        ),
    };
    ErrorState {
        kind,
        message,
        retryable: true,
    }
}

/// Structured message from an error body: `error` (string, or object with a
/// `message`), then `message`, then `detail`.
fn server_message(body: Option<&Value>) -> Option<String> {
    let body = body?;
    let from_error = match body.get("error") {
        Some(Value::String(text)) => Some(text.as_str()),
        Some(Value::Object(map)) => map.get("message").and_then(Value::as_str),
        _ => None,
    };
    [
        from_error,
        body.get("message").and_then(Value::as_str),
        body.get("detail").and_then(Value::as_str),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|text| !text.is_empty())
    .map(ToOwned::to_owned)
}
