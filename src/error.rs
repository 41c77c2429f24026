use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unrecognized format: {0}")]
    UnrecognizedFormat(String),

    #[error("corrupt compressed stream: {0}")]
    CorruptCompression(#[source] std::io::Error),

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("source transport error: {0}")]
    SourceTransport(#[source] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream service error: {0}")]
    Upstream(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("payload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("sketch error: {0}")]
    Sketch(#[from] sourmash::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse error classification handed to record sinks and HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    UnrecognizedFormat,
    CorruptCompression,
    MalformedRecord,
    SourceTransportError,
    NotFound,
    InvalidInput,
    UpstreamError,
    Unavailable,
    PayloadTooLarge,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnrecognizedFormat => "UnrecognizedFormat",
            ErrorKind::CorruptCompression => "CorruptCompression",
            ErrorKind::MalformedRecord => "MalformedRecord",
            ErrorKind::SourceTransportError => "SourceTransportError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::UpstreamError => "UpstreamError",
            ErrorKind::Unavailable => "Unavailable",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl Error {
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnrecognizedFormat(_) => ErrorKind::UnrecognizedFormat,
            Error::CorruptCompression(_) => ErrorKind::CorruptCompression,
            Error::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Error::SourceTransport(_) => ErrorKind::SourceTransportError,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Upstream(_) => ErrorKind::UpstreamError,
            Error::Unavailable(_) => ErrorKind::Unavailable,
            Error::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Error::Sketch(_) | Error::Io(_) | Error::Internal(_) => ErrorKind::InternalError,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::UnrecognizedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::CorruptCompression | ErrorKind::MalformedRecord => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorKind::SourceTransportError | ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                kind: self.kind().as_str(),
                message: self.to_string(),
            },
        };
        (self.status_code(), axum::Json(body)).into_response()
    }
}
