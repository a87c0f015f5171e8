use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use super::types::{ImageFile, Paginated, S3BatchAck};

/// Errors that can occur while talking to the detection backend.
/// Each request function returns one of these, so callers can branch on the kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Client misconfigured (bad base URL, invalid MIME type, builder failure).
    Config(String),
    /// No response at all (DNS, connection refused, connection reset).
    Network(String),
    /// No response within the configured timeout.
    Timeout,
    /// Backend answered with a non-2xx status.
    Status { status: u16, body: String },
    /// Backend answered 2xx but the body was not the expected JSON.
    Parse(String),
    /// Reading a local image file failed.
    Io(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(msg) => write!(f, "config error: {msg}"),
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Timeout => write!(f, "request timed out"),
            ApiError::Status { status, body } => {
                write!(f, "API error (HTTP {status}): {body}")
            }
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
            ApiError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_builder() {
            ApiError::Config(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// The detection backend as seen by the pages: one method per endpoint.
#[async_trait]
pub trait DetectionApi: Send + Sync {
    /// `POST upload/` as multipart form data, one `images` part per file.
    async fn upload_images(&self, images: &[ImageFile]) -> Result<Value, ApiError>;

    /// `GET /history/manual/?page=N`, N defaulting to 1.
    async fn manual_history(&self, page: Option<u32>) -> Result<Paginated, ApiError>;

    /// `GET /history/batch/?page=N`, N defaulting to 1.
    async fn batch_history(&self, page: Option<u32>) -> Result<Paginated, ApiError>;

    /// `GET /record/{id}/`
    async fn record_detail(&self, record_id: &str) -> Result<Value, ApiError>;

    /// `GET /batch/{id}/`
    async fn batch_detail(&self, batch_id: &str) -> Result<Value, ApiError>;

    /// `POST /process_s3_folder/` with a JSON body naming the bucket and prefix.
    async fn trigger_s3_batch(
        &self,
        bucket_name: &str,
        folder_prefix: &str,
    ) -> Result<S3BatchAck, ApiError>;
}
