use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::backend::ApiError;

/// Page requested when the caller does not name one.
pub const DEFAULT_PAGE: u32 = 1;

/// Multipart field every uploaded image is sent under.
pub const IMAGES_FIELD: &str = "images";

/// One image to send for detection.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ImageFile {
    /// Wraps in-memory bytes, guessing the MIME type from the file name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).to_string();
        ImageFile {
            file_name,
            bytes,
            mime,
        }
    }

    /// Reads an image from disk. Only the final path component is sent as the file name.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Io(format!("{}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(ImageFile::new(file_name, bytes))
    }
}

/// Maps a file extension to the MIME type the backend expects for it.
fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Query string for the history listings.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct HistoryQuery {
    pub page: u32,
}

impl HistoryQuery {
    pub fn new(page: Option<u32>) -> Self {
        HistoryQuery {
            page: page.unwrap_or(DEFAULT_PAGE),
        }
    }
}

/// JSON body of the S3 batch trigger. Field order is the wire order.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct S3BatchRequest<'a> {
    pub s3_bucket_name: &'a str,
    pub s3_folder_prefix: &'a str,
}

/// One page of a history listing.
///
/// The backend owns the shape; every field is defaulted so an unexpected
/// payload still loads, and unknown keys are kept in `extra`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Paginated {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Paginated {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Acknowledgment of a submitted S3 batch job.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct S3BatchAck {
    #[serde(default)]
    pub message: Option<String>,
    /// Identifier of the async job processing the folder.
    #[serde(default, alias = "celery_task_id")]
    pub task_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
