pub mod backend;
pub mod client;
pub mod types;

pub use backend::{ApiError, DetectionApi};
pub use client::{ApiClient, ClientConfig, DEFAULT_TIMEOUT};
pub use types::{DEFAULT_PAGE, ImageFile, Paginated, S3BatchAck};
