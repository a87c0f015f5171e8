//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::{ApiError, DetectionApi, ImageFile, Paginated, S3BatchAck};

/// One call made against a [`RecordingApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UploadImages(usize),
    ManualHistory(Option<u32>),
    BatchHistory(Option<u32>),
    RecordDetail(String),
    BatchDetail(String),
    TriggerS3Batch(String, String),
}

/// A backend double that records every call and answers with canned data,
/// or with a fixed error when built with [`RecordingApi::failing`].
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    error: Option<ApiError>,
}

impl RecordingApi {
    pub fn new() -> Self {
        RecordingApi {
            calls: Mutex::new(Vec::new()),
            error: None,
        }
    }

    pub fn failing(error: ApiError) -> Self {
        RecordingApi {
            calls: Mutex::new(Vec::new()),
            error: Some(error),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record<T>(&self, call: Call, ok: T) -> Result<T, ApiError> {
        self.calls.lock().unwrap().push(call);
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(ok),
        }
    }
}

#[async_trait]
impl DetectionApi for RecordingApi {
    async fn upload_images(&self, images: &[ImageFile]) -> Result<Value, ApiError> {
        self.record(Call::UploadImages(images.len()), json!({ "results": [] }))
    }

    async fn manual_history(&self, page: Option<u32>) -> Result<Paginated, ApiError> {
        self.record(Call::ManualHistory(page), Paginated::default())
    }

    async fn batch_history(&self, page: Option<u32>) -> Result<Paginated, ApiError> {
        self.record(Call::BatchHistory(page), Paginated::default())
    }

    async fn record_detail(&self, record_id: &str) -> Result<Value, ApiError> {
        self.record(
            Call::RecordDetail(record_id.to_string()),
            json!({ "id": record_id }),
        )
    }

    async fn batch_detail(&self, batch_id: &str) -> Result<Value, ApiError> {
        self.record(
            Call::BatchDetail(batch_id.to_string()),
            json!({ "id": batch_id }),
        )
    }

    async fn trigger_s3_batch(
        &self,
        bucket_name: &str,
        folder_prefix: &str,
    ) -> Result<S3BatchAck, ApiError> {
        self.record(
            Call::TriggerS3Batch(bucket_name.to_string(), folder_prefix.to_string()),
            S3BatchAck {
                task_id: Some("task-1".to_string()),
                ..Default::default()
            },
        )
    }
}
