//! HTTP client for the detection backend.
//!
//! One `ApiClient` owns one `reqwest::Client` (connection pool, timeout,
//! default `Content-Type: application/json`). Clone it freely; clones share the pool.
//!
//! Every request goes through [`ApiClient::dispatch`], the single place where
//! failures are logged. Errors are returned unchanged: no retry, no caching.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::backend::{ApiError, DetectionApi};
use super::types::{HistoryQuery, IMAGES_FIELD, ImageFile, Paginated, S3BatchAck, S3BatchRequest};

/// Default request timeout. Detection on large uploads is slow.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(150);

/// Everything needed to build an `ApiClient`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the detection backend REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL {:?}: {e}", config.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "base URL {:?} must use http or https, not {:?}",
                config.base_url,
                url.scheme()
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Joins an endpoint path onto the base URL with exactly one `/` between them.
    /// `upload/` and `/upload/` land on the same URL, under any base path prefix.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds, sends and decodes one request. Every failure, including one raised
    /// while `prepare` attaches the body, is logged here once and handed back as-is.
    async fn dispatch<T, F>(&self, method: Method, path: &str, prepare: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> Result<RequestBuilder, ApiError>,
    {
        let url = self.endpoint(path);
        let outcome = match prepare(self.client.request(method.clone(), &url)) {
            Ok(request) => self.execute(request).await,
            Err(e) => Err(e),
        };
        if let Err(ref e) = outcome {
            warn!("API request failed: {} {} - {}", method, url, e);
        }
        outcome
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = request.build()?;
        debug!("{} {}", request.method(), request.url());

        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        decode_body(&body)
    }
}

/// Decodes a 2xx body. An empty body is a success: it decodes as `null`, or as
/// `{}` for types that need an object, so `Value` becomes `Null` and the typed
/// payloads take their defaults.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_str("null")
            .or_else(|_| serde_json::from_str("{}"))
            .map_err(|e| ApiError::Parse(e.to_string()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Builds the multipart form for an upload. Always multipart, even for zero or one file.
fn upload_form(images: &[ImageFile]) -> Result<Form, ApiError> {
    images.iter().try_fold(Form::new(), |form, image| {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime)
            .map_err(|e| ApiError::Config(format!("invalid MIME type {:?}: {e}", image.mime)))?;
        Ok(form.part(IMAGES_FIELD, part))
    })
}

#[async_trait]
impl DetectionApi for ApiClient {
    async fn upload_images(&self, images: &[ImageFile]) -> Result<Value, ApiError> {
        debug!("Uploading {} image(s)", images.len());
        self.dispatch(Method::POST, "upload/", |request| {
            Ok(request.multipart(upload_form(images)?))
        })
        .await
    }

    async fn manual_history(&self, page: Option<u32>) -> Result<Paginated, ApiError> {
        let query = HistoryQuery::new(page);
        self.dispatch(Method::GET, "/history/manual/", |request| {
            Ok(request.query(&query))
        })
        .await
    }

    async fn batch_history(&self, page: Option<u32>) -> Result<Paginated, ApiError> {
        let query = HistoryQuery::new(page);
        self.dispatch(Method::GET, "/history/batch/", |request| {
            Ok(request.query(&query))
        })
        .await
    }

    async fn record_detail(&self, record_id: &str) -> Result<Value, ApiError> {
        self.dispatch(Method::GET, &format!("/record/{record_id}/"), Ok)
            .await
    }

    async fn batch_detail(&self, batch_id: &str) -> Result<Value, ApiError> {
        self.dispatch(Method::GET, &format!("/batch/{batch_id}/"), Ok)
            .await
    }

    async fn trigger_s3_batch(
        &self,
        bucket_name: &str,
        folder_prefix: &str,
    ) -> Result<S3BatchAck, ApiError> {
        let body = S3BatchRequest {
            s3_bucket_name: bucket_name,
            s3_folder_prefix: folder_prefix,
        };
        self.dispatch(Method::POST, "/process_s3_folder/", |request| {
            Ok(request.json(&body))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Collects warnings so tests can check what the failure hook logged.
    struct WarningCollector;

    static WARNINGS: Mutex<Vec<String>> = Mutex::new(Vec::new());
    static COLLECTOR: WarningCollector = WarningCollector;

    impl log::Log for WarningCollector {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                WARNINGS.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(ClientConfig::new(base_url)).unwrap()
    }

    #[test]
    fn test_default_timeout_is_150_seconds() {
        let config = ClientConfig::new("http://localhost:8000/api");
        assert_eq!(config.timeout, Duration::from_secs(150));
        assert_eq!(client(&config.base_url).timeout(), Duration::from_secs(150));
    }

    #[test]
    fn test_with_timeout_overrides_default() {
        let config = ClientConfig::new("http://localhost").with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = ApiClient::new(ClientConfig::new("not a url"));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_endpoint_joins_with_single_slash() {
        let api = client("http://backend:8000/api/");
        assert_eq!(api.base_url(), "http://backend:8000/api");
        assert_eq!(api.endpoint("upload/"), "http://backend:8000/api/upload/");
        assert_eq!(
            api.endpoint("/history/manual/"),
            "http://backend:8000/api/history/manual/"
        );
    }

    #[test]
    fn test_endpoint_without_base_path() {
        let api = client("http://backend:8000");
        assert_eq!(api.endpoint("/record/r1/"), "http://backend:8000/record/r1/");
    }

    #[test]
    fn test_upload_form_rejects_bad_mime() {
        let image = ImageFile {
            file_name: "x.jpg".to_string(),
            bytes: vec![],
            mime: "not a mime\n".to_string(),
        };
        assert!(matches!(upload_form(&[image]), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_upload_form_accepts_empty_bundle() {
        assert!(upload_form(&[]).is_ok());
    }

    #[test]
    fn test_base_url_without_http_scheme_is_config_error() {
        for base_url in ["localhost:8000/api", "ftp://backend/api", "file:///tmp/api"] {
            let result = ApiClient::new(ClientConfig::new(base_url));
            assert!(
                matches!(result, Err(ApiError::Config(_))),
                "accepted {base_url:?}"
            );
        }
        assert!(ApiClient::new(ClientConfig::new("https://backend/api")).is_ok());
    }

    #[test]
    fn test_empty_body_decodes_to_null_value() {
        let value: Value = decode_body(b"").unwrap();
        assert_eq!(value, Value::Null);
        let value: Value = decode_body(b" \r\n").unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_empty_body_decodes_to_defaulted_payloads() {
        let ack: S3BatchAck = decode_body(b"").unwrap();
        assert_eq!(ack, S3BatchAck::default());
        let page: Paginated = decode_body(b"").unwrap();
        assert_eq!(page, Paginated::default());
    }

    #[test]
    fn test_non_json_body_is_parse_error() {
        let result: Result<Value, ApiError> = decode_body(b"<html>oops</html>");
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn test_upload_with_bad_mime_is_logged_and_returned() {
        let _ = log::set_logger(&COLLECTOR);
        log::set_max_level(log::LevelFilter::Warn);

        // Nothing listens on port 1; the request must fail before it is sent.
        let api = client("http://127.0.0.1:1");
        let image = ImageFile {
            file_name: "x.jpg".to_string(),
            bytes: vec![],
            mime: "bogus mime\n".to_string(),
        };
        let result = api.upload_images(&[image]).await;

        assert!(matches!(
            result,
            Err(ApiError::Config(ref msg)) if msg.contains("invalid MIME type")
        ));
        let warnings = WARNINGS.lock().unwrap();
        assert!(warnings.iter().any(|line| {
            line.contains("POST http://127.0.0.1:1/upload/") && line.contains("invalid MIME type")
        }));
    }
}
