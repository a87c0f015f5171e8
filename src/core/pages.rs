//! # Pages
//!
//! The view layer: a resolved route becomes a [`Page`], and pages that show
//! backend data load it through a [`DetectionApi`].
//!
//! ```text
//! location ─► Router::resolve ─► Page::open ─► Page::load(api) ─► PageData
//! ```
//!
//! Unmatched locations open [`Page::NotFound`] instead of falling through.

use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiError, DEFAULT_PAGE, DetectionApi, Paginated};
use crate::core::router::{self, BATCH_ID, PageId, RECORD_ID, Router};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Page {
    /// Upload form.
    Home,
    /// Choice between the two history listings.
    HistoryLanding,
    ManualHistory { page: u32 },
    BatchHistory { page: u32 },
    RecordDetail { record_id: String },
    BatchDetail { batch_id: String },
    /// S3 folder trigger form.
    S3Trigger,
    NotFound { path: String },
}

/// What a page shows once loaded.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PageData {
    /// Nothing to fetch: a form or a landing page.
    Static,
    ManualHistory(Paginated),
    BatchHistory(Paginated),
    Record(Value),
    Batch(Value),
    NotFound,
}

impl Page {
    /// Opens the page for a location, forwarding dynamic segments and the
    /// `page` query parameter of the history listings.
    pub fn open(router: &Router, location: &str) -> Page {
        let Some(matched) = router.resolve(location) else {
            return Page::NotFound {
                path: location.to_string(),
            };
        };
        // Dynamic segments are guaranteed present by the route pattern.
        let segment = |name: &str| matched.param(name).unwrap_or_default().to_string();
        match matched.page() {
            PageId::Home => Page::Home,
            PageId::HistoryLanding => Page::HistoryLanding,
            PageId::ManualHistory => Page::ManualHistory {
                page: page_number(location),
            },
            PageId::BatchHistory => Page::BatchHistory {
                page: page_number(location),
            },
            PageId::RecordDetail => Page::RecordDetail {
                record_id: segment(RECORD_ID),
            },
            PageId::BatchDetail => Page::BatchDetail {
                batch_id: segment(BATCH_ID),
            },
            PageId::S3Trigger => Page::S3Trigger,
        }
    }

    /// Fetches the data this page shows. Errors are the caller's to present.
    pub async fn load(&self, api: &dyn DetectionApi) -> Result<PageData, ApiError> {
        match self {
            Page::Home | Page::HistoryLanding | Page::S3Trigger => Ok(PageData::Static),
            Page::ManualHistory { page } => {
                api.manual_history(Some(*page)).await.map(PageData::ManualHistory)
            }
            Page::BatchHistory { page } => {
                api.batch_history(Some(*page)).await.map(PageData::BatchHistory)
            }
            Page::RecordDetail { record_id } => {
                api.record_detail(record_id).await.map(PageData::Record)
            }
            Page::BatchDetail { batch_id } => api.batch_detail(batch_id).await.map(PageData::Batch),
            Page::NotFound { .. } => Ok(PageData::NotFound),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Upload images",
            Page::HistoryLanding => "History",
            Page::ManualHistory { .. } => "Manual upload history",
            Page::BatchHistory { .. } => "Batch job history",
            Page::RecordDetail { .. } => "Record detail",
            Page::BatchDetail { .. } => "Batch detail",
            Page::S3Trigger => "Process S3 folder",
            Page::NotFound { .. } => "Page not found",
        }
    }
}

/// Reads `page` from the query string. Absent, zero or garbage means the first page.
fn page_number(location: &str) -> u32 {
    router::query_of(location)
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse::<u32>().ok())
        })
        .filter(|page| *page >= 1)
        .unwrap_or(DEFAULT_PAGE)
}
