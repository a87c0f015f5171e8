//! # Core Application Logic
//!
//! Routing, pages and configuration. Knows nothing about the terminal;
//! all HTTP goes through [`crate::api::DetectionApi`].
//!
//! ```text
//!     location                       ┌────────────────────┐
//!        │                           │       CORE         │
//!        ▼                           │                    │
//!   router::Router ──► pages::Page ──┼──► DetectionApi ───┼──► backend (HTTP)
//!                                    │                    │
//!   config ──► ClientConfig ─────────┼──► ApiClient       │
//!                                    └────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`router`]: the route table and path resolution
//! - [`pages`]: what each route shows and how it loads
//! - [`config`]: layered settings for the API client

pub mod config;
pub mod pages;
pub mod router;
