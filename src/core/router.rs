//! # Router
//!
//! Static table mapping URL paths to pages. Patterns use `:name` for a
//! dynamic segment; matching is done by a `matchit` radix tree.
//!
//! Matching is non-strict and case-insensitive: the query string and fragment
//! are ignored and one trailing slash is tolerated. A dynamic segment matches
//! exactly one non-empty path segment and is handed back verbatim, with its
//! original case.

use log::debug;

/// Identifies which page a path renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageId {
    Home,
    HistoryLanding,
    ManualHistory,
    BatchHistory,
    RecordDetail,
    BatchDetail,
    S3Trigger,
}

/// One entry of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub page: PageId,
}

pub const RECORD_ID: &str = "recordId";
pub const BATCH_ID: &str = "batchId";

pub const ROUTES: &[Route] = &[
    Route {
        path: "/",
        name: "home",
        page: PageId::Home,
    },
    Route {
        path: "/history",
        name: "historyLanding",
        page: PageId::HistoryLanding,
    },
    Route {
        path: "/history/manual",
        name: "manualHistory",
        page: PageId::ManualHistory,
    },
    Route {
        path: "/history/batch",
        name: "batchHistory",
        page: PageId::BatchHistory,
    },
    Route {
        path: "/record/:recordId",
        name: "recordDetail",
        page: PageId::RecordDetail,
    },
    Route {
        path: "/batch/:batchId",
        name: "batchDetail",
        page: PageId::BatchDetail,
    },
    Route {
        path: "/s3-trigger",
        name: "s3Trigger",
        page: PageId::S3Trigger,
    },
];

/// A path resolved to a route, with its dynamic segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: Route,
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn page(&self) -> PageId {
        self.route.page
    }

    /// Value of a named dynamic segment, e.g. `param("recordId")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub struct Router {
    table: matchit::Router<usize>,
}

impl Router {
    pub fn new() -> Self {
        let mut table = matchit::Router::new();
        for (index, route) in ROUTES.iter().enumerate() {
            table
                .insert(matchit_pattern(route.path), index)
                .expect("route table patterns are distinct and well-formed");
        }
        Router { table }
    }

    pub fn routes(&self) -> &'static [Route] {
        ROUTES
    }

    /// Resolves a location (path, optionally with query/fragment) to its route.
    /// Returns `None` when no declared route matches.
    pub fn resolve(&self, location: &str) -> Option<RouteMatch> {
        let path = normalize(location);
        // Static segments are ASCII, so lowercasing keeps segment boundaries in place.
        let lowered = path.to_ascii_lowercase();
        let matched = match self.table.at(&lowered) {
            Ok(matched) => matched,
            Err(_) => {
                debug!("No route for {:?}", location);
                return None;
            }
        };
        let route = ROUTES[*matched.value];
        // Param values come from the original path, not the lowercased copy.
        let params = route
            .path
            .split('/')
            .zip(path.split('/'))
            .filter_map(|(pattern, segment)| {
                pattern
                    .strip_prefix(':')
                    .map(|name| (name.to_string(), segment.to_string()))
            })
            .collect();
        Some(RouteMatch { route, params })
    }

    /// Builds the concrete path for a page, filling its dynamic segments from `params`.
    /// Returns `None` if a required segment is missing or empty.
    pub fn path_for(&self, page: PageId, params: &[(&str, &str)]) -> Option<String> {
        let route = ROUTES.iter().find(|route| route.page == page)?;
        if route.path == "/" {
            return Some("/".to_string());
        }
        let mut path = String::new();
        for segment in route.path.split('/').skip(1) {
            path.push('/');
            match segment.strip_prefix(':') {
                Some(name) => {
                    let (_, value) = params.iter().find(|(key, _)| *key == name)?;
                    if value.is_empty() {
                        return None;
                    }
                    path.push_str(value);
                }
                None => path.push_str(segment),
            }
        }
        Some(path)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts `/record/:recordId` into matchit's `/record/{recordId}`.
fn matchit_pattern(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Drops query and fragment, ensures a leading slash and strips one trailing slash.
fn normalize(location: &str) -> String {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = &location[..end];
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Splits the query string off a location, without its fragment.
pub fn query_of(location: &str) -> Option<&str> {
    let (_, rest) = location.split_once('?')?;
    Some(rest.split('#').next().unwrap_or(rest))
}
