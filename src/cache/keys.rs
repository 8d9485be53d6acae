use axum::http::{HeaderMap, HeaderName, Uri};

/// Identity of a cached page: the URL and, optionally, who is looking at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    path: String,
    query: String,
    viewer: Option<String>,
}

impl PageKey {
    pub fn new(path: impl Into<String>, query: impl Into<String>, viewer: Option<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
            viewer,
        }
    }

    /// Build the key for a request. `viewer_header` is only consulted when
    /// the cache varies by viewer.
    pub fn for_request(uri: &Uri, headers: &HeaderMap, viewer_header: Option<&HeaderName>) -> Self {
        let viewer = viewer_header
            .and_then(|name| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Self::new(uri.path(), uri.query().unwrap_or(""), viewer)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref()
    }
}
