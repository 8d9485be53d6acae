//! Page cache middleware.
//!
//! Serves fresh cached copies of GET responses and stores successful ones.
//! Mounted only on routes whose staleness is acceptable.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use metrics::counter;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::{
    METRIC_PAGE_CACHE_HIT, METRIC_PAGE_CACHE_MISS, METRIC_PAGE_CACHE_STORE, PageCacheConfig,
    keys::PageKey,
    store::{CachedPage, PageCache},
};

pub const MAX_CACHED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared cache state for the middleware and the admin surface.
#[derive(Clone)]
pub struct PageCacheState {
    pub config: PageCacheConfig,
    pub pages: Arc<PageCache>,
    /// Header carrying the signed-in username, used when varying by viewer.
    pub viewer_header: HeaderName,
}

impl PageCacheState {
    pub fn new(config: PageCacheConfig, viewer_header: HeaderName) -> Self {
        let pages = Arc::new(PageCache::new(&config));
        Self {
            config,
            pages,
            viewer_header,
        }
    }

    pub fn invalidate_all(&self) -> usize {
        self.pages.invalidate_all()
    }

    fn key_for(&self, request: &Request<Body>) -> PageKey {
        let viewer_header = self
            .config
            .vary_by_viewer
            .then_some(&self.viewer_header);
        PageKey::for_request(request.uri(), request.headers(), viewer_header)
    }
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn page_cache_layer(
    State(cache): State<PageCacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache.key_for(&request);

    if let Some(cached) = cache.pages.get(&key) {
        counter!(METRIC_PAGE_CACHE_HIT).increment(1);
        debug!(
            target = "scribe::cache",
            outcome = "hit",
            viewer = key.viewer().unwrap_or(""),
            "serving cached page"
        );
        return build_response(cached);
    }

    counter!(METRIC_PAGE_CACHE_MISS).increment(1);
    debug!(target = "scribe::cache", outcome = "miss", "rendering page");

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(
                target = "scribe::cache",
                error = %err,
                "failed to buffer response body for caching"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // The cap only bounds what is stored; oversized pages are still served.
    if bytes.len() > MAX_CACHED_BODY_BYTES {
        debug!(
            target = "scribe::cache",
            size = bytes.len(),
            "page exceeds cache entry limit, not storing"
        );
        return Response::from_parts(parts, Body::from(bytes));
    }

    let cached = CachedPage {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: bytes.clone(),
        stored_at: Instant::now(),
    };

    cache.pages.insert(key, cached);
    counter!(METRIC_PAGE_CACHE_STORE).increment(1);

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedPage) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
