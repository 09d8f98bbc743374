use serde::Deserialize;

use super::coordinator::{Clock, FetchError};
use crate::models::search::{SearchRequest, SearchResult};

/// Monotonic clock backed by `performance.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> u64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() as u64)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Fetch one page from `GET /search`.
pub async fn fetch_page(request: &SearchRequest) -> Result<SearchResult, FetchError> {
    let url = format!("/search?{}", request.to_query_string());
    let response = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = response.status();
    if response.ok() {
        return response
            .json::<SearchResult>()
            .await
            .map_err(|e| FetchError::Transport(format!("Malformed search response: {e}")));
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("HTTP {status}"));

    Err(match status {
        503 => FetchError::Unavailable(message),
        400..=499 => FetchError::Rejected(message),
        _ => FetchError::Transport(message),
    })
}
