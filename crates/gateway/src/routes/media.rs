//! Uploaded media proxy.
//!
//! Product images live on the upstream API host. Proxying them keeps the
//! storefront same-origin and streams bytes through without buffering.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Stream an uploaded file from upstream.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    if !is_safe_upload_path(&path) {
        return Err(AppError::BadRequest(format!("Invalid media path: {path}")));
    }

    let upstream = state
        .upstream()
        .fetch_media(&path)
        .await
        .map_err(|e| AppError::upstream("Failed to fetch media from upstream API", e))?;

    let mut response = Response::builder().status(upstream.status());
    // Content headers only; cookies and upstream server details stay behind.
    for name in [
        header::CONTENT_TYPE,
        header::CONTENT_LENGTH,
        header::CACHE_CONTROL,
        header::ETAG,
        header::LAST_MODIFIED,
    ] {
        if let Some(value) = upstream.headers().get(&name) {
            response = response.header(name, value.clone());
        }
    }

    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::Internal(format!("failed to build media response: {e}")))
}

/// Reject traversal and anything that would change the meaning of the
/// upstream URL once joined.
fn is_safe_upload_path(path: &str) -> bool {
    !path.is_empty()
        && !path
            .chars()
            .any(|c| matches!(c, '?' | '#' | '%' | '\\') || c.is_control())
        && path
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."))
}
