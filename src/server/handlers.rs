use axum::Json;
use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::info;
use url::Url;

use super::{ApiError, AppState, MIN_URL_LENGTH};
use crate::core::VideoInfo;
use crate::utils::content_disposition;

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    url: Option<String>,
}

type UrlParam = Result<Query<UrlQuery>, QueryRejection>;

/// Malformed query strings get the same 422 JSON body as a bad `url`
fn url_param(query: UrlParam) -> Result<String, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::unprocessable(e.body_text()))?;
    validate_url(query)
}

fn validate_url(query: UrlQuery) -> Result<String, ApiError> {
    let url = query
        .url
        .ok_or_else(|| ApiError::unprocessable("query parameter `url` is required"))?;
    if url.chars().count() < MIN_URL_LENGTH {
        return Err(ApiError::unprocessable(format!(
            "query parameter `url` must be at least {MIN_URL_LENGTH} characters"
        )));
    }
    match Url::parse(&url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
        _ => Err(ApiError::unprocessable(format!("not an http(s) URL: {url}"))),
    }
}

pub async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn tiktok_info(
    State(state): State<AppState>,
    query: UrlParam,
) -> Result<Json<VideoInfo>, ApiError> {
    let url = url_param(query)?;
    let info = state.resolver.resolve(&url).await?;
    Ok(Json(info))
}

pub async fn tiktok_download(
    State(state): State<AppState>,
    query: UrlParam,
) -> Result<Response, ApiError> {
    let url = url_param(query)?;
    let meta = state.resolver.resolve(&url).await?;
    let download = state
        .materializer
        .materialize(&url, meta.filename_hint())
        .await?;

    let container = state.materializer.container();
    let (path, filename, dir) = download.into_parts();
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::internal(format!("cannot open downloaded file: {e}")))?;
    let length = file.metadata().await.ok().map(|m| m.len());

    // the directory guard rides along with the body and is released when
    // the stream is dropped, whether the transfer finished or failed
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _dir = &dir;
        chunk
    });

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(container.mime_type()));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&filename))
            .map_err(|_| ApiError::internal("cannot build Content-Disposition header"))?,
    );
    if let Some(length) = length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    }

    info!(url = %url, filename = %filename, bytes = length.unwrap_or(0), "sending download");
    Ok((headers, Body::from_stream(stream)).into_response())
}
