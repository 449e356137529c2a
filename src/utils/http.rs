// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a URL and decode its JSON body.
///
/// Fails on a non-success status or a content type that is not JSON.
pub async fn fetch_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::fetch(url, format!("status {status}")));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !content_type.contains("json") {
        return Err(AppError::fetch(
            url,
            format!("unexpected content type '{content_type}'"),
        ));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Probe a URL; `true` only for a 200 response.
pub async fn probe(client: &reqwest::Client, url: &str) -> Result<bool> {
    let response = client.get(url).send().await?;
    Ok(response.status() == reqwest::StatusCode::OK)
}
