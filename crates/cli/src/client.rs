//! HTTP client for the StockFlow API.

use anyhow::{anyhow, bail, Context};
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::cli::ApiCall;

pub const API_KEY_HEADER: &str = "api-key";
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// A non-success answer, decoded from the server's `{error, message}` body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status} {code}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    server: Url,
    api_key: String,
    timeout_ms: Option<u64>,
}

impl ApiClient {
    pub fn new(server: &str, api_key: &str) -> anyhow::Result<Self> {
        if api_key.is_empty() {
            bail!("an API key is required (--api-key)");
        }
        let server = Url::parse(server).with_context(|| format!("invalid server url {server:?}"))?;
        if server.cannot_be_a_base() {
            bail!("server url {server} cannot carry a path");
        }
        Ok(Self {
            http: reqwest::Client::new(),
            server,
            api_key: api_key.to_string(),
            timeout_ms: None,
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Send one call and return the decoded JSON body.
    ///
    /// Error statuses come back as an [`ApiError`] inside the `anyhow` error.
    pub async fn send(&self, call: &ApiCall) -> anyhow::Result<Value> {
        let mut url = self.server.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("server url cannot carry a path"))?
            .pop_if_empty()
            .extend(&call.path);

        let mut req = self
            .http
            .request(call.method.clone(), url)
            .header(API_KEY_HEADER, &self.api_key);
        if !call.query.is_empty() {
            req = req.query(&call.query);
        }
        if let Some(ms) = self.timeout_ms {
            req = req.header(REQUEST_TIMEOUT_HEADER, ms.to_string());
        }
        if let Some(body) = &call.body {
            req = req.json(body);
        }

        tracing::debug!(method = %call.method, path = ?call.path, "sending request");
        let resp = req.send().await.context("request failed")?;
        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("response with status {status} is not JSON"))?;

        if status.is_success() {
            return Ok(body);
        }
        Err(ApiError {
            status: status.as_u16(),
            code: body["error"].as_str().unwrap_or_default().to_string(),
            message: body["message"].as_str().unwrap_or_default().to_string(),
        }
        .into())
    }
}
