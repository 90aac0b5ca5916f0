//! HTTP client for the ConvertHub v2 REST API.
//!
//! One method per endpoint. Every API call carries the bearer credential
//! and `Accept: application/json`; the pre-signed download URL is fetched
//! without credentials.
//!
//! Response handling is uniform: a body that parses as JSON is returned as
//! a [`serde_json::Value`]. A non-2xx response becomes
//! [`ConvertHubError::Api`] when its body carries error fields, otherwise
//! [`ConvertHubError::Http`]. Submission endpoints return the body whatever
//! the status so the caller can judge its `success` flag.

use crate::config::ClientConfig;
use crate::credentials::TEST_ENDPOINT;
use crate::error::ConvertHubError;
use crate::pipeline::classify;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Client for the ConvertHub API.
#[derive(Debug, Clone)]
pub struct ConvertHubClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ConvertHubClient {
    /// Build a client with its own connection pool.
    pub fn new(config: ClientConfig) -> Result<Self, ConvertHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConvertHubError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// `POST /convert/base64`: submit an uploaded file.
    pub async fn submit_base64(&self, body: &Value) -> Result<Value, ConvertHubError> {
        self.submit(&["convert", "base64"], body).await
    }

    /// `POST /convert-url`: submit a remote file by URL.
    pub async fn submit_url(&self, body: &Value) -> Result<Value, ConvertHubError> {
        self.submit(&["convert-url"], body).await
    }

    /// `GET /jobs/{id}`: current job status.
    pub async fn job_status(&self, job_id: &str) -> Result<Value, ConvertHubError> {
        let id = require_job_id(job_id)?;
        self.call(Method::GET, &["jobs", id]).await
    }

    /// `GET /jobs/{id}/download`: resolve the download locator.
    pub async fn download_url(&self, job_id: &str) -> Result<Value, ConvertHubError> {
        let id = require_job_id(job_id)?;
        self.call(Method::GET, &["jobs", id, "download"]).await
    }

    /// `DELETE /jobs/{id}`: cancel a queued or running job.
    pub async fn cancel_job(&self, job_id: &str) -> Result<Value, ConvertHubError> {
        let id = require_job_id(job_id)?;
        self.call(Method::DELETE, &["jobs", id]).await
    }

    /// `DELETE /jobs/{id}/destroy`: delete a finished conversion's file.
    pub async fn delete_conversion(&self, job_id: &str) -> Result<Value, ConvertHubError> {
        let id = require_job_id(job_id)?;
        self.call(Method::DELETE, &["jobs", id, "destroy"]).await
    }

    // ── Formats ──────────────────────────────────────────────────────────

    /// `GET /formats`
    pub async fn formats(&self) -> Result<Value, ConvertHubError> {
        self.call(Method::GET, &["formats"]).await
    }

    /// `GET /formats/{format}/conversions`
    pub async fn format_conversions(&self, format: &str) -> Result<Value, ConvertHubError> {
        let format = require_param("format", format)?;
        self.call(Method::GET, &["formats", format, "conversions"]).await
    }

    /// `GET /formats/{source}/to/{target}`
    pub async fn check_conversion_support(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Value, ConvertHubError> {
        let source = require_param("source format", source)?;
        let target = require_param("target format", target)?;
        self.call(Method::GET, &["formats", source, "to", target]).await
    }

    /// `GET /formats/supported-conversions`
    pub async fn supported_conversions(&self) -> Result<Value, ConvertHubError> {
        self.call(Method::GET, &["formats", "supported-conversions"]).await
    }

    // ── Account ──────────────────────────────────────────────────────────

    /// `GET /account`
    pub async fn account(&self) -> Result<Value, ConvertHubError> {
        self.call(Method::GET, &["account"]).await
    }

    /// Check that the configured key is accepted.
    pub async fn verify_credentials(&self) -> Result<(), ConvertHubError> {
        match self.call(Method::GET, &[TEST_ENDPOINT]).await {
            Ok(_) => Ok(()),
            Err(ConvertHubError::Api {
                message,
                status: Some(401 | 403),
                ..
            }) => Err(ConvertHubError::AuthFailed { detail: message }),
            Err(ConvertHubError::Http {
                status: status @ (401 | 403),
                ..
            }) => Err(ConvertHubError::AuthFailed {
                detail: format!("HTTP {status} (key {})", self.config.credentials.hint()),
            }),
            Err(e) => Err(e),
        }
    }

    // ── Download ─────────────────────────────────────────────────────────

    /// Fetch the converted bytes from a pre-signed URL.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ConvertHubError> {
        let failed = |reason: String| ConvertHubError::DownloadFailed {
            url: url.to_string(),
            reason,
            item_index: None,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn url(&self, segments: &[&str]) -> Result<Url, ConvertHubError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ConvertHubError::InvalidConfig(format!("Invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ConvertHubError::InvalidConfig("Base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, self.config.credentials.bearer())
    }

    async fn call(&self, method: Method, segments: &[&str]) -> Result<Value, ConvertHubError> {
        let url = self.url(segments)?;
        debug!("{} {}", method, url);
        let response = self
            .request(method, url.clone())
            .send()
            .await
            .map_err(connection_error)?;
        read_json(url.as_str(), response, false).await
    }

    async fn submit(&self, segments: &[&str], body: &Value) -> Result<Value, ConvertHubError> {
        let url = self.url(segments)?;
        debug!("POST {}", url);
        let response = self
            .request(Method::POST, url.clone())
            .json(body)
            .send()
            .await
            .map_err(connection_error)?;
        read_json(url.as_str(), response, true).await
    }
}

fn connection_error(e: reqwest::Error) -> ConvertHubError {
    ConvertHubError::Connection {
        detail: e.to_string(),
        item_index: None,
    }
}

/// Read a JSON body, turning non-2xx statuses into typed errors.
///
/// With `keep_error_status`, a non-2xx body that parses as JSON and carries
/// a `success` flag is handed back to the caller instead.
async fn read_json(
    endpoint: &str,
    response: reqwest::Response,
    keep_error_status: bool,
) -> Result<Value, ConvertHubError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| ConvertHubError::Connection {
        detail: e.to_string(),
        item_index: None,
    })?;
    let parsed: Option<Value> = serde_json::from_str(&text).ok();

    if status.is_success() {
        return parsed.ok_or_else(|| ConvertHubError::InvalidResponse {
            endpoint: endpoint.to_string(),
            detail: format!("body is not JSON ({} bytes)", text.len()),
        });
    }

    match parsed {
        Some(body) if keep_error_status && body.get("success").is_some() => Ok(body),
        Some(body) if classify::has_error_fields(&body) => Err(ConvertHubError::Api {
            message: classify::extract_error_message(&body)
                .unwrap_or_else(|| classify::UNKNOWN_ERROR.to_string()),
            status: Some(status.as_u16()),
            item_index: None,
        }),
        _ => Err(http_error(endpoint, status)),
    }
}

fn http_error(endpoint: &str, status: StatusCode) -> ConvertHubError {
    ConvertHubError::Http {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        item_index: None,
    }
}

fn require_job_id(job_id: &str) -> Result<&str, ConvertHubError> {
    require_param("job ID", job_id)
}

fn require_param<'a>(name: &str, value: &'a str) -> Result<&'a str, ConvertHubError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConvertHubError::InvalidInput {
            message: format!("{name} must not be empty"),
            item_index: None,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ConvertHubClient {
        let config = ClientConfig::builder()
            .api_key("k")
            .base_url(base)
            .build()
            .unwrap();
        ConvertHubClient::new(config).unwrap()
    }

    #[test]
    fn url_appends_segments_under_versioned_root() {
        let c = client("https://api.converthub.com/v2");
        let url = c.url(&["jobs", "job_1", "download"]).unwrap();
        assert_eq!(url.as_str(), "https://api.converthub.com/v2/jobs/job_1/download");
    }

    #[test]
    fn url_on_bare_host() {
        let c = client("http://127.0.0.1:9000");
        let url = c.url(&["formats", "png", "to", "jpg"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/formats/png/to/jpg");
    }

    #[test]
    fn url_escapes_job_id() {
        let c = client("http://127.0.0.1:9000");
        let url = c.url(&["jobs", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/jobs/a%2Fb%20c");
    }

    #[test]
    fn empty_job_id_rejected() {
        let err = require_job_id("  ").unwrap_err();
        assert!(matches!(err, ConvertHubError::InvalidInput { .. }));
        assert_eq!(require_job_id(" job_1 ").unwrap(), "job_1");
    }
}
