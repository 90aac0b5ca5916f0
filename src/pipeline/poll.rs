//! Job completion polling.
//!
//! A polling session drives one job from "submitted" to a terminal state:
//!
//! ```text
//!            ┌──────────── in progress / transient error ────────────┐
//!            ▼                                                       │
//!  GET /jobs/{id} ──▶ success && completed ──▶ GET /jobs/{id}/download ──▶ fetch bytes ──▶ Ok
//!            │                                                                   │
//!            │                                                                   └──▶ Err(DownloadFailed)
//!            ├──▶ success == false ─────────────────────────────────────────────────────▶ Err(JobFailed)
//!            ├──▶ HTTP error with structured body ─────────────────────────────────────▶ Err(Api)
//!            └──▶ attempt budget exhausted ────────────────────────────────────────────▶ Err(Timeout)
//! ```
//!
//! The `success` flag decides. The status label is only trusted as a
//! second condition for completion; a job that reports `success: false` is
//! failed whatever its label says, and one that reports anything else keeps
//! being polled.
//!
//! Errors that say nothing about the job, such as a refused connection or a
//! 502 with an HTML body, are logged and the loop carries on.
//!
//! Once the job reports completion the session ends on that attempt. A
//! completion without a `download_url` returns the metadata alone, and a
//! failed byte fetch is reported as [`ConvertHubError::DownloadFailed`].

use crate::client::ConvertHubClient;
use crate::error::ConvertHubError;
use crate::output::{AttemptOutcome, ConversionJob, ConversionResult, PollAttempt};
use crate::pipeline::{classify, download};
use serde_json::{Map, Value};
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Default label for the attached file.
pub const DEFAULT_BINARY_PROPERTY: &str = "data";

/// What to poll and what to do with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    /// Job id issued at submission.
    pub job_id: String,
    /// Fetch the converted bytes once the job completes.
    pub download: bool,
    /// Label the file is attached under.
    pub binary_property: String,
    /// Input item this session belongs to, for error attribution.
    pub item_index: Option<usize>,
    /// Output filename announced at submission, if any.
    pub expected_filename: Option<String>,
}

impl PollRequest {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            download: true,
            binary_property: DEFAULT_BINARY_PROPERTY.to_string(),
            item_index: None,
            expected_filename: None,
        }
    }

    pub fn download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    pub fn binary_property(mut self, name: impl Into<String>) -> Self {
        self.binary_property = name.into();
        self
    }

    pub fn item_index(mut self, index: usize) -> Self {
        self.item_index = Some(index);
        self
    }

    pub fn expected_filename(mut self, name: Option<String>) -> Self {
        self.expected_filename = name;
        self
    }
}

/// Poll a job until it completes, fails, or the attempt budget runs out.
///
/// Issues one status request per attempt, sleeping
/// [`crate::config::PollPolicy::interval`] between attempts. On completion
/// resolves the download locator and, if requested, fetches the file.
///
/// # Errors
/// - [`ConvertHubError::JobFailed`]: the job reported `success: false`
/// - [`ConvertHubError::Api`]: a status call returned a structured error body
/// - [`ConvertHubError::DownloadFailed`]: the job completed but its file could not be fetched
/// - [`ConvertHubError::Timeout`]: no terminal state within the budget
/// - [`ConvertHubError::InvalidInput`]: empty job id
pub async fn poll_for_completion(
    client: &ConvertHubClient,
    request: &PollRequest,
) -> Result<ConversionResult, ConvertHubError> {
    let job_id = request.job_id.trim();
    if job_id.is_empty() {
        return Err(ConvertHubError::InvalidInput {
            message: "job ID must not be empty".into(),
            item_index: request.item_index,
        });
    }

    let policy = client.config().poll;
    let callback = client.config().progress_callback.as_deref();
    let start = Instant::now();

    for attempt in 1..=policy.max_attempts {
        let result = check_once(client, job_id, request, attempt).await;

        let outcome = match &result {
            Ok(Some(_)) => AttemptOutcome::Success,
            Ok(None) => AttemptOutcome::InProgress,
            Err(e) if is_terminal(e) => AttemptOutcome::TerminalError(e.to_string()),
            Err(e) => AttemptOutcome::TransientError(e.to_string()),
        };
        if let Some(cb) = callback {
            cb.on_attempt(&PollAttempt {
                index: attempt,
                elapsed: start.elapsed(),
                outcome: outcome.clone(),
            });
        }

        match result {
            Ok(Some(done)) => {
                info!("Job {} completed after {} attempt(s)", job_id, attempt);
                if let Some(cb) = callback {
                    cb.on_completed(job_id, attempt);
                }
                return Ok(done);
            }
            Ok(None) => debug!("Job {}: attempt {}/{} still in progress", job_id, attempt, policy.max_attempts),
            Err(e) if is_terminal(&e) => {
                warn!("Job {} failed: {}", job_id, e);
                if let Some(cb) = callback {
                    cb.on_failed(job_id, &e.to_string());
                }
                return Err(attribute(e, request.item_index));
            }
            Err(e) => warn!("Job {}: attempt {} failed, will retry: {}", job_id, attempt, e),
        }

        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }

    let err = ConvertHubError::Timeout {
        job_id: job_id.to_string(),
        attempts: policy.max_attempts,
        waited_secs: policy.budget().as_secs(),
        item_index: request.item_index,
    };
    warn!("Job {}: {}", job_id, err);
    if let Some(cb) = callback {
        cb.on_failed(job_id, &err.to_string());
    }
    Err(err)
}

/// One attempt: `Ok(Some)` when done, `Ok(None)` to keep polling.
async fn check_once(
    client: &ConvertHubClient,
    job_id: &str,
    request: &PollRequest,
    attempt: u32,
) -> Result<Option<ConversionResult>, ConvertHubError> {
    let status = client.job_status(job_id).await?;
    let job = ConversionJob::from_json(&status);
    debug!("Job {}: success={:?} status='{}'", job_id, job.success, job.status);

    if job.is_completed() {
        let located = client.download_url(job_id).await?;
        let download_url = located
            .get("download_url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        let mut json = match status {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let file = match download_url.as_deref() {
            Some(url) => {
                json.insert("download_url".into(), Value::String(url.to_string()));
                if request.download {
                    let filename = download::resolve_output_filename(
                        request.expected_filename.as_deref(),
                        job.output_filename.as_deref(),
                        url,
                    );
                    Some(download::materialize(client, url, filename).await?)
                } else {
                    None
                }
            }
            None => {
                warn!("Job {} completed without a download_url; returning metadata only", job_id);
                None
            }
        };

        return Ok(Some(ConversionResult {
            json,
            download_url,
            binary_property: request.binary_property.clone(),
            file,
            attempts: attempt,
        }));
    }

    if job.is_failed() {
        return Err(classify::job_failure(job_id, job.error.as_ref(), request.item_index));
    }

    Ok(None)
}

/// Failures that end the session immediately.
///
/// A failed byte fetch only happens after the job reported completion, so
/// it ends the session too.
fn is_terminal(err: &ConvertHubError) -> bool {
    err.is_conversion_failure()
        || matches!(
            err,
            ConvertHubError::InvalidInput { .. } | ConvertHubError::DownloadFailed { .. }
        )
}

fn attribute(err: ConvertHubError, item_index: Option<usize>) -> ConvertHubError {
    match item_index {
        Some(i) => err.at_item(i),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let r = PollRequest::new("job_1");
        assert!(r.download);
        assert_eq!(r.binary_property, "data");
        assert_eq!(r.item_index, None);
        assert_eq!(r.expected_filename, None);
    }

    #[test]
    fn request_builder() {
        let r = PollRequest::new("job_1")
            .download(false)
            .binary_property("converted")
            .item_index(3)
            .expected_filename(Some("out.pdf".into()));
        assert!(!r.download);
        assert_eq!(r.binary_property, "converted");
        assert_eq!(r.item_index, Some(3));
        assert_eq!(r.expected_filename.as_deref(), Some("out.pdf"));
    }

    #[test]
    fn terminal_classification() {
        assert!(is_terminal(&ConvertHubError::JobFailed {
            job_id: "j".into(),
            message: "m".into(),
            item_index: None,
        }));
        assert!(is_terminal(&ConvertHubError::Api {
            message: "m".into(),
            status: Some(404),
            item_index: None,
        }));
        assert!(!is_terminal(&ConvertHubError::Connection {
            detail: "refused".into(),
            item_index: None,
        }));
        assert!(!is_terminal(&ConvertHubError::Http {
            endpoint: "jobs/j".into(),
            status: 502,
            item_index: None,
        }));
        assert!(is_terminal(&ConvertHubError::DownloadFailed {
            url: "u".into(),
            reason: "HTTP 403 Forbidden".into(),
            item_index: None,
        }));
    }

    #[tokio::test]
    async fn empty_job_id_fails_without_network() {
        let config = crate::ClientConfig::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = ConvertHubClient::new(config).unwrap();
        let err = poll_for_completion(&client, &PollRequest::new(" ").item_index(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertHubError::InvalidInput { item_index: Some(2), .. }));
    }
}
