//! Error types for the converthub library.
//!
//! Two shapes reflect two audiences:
//!
//! * [`ConvertHubError`]: the typed error returned by every fallible
//!   library call. Variants are grouped by where the failure happened
//!   (input, API, polling, I/O, configuration).
//!
//! * [`FailureReport`]: the single caller-facing failure a node execution
//!   surfaces: a human-readable message plus the index of the item that
//!   failed, when one is known. Every [`ConvertHubError`] converts into one.
//!
//! [`FailureKind`] classifies an error without matching on every variant:
//! deterministic API failures, transport failures and timeouts are kept
//! apart so callers can tell "the job failed" from "we stopped waiting".

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the converthub library.
#[derive(Debug, Error)]
pub enum ConvertHubError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// A required parameter was missing or malformed.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        item_index: Option<usize>,
    },

    /// The input item carries no binary data under the requested property.
    #[error("Item has no binary property '{property}'")]
    MissingBinary {
        property: String,
        item_index: Option<usize>,
    },

    // ── API errors ────────────────────────────────────────────────────────
    /// The request never reached the API (DNS, TLS, refused connection).
    #[error("Failed to connect to API: {detail}")]
    Connection {
        detail: String,
        item_index: Option<usize>,
    },

    /// The API answered with a structured error body or `success: false`.
    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
        item_index: Option<usize>,
    },

    /// The API answered with a non-2xx status and no usable error body.
    #[error("HTTP {status} from {endpoint}")]
    Http {
        endpoint: String,
        status: u16,
        item_index: Option<usize>,
    },

    /// The API returned a body that is not the JSON we expected.
    #[error("Unexpected response from {endpoint}: {detail}")]
    InvalidResponse { endpoint: String, detail: String },

    /// The credential test request was rejected.
    #[error("ConvertHub rejected the API key: {detail}")]
    AuthFailed { detail: String },

    // ── Polling errors ────────────────────────────────────────────────────
    /// The job reported `success: false`; not retried.
    #[error("{message}")]
    JobFailed {
        job_id: String,
        message: String,
        item_index: Option<usize>,
    },

    /// The attempt budget ran out before the job reached a terminal state.
    #[error("Conversion timed out after {attempts} attempts (~{waited_secs}s)")]
    Timeout {
        job_id: String,
        attempts: u32,
        waited_secs: u64,
        item_index: Option<usize>,
    },

    /// Downloading the converted bytes failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed {
        url: String,
        reason: String,
        item_index: Option<usize>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read the input file.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ConvertHubError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureKind {
    /// Deterministic failure reported by the API. Retrying will not help.
    Api,
    /// The job never reached a terminal state within the poll budget.
    Timeout,
    /// The network or the download failed.
    Transport,
    /// The caller supplied something unusable.
    Input,
    /// Configuration, local I/O or a bug.
    Internal,
}

impl ConvertHubError {
    /// Classify this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Api { .. } | Self::JobFailed { .. } | Self::AuthFailed { .. } => FailureKind::Api,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Connection { .. }
            | Self::Http { .. }
            | Self::DownloadFailed { .. }
            | Self::InvalidResponse { .. } => FailureKind::Transport,
            Self::FileNotFound { .. } | Self::InvalidInput { .. } | Self::MissingBinary { .. } => {
                FailureKind::Input
            }
            Self::InputReadFailed { .. }
            | Self::OutputWriteFailed { .. }
            | Self::InvalidConfig(_)
            | Self::Internal(_) => FailureKind::Internal,
        }
    }

    /// Index of the input item this error belongs to, when known.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::InvalidInput { item_index, .. }
            | Self::MissingBinary { item_index, .. }
            | Self::Connection { item_index, .. }
            | Self::Http { item_index, .. }
            | Self::Api { item_index, .. }
            | Self::JobFailed { item_index, .. }
            | Self::Timeout { item_index, .. }
            | Self::DownloadFailed { item_index, .. } => *item_index,
            _ => None,
        }
    }

    /// Attach an item index to variants that carry one and do not have it yet.
    pub fn at_item(mut self, index: usize) -> Self {
        match &mut self {
            Self::InvalidInput { item_index, .. }
            | Self::MissingBinary { item_index, .. }
            | Self::Connection { item_index, .. }
            | Self::Http { item_index, .. }
            | Self::Api { item_index, .. }
            | Self::JobFailed { item_index, .. }
            | Self::Timeout { item_index, .. }
            | Self::DownloadFailed { item_index, .. } => {
                item_index.get_or_insert(index);
            }
            _ => {}
        }
        self
    }

    /// True for failures the poll loop produced itself and must propagate
    /// untouched.
    pub(crate) fn is_conversion_failure(&self) -> bool {
        matches!(self, Self::JobFailed { .. } | Self::Api { .. })
    }
}

/// The single failure a node execution reports to its host.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("{message}")]
pub struct FailureReport {
    /// Human-readable message, already extracted from any API error body.
    pub message: String,
    /// Index of the failing input item, when known.
    pub item_index: Option<usize>,
    /// What kind of failure this was.
    pub kind: FailureKind,
}

impl From<ConvertHubError> for FailureReport {
    fn from(err: ConvertHubError) -> Self {
        Self {
            message: err.to_string(),
            item_index: err.item_index(),
            kind: err.failure_kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_mentions_attempts() {
        let e = ConvertHubError::Timeout {
            job_id: "job_1".into(),
            attempts: 150,
            waited_secs: 300,
            item_index: None,
        };
        let msg = e.to_string();
        assert!(msg.contains("150 attempts"), "got: {msg}");
        assert!(msg.contains("timed out"), "got: {msg}");
        assert_eq!(e.failure_kind(), FailureKind::Timeout);
    }

    #[test]
    fn job_failed_displays_bare_message() {
        let e = ConvertHubError::JobFailed {
            job_id: "job_1".into(),
            message: "corrupt file".into(),
            item_index: Some(2),
        };
        assert_eq!(e.to_string(), "corrupt file");
        assert_eq!(e.failure_kind(), FailureKind::Api);
    }

    #[test]
    fn at_item_keeps_existing_index() {
        let e = ConvertHubError::Api {
            message: "bad".into(),
            status: Some(422),
            item_index: Some(1),
        }
        .at_item(5);
        assert_eq!(e.item_index(), Some(1));

        let e = ConvertHubError::Connection {
            detail: "refused".into(),
            item_index: None,
        }
        .at_item(5);
        assert_eq!(e.item_index(), Some(5));
    }

    #[test]
    fn config_errors_have_no_item() {
        let e = ConvertHubError::InvalidConfig("x".into()).at_item(3);
        assert_eq!(e.item_index(), None);
        assert_eq!(e.failure_kind(), FailureKind::Internal);
    }

    #[test]
    fn failure_report_from_error() {
        let report: FailureReport = ConvertHubError::Connection {
            detail: "dns".into(),
            item_index: Some(0),
        }
        .into();
        assert_eq!(report.message, "Failed to connect to API: dns");
        assert_eq!(report.item_index, Some(0));
        assert_eq!(report.kind, FailureKind::Transport);
    }
}
