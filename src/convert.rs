//! High-level conversion entry points.
//!
//! [`convert`] submits a source, polls the job to completion, and returns
//! the converted file in memory. [`convert_to_file`] does the same and
//! writes the file to disk. [`submit`] stops after submission, for callers
//! that poll on their own schedule or rely on a webhook.

use crate::client::ConvertHubClient;
use crate::error::ConvertHubError;
use crate::output::ConversionResult;
use crate::pipeline::download;
use crate::pipeline::poll::{self, PollRequest};
use crate::pipeline::submit::{self, ConversionOptions, Submission};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// What to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionSource {
    /// A local file, uploaded inline.
    File(PathBuf),
    /// A remote file ConvertHub fetches itself.
    Url(String),
    /// Bytes already in memory, with their original name if known.
    Bytes {
        data: Vec<u8>,
        file_name: Option<String>,
    },
}

impl ConversionSource {
    /// Treat `http://` and `https://` inputs as URLs, anything else as a path.
    pub fn parse(input: &str) -> Self {
        if is_url(input) {
            Self::Url(input.to_string())
        } else {
            Self::File(PathBuf::from(input))
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// A job accepted by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: String,
    /// Output filename announced in the request, if any.
    pub output_filename: Option<String>,
}

/// Submit a conversion and return the issued job id without polling.
///
/// # Errors
/// - [`ConvertHubError::FileNotFound`] / [`ConvertHubError::InputReadFailed`] for local files
/// - [`ConvertHubError::Connection`] when the API cannot be reached
/// - [`ConvertHubError::Api`] when the API rejects the request (`success: false`)
pub async fn submit(
    client: &ConvertHubClient,
    source: &ConversionSource,
    target_format: &str,
    options: &ConversionOptions,
) -> Result<SubmittedJob, ConvertHubError> {
    let (submission, response) = match source {
        ConversionSource::Url(url) => {
            let sub = submit::url_submission(url, target_format, options)?;
            let resp = client.submit_url(&sub.body).await?;
            (sub, resp)
        }
        ConversionSource::File(path) => {
            let bytes = read_input(path).await?;
            let name = path.file_name().and_then(|n| n.to_str());
            let sub = submit::file_submission(&bytes, name, target_format, options)?;
            let resp = client.submit_base64(&sub.body).await?;
            (sub, resp)
        }
        ConversionSource::Bytes { data, file_name } => {
            let sub = submit::file_submission(data, file_name.as_deref(), target_format, options)?;
            let resp = client.submit_base64(&sub.body).await?;
            (sub, resp)
        }
    };

    let job_id = submit::accept_submission(&response)?;
    info!("Submitted conversion to {}: job {}", target_format, job_id);
    if let Some(ref cb) = client.config().progress_callback {
        cb.on_submitted(&job_id);
    }

    let Submission {
        output_filename, ..
    } = submission;
    Ok(SubmittedJob {
        job_id,
        output_filename,
    })
}

/// Convert a source and return the result with the file attached.
pub async fn convert(
    client: &ConvertHubClient,
    source: &ConversionSource,
    target_format: &str,
    options: &ConversionOptions,
) -> Result<ConversionResult, ConvertHubError> {
    let job = submit(client, source, target_format, options).await?;
    let request = PollRequest::new(job.job_id).expected_filename(job.output_filename);
    poll::poll_for_completion(client, &request).await
}

/// Convert a source and write the converted file to disk.
///
/// If `output` is an existing directory the file is written inside it under
/// its resolved name. Uses atomic write (temp file + rename) to prevent
/// partial files.
pub async fn convert_to_file(
    client: &ConvertHubClient,
    source: &ConversionSource,
    target_format: &str,
    options: &ConversionOptions,
    output: impl AsRef<Path>,
) -> Result<(PathBuf, ConversionResult), ConvertHubError> {
    let result = convert(client, source, target_format, options).await?;
    let file = result.file.as_ref().ok_or_else(|| ConvertHubError::InvalidResponse {
        endpoint: "jobs/{id}/download".into(),
        detail: "job completed without a download_url".into(),
    })?;

    let output = output.as_ref();
    let path = if output.is_dir() {
        output.join(local_file_name(&file.file_name))
    } else {
        output.to_path_buf()
    };
    write_atomic(&path, &file.data)?;
    info!("Wrote {} ({} bytes)", path.display(), file.data.len());

    Ok((path, result))
}

/// Final path component of a server- or caller-supplied name.
///
/// Directory parts and `..` are dropped so the file always lands inside the
/// output directory.
fn local_file_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(download::FALLBACK_FILENAME)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    client: &ConvertHubClient,
    source: &ConversionSource,
    target_format: &str,
    options: &ConversionOptions,
) -> Result<ConversionResult, ConvertHubError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertHubError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(client, source, target_format, options))
}

/// Write `data` next to `path` in a temp file, then rename over `path`.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ConvertHubError> {
    let write_err = |source| ConvertHubError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(data).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

async fn read_input(path: &Path) -> Result<Vec<u8>, ConvertHubError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConvertHubError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ConvertHubError::InputReadFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}
