//! Output types: job snapshots, poll attempts, and conversion results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Lifecycle label reported by the status endpoint.
///
/// The label is informational only. The API has been observed to report a
/// stale label next to an accurate `success` flag, so completion and failure
/// are decided from [`ConversionJob::success`] first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    /// Label absent from the payload.
    #[default]
    Missing,
    /// Any label this crate does not know about.
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Missing => "",
            JobStatus::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "" => JobStatus::Missing,
            _ => JobStatus::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(s: JobStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error detail attached to a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// A snapshot of a job as reported by `GET /jobs/{id}`.
///
/// Parsed leniently from the raw payload: fields with an unexpected type
/// are treated as absent rather than failing the whole response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionJob {
    pub job_id: Option<String>,
    /// Authoritative outcome flag. `None` when the payload omits it.
    pub success: Option<bool>,
    pub status: JobStatus,
    /// Raw `error` field: an object with `code`/`message`, or a string.
    pub error: Option<Value>,
    pub output_filename: Option<String>,
    pub download_url: Option<String>,
}

impl ConversionJob {
    pub fn from_json(value: &Value) -> Self {
        let str_field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            job_id: str_field("job_id"),
            success: value.get("success").and_then(Value::as_bool),
            status: str_field("status").map(JobStatus::from).unwrap_or_default(),
            error: value.get("error").filter(|e| !e.is_null()).cloned(),
            output_filename: str_field("output_filename"),
            download_url: str_field("download_url"),
        }
    }

    /// `success == true` and the label agrees the job is done.
    pub fn is_completed(&self) -> bool {
        self.success == Some(true) && self.status == JobStatus::Completed
    }

    /// `success == false`, whatever the label says.
    pub fn is_failed(&self) -> bool {
        self.success == Some(false)
    }

    /// The `error` field as a structured detail, when it is an object.
    pub fn error_detail(&self) -> Option<ErrorDetail> {
        let obj = self.error.as_ref()?.as_object()?;
        let field = |k: &str| obj.get(k).and_then(Value::as_str).map(str::to_string);
        Some(ErrorDetail {
            code: field("code"),
            message: field("message"),
        })
    }
}

/// What a single status request told us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttemptOutcome {
    /// The job completed on this attempt.
    Success,
    /// Queued, processing, or no decisive signal yet.
    InProgress,
    /// The status request itself failed; polling continues.
    TransientError(String),
    /// The job or the API reported a deterministic failure.
    TerminalError(String),
}

/// One status request within a polling session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollAttempt {
    /// 1-indexed attempt number.
    pub index: u32,
    /// Time since the session started.
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

/// A file attached to a result or an input item.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryData {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    pub file_extension: Option<String>,
    #[serde(default)]
    pub file_size: usize,
}

impl BinaryData {
    /// Wrap raw bytes, inferring extension and MIME type from the filename.
    pub fn new(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let file_extension = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let mime_type = mime_for_extension(file_extension.as_deref()).to_string();
        Self {
            file_size: data.len(),
            data,
            file_name,
            mime_type,
            file_extension,
        }
    }
}

impl fmt::Debug for BinaryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryData")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("file_size", &self.data.len())
            .finish()
    }
}

/// Terminal artifact of a successful polling session.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    /// Status payload merged with the resolved `download_url`.
    pub json: Map<String, Value>,
    /// Pre-signed locator of the converted file.
    pub download_url: Option<String>,
    /// Label under which [`Self::file`] is attached.
    pub binary_property: String,
    /// The converted bytes, when materialisation was requested.
    pub file: Option<BinaryData>,
    /// Number of status requests the session needed.
    pub attempts: u32,
}

fn mime_for_extension(ext: Option<&str>) -> &'static str {
    match ext.unwrap_or_default() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "md" => "text/markdown",
        "json" => "application/json",
        "xml" => "application/xml",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        "epub" => "application/epub+zip",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_completed_job() {
        let job = ConversionJob::from_json(&json!({
            "success": true,
            "job_id": "job_1",
            "status": "completed",
            "output_filename": "x.pdf"
        }));
        assert!(job.is_completed());
        assert!(!job.is_failed());
        assert_eq!(job.output_filename.as_deref(), Some("x.pdf"));
    }

    #[test]
    fn success_flag_wins_over_label() {
        let job = ConversionJob::from_json(&json!({
            "success": false,
            "status": "completed",
            "error": {"code": "E1", "message": "corrupt file"}
        }));
        assert!(job.is_failed());
        assert!(!job.is_completed());
        let detail = job.error_detail().unwrap();
        assert_eq!(detail.code.as_deref(), Some("E1"));
        assert_eq!(detail.message.as_deref(), Some("corrupt file"));
    }

    #[test]
    fn lenient_field_types() {
        let job = ConversionJob::from_json(&json!({
            "success": "yes",
            "status": 3,
            "output_filename": "",
            "error": null
        }));
        assert_eq!(job.success, None);
        assert_eq!(job.status, JobStatus::Missing);
        assert_eq!(job.output_filename, None);
        assert_eq!(job.error, None);
    }

    #[test]
    fn unknown_status_preserved() {
        assert_eq!(
            JobStatus::from("uploading".to_string()),
            JobStatus::Other("uploading".into())
        );
        assert_eq!(JobStatus::Other("uploading".into()).to_string(), "uploading");
    }

    #[test]
    fn binary_data_infers_mime() {
        let b = BinaryData::new(vec![1, 2, 3], "Report.PDF");
        assert_eq!(b.mime_type, "application/pdf");
        assert_eq!(b.file_extension.as_deref(), Some("pdf"));
        assert_eq!(b.file_size, 3);

        let b = BinaryData::new(vec![], "converted-file");
        assert_eq!(b.mime_type, "application/octet-stream");
        assert_eq!(b.file_extension, None);
    }
}
