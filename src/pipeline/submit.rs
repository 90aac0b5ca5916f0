//! Submission: build conversion request bodies and accept the job id.
//!
//! Both submission endpoints share the optional fields in
//! [`ConversionOptions`]. When the caller gives no output filename one is
//! derived from the source name and the target format, so the converted
//! file keeps a recognisable name.

use crate::error::ConvertHubError;
use crate::pipeline::{classify, encode};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One custom metadata pair echoed back by the API on the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// Optional fields accepted by both submission endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Custom name for the output file.
    pub output_filename: Option<String>,
    /// URL notified when the conversion completes.
    pub webhook_url: Option<String>,
    /// Quality for lossy formats, 1–100.
    pub quality: Option<u8>,
    /// Resolution for image/video output, e.g. `1920x1080`.
    pub resolution: Option<String>,
    /// Bitrate for audio/video output, e.g. `320k`.
    pub bitrate: Option<String>,
    /// Sample rate for audio output, e.g. `44100`.
    pub sample_rate: Option<u32>,
    /// Custom tracking metadata. Accepts a plain list of pairs or the
    /// host's `{ "metadataValues": [...] }` wrapper.
    #[serde(deserialize_with = "metadata_entries")]
    pub metadata: Vec<MetadataEntry>,
}

fn metadata_entries<'de, D>(deserializer: D) -> Result<Vec<MetadataEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        List(Vec<MetadataEntry>),
        Wrapped {
            #[serde(rename = "metadataValues", default)]
            metadata_values: Vec<MetadataEntry>,
        },
    }

    Ok(match Option::<Shape>::deserialize(deserializer)? {
        Some(Shape::List(entries)) => entries,
        Some(Shape::Wrapped { metadata_values }) => metadata_values,
        None => Vec::new(),
    })
}

impl ConversionOptions {
    /// Reject values the API would refuse anyway.
    pub fn validate(&self) -> Result<(), ConvertHubError> {
        if let Some(q) = self.quality {
            if !(1..=100).contains(&q) {
                return Err(ConvertHubError::InvalidInput {
                    message: format!("quality must be 1–100, got {q}"),
                    item_index: None,
                });
            }
        }
        Ok(())
    }

    /// The nested `options` object, or `None` when no option is set.
    fn options_object(&self) -> Option<Value> {
        let mut opts = Map::new();
        if let Some(q) = self.quality {
            opts.insert("quality".into(), json!(q));
        }
        if let Some(r) = non_empty(&self.resolution) {
            opts.insert("resolution".into(), json!(r));
        }
        if let Some(b) = non_empty(&self.bitrate) {
            opts.insert("bitrate".into(), json!(b));
        }
        if let Some(sr) = self.sample_rate.filter(|sr| *sr > 0) {
            opts.insert("sample_rate".into(), json!(sr));
        }
        (!opts.is_empty()).then_some(Value::Object(opts))
    }

    fn metadata_object(&self) -> Option<Value> {
        let meta: Map<String, Value> = self
            .metadata
            .iter()
            .filter(|e| !e.key.is_empty())
            .map(|e| (e.key.clone(), json!(e.value)))
            .collect();
        (!meta.is_empty()).then_some(Value::Object(meta))
    }

    /// Add the shared optional fields to a request body.
    fn apply(&self, body: &mut Map<String, Value>, output_filename: Option<&str>) {
        if let Some(name) = output_filename {
            body.insert("output_filename".into(), json!(name));
        }
        if let Some(hook) = non_empty(&self.webhook_url) {
            body.insert("webhook_url".into(), json!(hook));
        }
        if let Some(opts) = self.options_object() {
            body.insert("options".into(), opts);
        }
        if let Some(meta) = self.metadata_object() {
            body.insert("metadata".into(), meta);
        }
    }
}

/// A request body ready to submit, with the output filename it announces.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub body: Value,
    pub output_filename: Option<String>,
}

/// Body for `POST /convert/base64`.
pub fn file_submission(
    bytes: &[u8],
    source_name: Option<&str>,
    target_format: &str,
    options: &ConversionOptions,
) -> Result<Submission, ConvertHubError> {
    let target = require_target(target_format)?;
    options.validate()?;

    let source_name = source_name.filter(|n| !n.is_empty());
    let output_filename = non_empty(&options.output_filename)
        .map(str::to_string)
        .or_else(|| source_name.map(|n| replace_extension(n, target)));

    let mut body = Map::new();
    body.insert("file_base64".into(), json!(encode::encode_file(bytes)));
    body.insert("filename".into(), json!(source_name.unwrap_or("file")));
    body.insert("target_format".into(), json!(target));
    options.apply(&mut body, output_filename.as_deref());

    Ok(Submission {
        body: Value::Object(body),
        output_filename,
    })
}

/// Body for `POST /convert-url`.
pub fn url_submission(
    file_url: &str,
    target_format: &str,
    options: &ConversionOptions,
) -> Result<Submission, ConvertHubError> {
    let target = require_target(target_format)?;
    options.validate()?;
    let file_url = file_url.trim();
    if file_url.is_empty() {
        return Err(ConvertHubError::InvalidInput {
            message: "file URL must not be empty".into(),
            item_index: None,
        });
    }

    let output_filename = non_empty(&options.output_filename)
        .map(str::to_string)
        .unwrap_or_else(|| filename_from_url(file_url, target));

    let mut body = Map::new();
    body.insert("file_url".into(), json!(file_url));
    body.insert("target_format".into(), json!(target));
    options.apply(&mut body, Some(&output_filename));

    Ok(Submission {
        body: Value::Object(body),
        output_filename: Some(output_filename),
    })
}

/// Judge a submission response and return the issued job id.
///
/// `success: false` is a validation or immediate failure: it is reported
/// without polling.
pub fn accept_submission(response: &Value) -> Result<String, ConvertHubError> {
    if response.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(classify::api_failure(
            response,
            classify::REQUEST_FAILED,
            None,
            None,
        ));
    }

    response
        .get("job_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConvertHubError::InvalidResponse {
            endpoint: "convert".into(),
            detail: "response has no job_id".into(),
        })
}

static RE_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[^/.]+$").unwrap());

/// `photo.png` + `jpg` → `photo.jpg`.
pub fn replace_extension(name: &str, target_format: &str) -> String {
    let base = RE_EXTENSION.replace(name, "");
    format!("{base}.{target_format}")
}

/// Output filename for a URL source: last path segment with the target
/// extension, `file.<ext>` for an empty path, `converted.<ext>` when the URL
/// does not parse.
pub fn filename_from_url(file_url: &str, target_format: &str) -> String {
    match Url::parse(file_url) {
        Ok(url) => {
            let last = url
                .path_segments()
                .and_then(|mut s| s.next_back())
                .filter(|s| !s.is_empty())
                .unwrap_or("file");
            replace_extension(last, target_format)
        }
        Err(_) => format!("converted.{target_format}"),
    }
}

fn require_target(target_format: &str) -> Result<&str, ConvertHubError> {
    let target = target_format.trim().trim_start_matches('.');
    if target.is_empty() {
        return Err(ConvertHubError::InvalidInput {
            message: "target format must not be empty".into(),
            item_index: None,
        });
    }
    Ok(target)
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}
