//! Resources, operations, and their parameters.
//!
//! The host hands the node a `resource` and an `operation` name plus a bag
//! of parameters per item. [`Operation::from_parameters`] turns that bag
//! into a typed operation; [`OperationKind`] carries the catalog metadata
//! the host displays.

use crate::error::ConvertHubError;
use crate::pipeline::submit::ConversionOptions;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Top-level API area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Conversion,
    Formats,
    Account,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Conversion, Resource::Formats, Resource::Account];

    /// Identifier used in parameters.
    pub fn value(self) -> &'static str {
        match self {
            Resource::Conversion => "conversion",
            Resource::Formats => "formats",
            Resource::Account => "account",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Resource::Conversion => "Conversion",
            Resource::Formats => "Format",
            Resource::Account => "Account",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Resource::Conversion => "Convert files between formats",
            Resource::Formats => "Get information about supported formats",
            Resource::Account => "Get account information",
        }
    }

    /// Operation selected when none is given.
    pub fn default_operation(self) -> OperationKind {
        match self {
            Resource::Conversion => OperationKind::ConvertFile,
            Resource::Formats => OperationKind::GetAllFormats,
            Resource::Account => OperationKind::GetAccountDetails,
        }
    }

    pub fn parse(value: &str) -> Result<Self, ConvertHubError> {
        Self::ALL
            .into_iter()
            .find(|r| r.value() == value)
            .ok_or_else(|| invalid(format!("unknown resource '{value}'")))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// Every operation the node offers, without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CancelJob,
    ConvertFile,
    ConvertUrl,
    DeleteConversion,
    GetDownloadUrl,
    GetStatus,
    GetAllFormats,
    GetFormatConversions,
    CheckConversionSupport,
    GetAllConversions,
    GetAccountDetails,
}

impl OperationKind {
    pub const ALL: [OperationKind; 11] = [
        OperationKind::CancelJob,
        OperationKind::ConvertFile,
        OperationKind::ConvertUrl,
        OperationKind::DeleteConversion,
        OperationKind::GetDownloadUrl,
        OperationKind::GetStatus,
        OperationKind::GetAllFormats,
        OperationKind::GetFormatConversions,
        OperationKind::CheckConversionSupport,
        OperationKind::GetAllConversions,
        OperationKind::GetAccountDetails,
    ];

    pub fn resource(self) -> Resource {
        use OperationKind::*;
        match self {
            CancelJob | ConvertFile | ConvertUrl | DeleteConversion | GetDownloadUrl
            | GetStatus => Resource::Conversion,
            GetAllFormats | GetFormatConversions | CheckConversionSupport
            | GetAllConversions => Resource::Formats,
            GetAccountDetails => Resource::Account,
        }
    }

    /// Identifier used in parameters.
    pub fn value(self) -> &'static str {
        use OperationKind::*;
        match self {
            CancelJob => "cancelJob",
            ConvertFile => "convertFile",
            ConvertUrl => "convertUrl",
            DeleteConversion => "deleteConversion",
            GetDownloadUrl => "getDownloadUrl",
            GetStatus => "getStatus",
            GetAllFormats => "getAllFormats",
            GetFormatConversions => "getFormatConversions",
            CheckConversionSupport => "checkConversionSupport",
            GetAllConversions => "getAllConversions",
            GetAccountDetails => "getDetails",
        }
    }

    pub fn display_name(self) -> &'static str {
        use OperationKind::*;
        match self {
            CancelJob => "Cancel Job",
            ConvertFile => "Convert File",
            ConvertUrl => "Convert From URL",
            DeleteConversion => "Delete Conversion",
            GetDownloadUrl => "Get Download URL",
            GetStatus => "Get Job Status",
            GetAllFormats => "Get All Supported Formats",
            GetFormatConversions => "Get Format Conversions",
            CheckConversionSupport => "Check Conversion Support",
            GetAllConversions => "Get All Supported Conversions",
            GetAccountDetails => "Get Account Details",
        }
    }

    pub fn description(self) -> &'static str {
        use OperationKind::*;
        match self {
            CancelJob => "Cancel a conversion job",
            ConvertFile => "Convert a file from one format to another",
            ConvertUrl => "Convert a file from a URL",
            DeleteConversion => "Delete a completed conversion file",
            GetDownloadUrl => "Get the download URL for a completed conversion",
            GetStatus => "Check the status of a conversion job",
            GetAllFormats => "Get a list of all supported file formats",
            GetFormatConversions => "Get available conversions for a specific format",
            CheckConversionSupport => "Check if a specific conversion is supported",
            GetAllConversions => "Get all supported formats with conversion mappings",
            GetAccountDetails => "Get account information including credits and plan details",
        }
    }

    /// Short imperative label.
    pub fn action(self) -> &'static str {
        use OperationKind::*;
        match self {
            CancelJob => "Cancel conversion job",
            ConvertFile => "Convert a file",
            ConvertUrl => "Convert file from URL",
            DeleteConversion => "Delete conversion file",
            GetDownloadUrl => "Get download URL",
            GetStatus => "Get job status",
            GetAllFormats => "Get all supported formats",
            GetFormatConversions => "Get format conversions",
            CheckConversionSupport => "Check conversion support",
            GetAllConversions => "Get all supported conversions",
            GetAccountDetails => "Get account details",
        }
    }

    /// Operations under one resource, in catalog order.
    pub fn for_resource(resource: Resource) -> impl Iterator<Item = OperationKind> {
        Self::ALL.into_iter().filter(move |op| op.resource() == resource)
    }

    pub fn parse(resource: Resource, value: &str) -> Result<Self, ConvertHubError> {
        Self::for_resource(resource)
            .find(|op| op.value() == value)
            .ok_or_else(|| invalid(format!("unknown operation '{value}' for resource '{resource}'")))
    }
}

/// Parameters of the two conversion operations, beyond the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertParams {
    pub target_format: String,
    pub options: OutputOptions,
    pub additional_fields: ConversionOptions,
}

impl ConvertParams {
    /// Label for the converted file on the output item. Default: `data`.
    pub fn output_label(&self) -> &str {
        self.options
            .binary_property_name
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(crate::pipeline::poll::DEFAULT_BINARY_PROPERTY)
    }
}

/// The `options` collection of a conversion operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputOptions {
    pub binary_property_name: Option<String>,
}

/// A fully parameterised operation for one item.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    ConvertFile {
        /// Input binary property holding the file. Default: `data`.
        binary_property: String,
        params: ConvertParams,
    },
    ConvertUrl {
        file_url: String,
        params: ConvertParams,
    },
    GetStatus { job_id: String },
    GetDownloadUrl { job_id: String },
    CancelJob { job_id: String },
    DeleteConversion { job_id: String },
    GetAllFormats,
    GetFormatConversions { format: String },
    CheckConversionSupport { source_format: String, target_format: String },
    GetAllConversions,
    GetAccountDetails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobIdParams {
    job_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileParams {
    #[serde(default = "default_binary_property")]
    binary_property_name: String,
    #[serde(flatten)]
    convert: ConvertParams,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlParams {
    file_url: String,
    #[serde(flatten)]
    convert: ConvertParams,
}

#[derive(Deserialize)]
struct FormatParams {
    format: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupportParams {
    source_format: String,
    target_format: String,
}

fn default_binary_property() -> String {
    crate::pipeline::poll::DEFAULT_BINARY_PROPERTY.to_string()
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::ConvertFile { .. } => OperationKind::ConvertFile,
            Operation::ConvertUrl { .. } => OperationKind::ConvertUrl,
            Operation::GetStatus { .. } => OperationKind::GetStatus,
            Operation::GetDownloadUrl { .. } => OperationKind::GetDownloadUrl,
            Operation::CancelJob { .. } => OperationKind::CancelJob,
            Operation::DeleteConversion { .. } => OperationKind::DeleteConversion,
            Operation::GetAllFormats => OperationKind::GetAllFormats,
            Operation::GetFormatConversions { .. } => OperationKind::GetFormatConversions,
            Operation::CheckConversionSupport { .. } => OperationKind::CheckConversionSupport,
            Operation::GetAllConversions => OperationKind::GetAllConversions,
            Operation::GetAccountDetails => OperationKind::GetAccountDetails,
        }
    }

    /// Build an operation from a parameter object.
    ///
    /// `resource` defaults to `conversion` and `operation` to the resource's
    /// default operation. Remaining keys use the host's camelCase names
    /// (`jobId`, `fileUrl`, `targetFormat`, `binaryPropertyName`,
    /// `additionalFields`, …).
    ///
    /// # Example
    /// ```rust
    /// use converthub::node::{Operation, OperationKind};
    /// use serde_json::json;
    ///
    /// let op = Operation::from_parameters(&json!({
    ///     "resource": "conversion",
    ///     "operation": "getStatus",
    ///     "jobId": "job_123"
    /// })).unwrap();
    /// assert_eq!(op.kind(), OperationKind::GetStatus);
    /// ```
    pub fn from_parameters(params: &Value) -> Result<Self, ConvertHubError> {
        let resource = match params.get("resource").and_then(Value::as_str) {
            Some(r) => Resource::parse(r)?,
            None => Resource::Conversion,
        };
        let kind = match params.get("operation").and_then(Value::as_str) {
            Some(op) => OperationKind::parse(resource, op)?,
            None => resource.default_operation(),
        };

        use OperationKind::*;
        Ok(match kind {
            ConvertFile => {
                let p: FileParams = parse(params)?;
                Operation::ConvertFile {
                    binary_property: p.binary_property_name,
                    params: p.convert,
                }
            }
            ConvertUrl => {
                let p: UrlParams = parse(params)?;
                Operation::ConvertUrl {
                    file_url: p.file_url,
                    params: p.convert,
                }
            }
            GetStatus => Operation::GetStatus { job_id: parse::<JobIdParams>(params)?.job_id },
            GetDownloadUrl => Operation::GetDownloadUrl { job_id: parse::<JobIdParams>(params)?.job_id },
            CancelJob => Operation::CancelJob { job_id: parse::<JobIdParams>(params)?.job_id },
            DeleteConversion => Operation::DeleteConversion { job_id: parse::<JobIdParams>(params)?.job_id },
            GetAllFormats => Operation::GetAllFormats,
            GetFormatConversions => Operation::GetFormatConversions {
                format: parse::<FormatParams>(params)?.format,
            },
            CheckConversionSupport => {
                let p: SupportParams = parse(params)?;
                Operation::CheckConversionSupport {
                    source_format: p.source_format,
                    target_format: p.target_format,
                }
            }
            GetAllConversions => Operation::GetAllConversions,
            GetAccountDetails => Operation::GetAccountDetails,
        })
    }
}

fn parse<T: DeserializeOwned>(params: &Value) -> Result<T, ConvertHubError> {
    T::deserialize(params).map_err(|e| invalid(format!("invalid parameters: {e}")))
}

fn invalid(message: String) -> ConvertHubError {
    ConvertHubError::InvalidInput {
        message,
        item_index: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_is_consistent() {
        for op in OperationKind::ALL {
            assert_eq!(OperationKind::parse(op.resource(), op.value()).unwrap(), op);
            assert!(!op.display_name().is_empty());
            assert!(!op.action().is_empty());
        }
        assert_eq!(OperationKind::for_resource(Resource::Conversion).count(), 6);
        assert_eq!(OperationKind::for_resource(Resource::Formats).count(), 4);
        assert_eq!(OperationKind::for_resource(Resource::Account).count(), 1);
    }

    #[test]
    fn operation_must_match_resource() {
        assert!(OperationKind::parse(Resource::Account, "getStatus").is_err());
        assert!(Resource::parse("billing").is_err());
    }

    #[test]
    fn defaults_to_convert_file() {
        let op = Operation::from_parameters(&json!({"targetFormat": "pdf"})).unwrap();
        match op {
            Operation::ConvertFile { binary_property, params } => {
                assert_eq!(binary_property, "data");
                assert_eq!(params.target_format, "pdf");
                assert_eq!(params.options.binary_property_name, None);
                assert_eq!(params.output_label(), "data");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn output_label_is_read_from_options_collection() {
        let op = Operation::from_parameters(&json!({
            "operation": "convertFile",
            "binaryPropertyName": "attachment",
            "targetFormat": "pdf",
            "options": { "binaryPropertyName": "converted" }
        }))
        .unwrap();
        let Operation::ConvertFile { binary_property, params } = op else {
            panic!("expected convertFile");
        };
        assert_eq!(binary_property, "attachment");
        assert_eq!(params.output_label(), "converted");

        let empty = ConvertParams {
            options: OutputOptions {
                binary_property_name: Some(String::new()),
            },
            ..ConvertParams::default()
        };
        assert_eq!(empty.output_label(), "data");
    }

    #[test]
    fn convert_url_with_additional_fields() {
        let op = Operation::from_parameters(&json!({
            "resource": "conversion",
            "operation": "convertUrl",
            "fileUrl": "https://example.com/a.wav",
            "targetFormat": "mp3",
            "options": { "binaryPropertyName": "audio" },
            "additionalFields": {
                "bitrate": "320k",
                "sample_rate": 48000,
                "metadata": [{"key": "k", "value": "v"}]
            }
        }))
        .unwrap();
        let Operation::ConvertUrl { file_url, params } = op else {
            panic!("expected convertUrl");
        };
        assert_eq!(file_url, "https://example.com/a.wav");
        assert_eq!(params.output_label(), "audio");
        assert_eq!(params.additional_fields.bitrate.as_deref(), Some("320k"));
        assert_eq!(params.additional_fields.sample_rate, Some(48000));
        assert_eq!(params.additional_fields.metadata.len(), 1);
    }

    #[test]
    fn job_operations_need_job_id() {
        let err = Operation::from_parameters(&json!({"operation": "cancelJob"})).unwrap_err();
        assert!(err.to_string().contains("jobId"), "got: {err}");

        let op = Operation::from_parameters(&json!({"operation": "deleteConversion", "jobId": "j"}))
            .unwrap();
        assert_eq!(op, Operation::DeleteConversion { job_id: "j".into() });
    }

    #[test]
    fn formats_and_account() {
        let op = Operation::from_parameters(&json!({
            "resource": "formats",
            "operation": "checkConversionSupport",
            "sourceFormat": "png",
            "targetFormat": "jpg"
        }))
        .unwrap();
        assert_eq!(op.kind(), OperationKind::CheckConversionSupport);

        let op = Operation::from_parameters(&json!({"resource": "account"})).unwrap();
        assert_eq!(op, Operation::GetAccountDetails);
    }
}
