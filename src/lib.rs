//! # converthub
//!
//! Client for the ConvertHub file-conversion API: submit a file or URL,
//! poll the asynchronous job to completion, and download the result.
//!
//! The same pipeline backs three surfaces: the library functions below, a
//! workflow [`node`] that processes batches of items, and the `converthub`
//! CLI binary.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source
//!  │
//!  ├─ 1. Submit    base64 upload or URL reference → job_id
//!  ├─ 2. Poll      GET /jobs/{id} every interval, bounded attempts
//!  ├─ 3. Resolve   GET /jobs/{id}/download → pre-signed download_url
//!  ├─ 4. Fetch     download bytes, pick the output filename
//!  └─ 5. Output    ConversionResult (JSON + optional file)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use converthub::{convert, ClientConfig, ConversionOptions, ConversionSource, ConvertHubClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads CONVERTHUB_API_KEY
//!     let client = ConvertHubClient::new(ClientConfig::from_env()?)?;
//!     let source = ConversionSource::parse("report.docx");
//!     let result = convert(&client, &source, "pdf", &ConversionOptions::default()).await?;
//!     if let Some(file) = result.file {
//!         std::fs::write(&file.file_name, &file.data)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Workflow node
//!
//! ```rust,no_run
//! use converthub::node::{ConvertHubNode, Item, Operation};
//! use converthub::{ClientConfig, ConvertHubClient};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ConvertHubClient::new(ClientConfig::from_env()?)?;
//! let node = ConvertHubNode::new(client).continue_on_fail(true);
//! let op = Operation::from_parameters(&json!({
//!     "resource": "conversion",
//!     "operation": "convertUrl",
//!     "fileUrl": "https://example.com/photo.png",
//!     "targetFormat": "jpg",
//! }))?;
//! let out = node.execute_uniform(&[Item::default()], &op).await?;
//! println!("{:?}", out[0].json);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `converthub` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! converthub = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod node;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::ConvertHubClient;
pub use config::{ClientConfig, ClientConfigBuilder, PollPolicy};
pub use convert::{convert, convert_sync, convert_to_file, submit, ConversionSource, SubmittedJob};
pub use credentials::ConvertHubCredentials;
pub use error::{ConvertHubError, FailureKind, FailureReport};
pub use output::{
    AttemptOutcome, BinaryData, ConversionJob, ConversionResult, JobStatus, PollAttempt,
};
pub use pipeline::poll::{poll_for_completion, PollRequest};
pub use pipeline::submit::{ConversionOptions, MetadataEntry};
pub use progress::{NoopProgressCallback, PollProgressCallback, ProgressCallback};
