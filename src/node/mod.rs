//! The ConvertHub workflow node.
//!
//! A workflow host calls [`ConvertHubNode::execute`] with a batch of input
//! [`Item`]s and a way to resolve each item's [`Operation`]. Items run
//! strictly one after another: a conversion submitted for item `i` is
//! polled to a terminal state before item `i + 1` starts.
//!
//! With `continue_on_fail` a failing item produces an output item
//! `{ "error": "<message>" }` paired to it and the batch carries on;
//! otherwise the first failure ends the execution with a
//! [`FailureReport`].

pub mod item;
pub mod operation;

pub use item::Item;
pub use operation::{ConvertParams, Operation, OperationKind, OutputOptions, Resource};

use crate::client::ConvertHubClient;
use crate::convert::{self, ConversionSource};
use crate::error::{ConvertHubError, FailureReport};
use crate::pipeline::poll::{self, PollRequest};
use tracing::{debug, warn};

/// Node type identifier.
pub const NODE_NAME: &str = "converthub";

/// Human-readable node name.
pub const DISPLAY_NAME: &str = "ConvertHub";

/// One-line node description.
pub const DESCRIPTION: &str = "Convert files between 800+ formats using ConvertHub API";

/// Executes ConvertHub operations for a batch of items.
#[derive(Debug, Clone)]
pub struct ConvertHubNode {
    client: ConvertHubClient,
    continue_on_fail: bool,
}

impl ConvertHubNode {
    pub fn new(client: ConvertHubClient) -> Self {
        Self {
            client,
            continue_on_fail: false,
        }
    }

    /// Record per-item failures in the output instead of aborting.
    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    pub fn client(&self) -> &ConvertHubClient {
        &self.client
    }

    /// Run the same operation for every item.
    pub async fn execute_uniform(
        &self,
        items: &[Item],
        operation: &Operation,
    ) -> Result<Vec<Item>, FailureReport> {
        self.execute(items, |_, _| Ok(operation.clone())).await
    }

    /// Run one operation per item, resolved by `resolve(index, item)`.
    ///
    /// Returns one output item per input item, each paired with its input
    /// index.
    pub async fn execute<F>(&self, items: &[Item], resolve: F) -> Result<Vec<Item>, FailureReport>
    where
        F: Fn(usize, &Item) -> Result<Operation, ConvertHubError>,
    {
        let mut output = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let result = match resolve(index, item) {
                Ok(op) => {
                    debug!("Item {}: {}", index, op.kind().value());
                    self.run(index, item, &op).await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(produced) => output.push(produced.paired_with(index)),
                Err(e) => {
                    let report = FailureReport::from(e.at_item(index));
                    if self.continue_on_fail {
                        warn!("Item {} failed, continuing: {}", index, report.message);
                        output.push(Item::error(report.message, index));
                        continue;
                    }
                    return Err(report);
                }
            }
        }

        Ok(output)
    }

    async fn run(&self, index: usize, item: &Item, op: &Operation) -> Result<Item, ConvertHubError> {
        let client = &self.client;
        let value = match op {
            Operation::ConvertFile {
                binary_property,
                params,
            } => {
                let input = item.binary.get(binary_property).ok_or_else(|| {
                    ConvertHubError::MissingBinary {
                        property: binary_property.clone(),
                        item_index: Some(index),
                    }
                })?;
                let source = ConversionSource::Bytes {
                    data: input.data.clone(),
                    file_name: Some(input.file_name.clone()).filter(|n| !n.is_empty()),
                };
                return self.convert(index, &source, params).await;
            }
            Operation::ConvertUrl { file_url, params } => {
                let source = ConversionSource::Url(file_url.clone());
                return self.convert(index, &source, params).await;
            }
            Operation::GetStatus { job_id } => client.job_status(job_id).await?,
            Operation::GetDownloadUrl { job_id } => client.download_url(job_id).await?,
            Operation::CancelJob { job_id } => client.cancel_job(job_id).await?,
            Operation::DeleteConversion { job_id } => client.delete_conversion(job_id).await?,
            Operation::GetAllFormats => client.formats().await?,
            Operation::GetFormatConversions { format } => client.format_conversions(format).await?,
            Operation::CheckConversionSupport {
                source_format,
                target_format,
            } => {
                client
                    .check_conversion_support(source_format, target_format)
                    .await?
            }
            Operation::GetAllConversions => client.supported_conversions().await?,
            Operation::GetAccountDetails => client.account().await?,
        };
        Ok(Item::from_json(value))
    }

    /// Submit, poll to completion, and attach the converted file.
    async fn convert(
        &self,
        index: usize,
        source: &ConversionSource,
        params: &ConvertParams,
    ) -> Result<Item, ConvertHubError> {
        let job = convert::submit(
            &self.client,
            source,
            &params.target_format,
            &params.additional_fields,
        )
        .await?;

        let request = PollRequest::new(job.job_id)
            .binary_property(params.output_label())
            .item_index(index)
            .expected_filename(job.output_filename);

        let result = poll::poll_for_completion(&self.client, &request).await?;
        Ok(Item::from(result))
    }
}
