//! Download: name and fetch the converted file.

use crate::client::ConvertHubClient;
use crate::error::ConvertHubError;
use crate::output::BinaryData;
use reqwest::Url;
use tracing::info;

/// Name used when nothing better is known.
pub const FALLBACK_FILENAME: &str = "converted-file";

/// Pick the output filename.
///
/// Precedence: the caller's explicit name, then the name reported in the
/// job status, then the last path segment of the download locator, then
/// [`FALLBACK_FILENAME`]. Empty strings count as absent.
pub fn resolve_output_filename(
    explicit: Option<&str>,
    reported: Option<&str>,
    download_url: &str,
) -> String {
    explicit
        .filter(|s| !s.is_empty())
        .or_else(|| reported.filter(|s| !s.is_empty()))
        .map(str::to_string)
        .or_else(|| filename_from_locator(download_url))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Last path segment of the locator, ignoring any query string.
fn filename_from_locator(download_url: &str) -> Option<String> {
    let segment = match Url::parse(download_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .map(str::to_string),
        Err(_) => download_url
            .split(['?', '#'])
            .next()
            .and_then(|p| p.rsplit('/').next())
            .map(str::to_string),
    };
    segment.filter(|s| !s.is_empty())
}

/// Fetch the bytes behind `download_url` and wrap them under `filename`.
pub async fn materialize(
    client: &ConvertHubClient,
    download_url: &str,
    filename: String,
) -> Result<BinaryData, ConvertHubError> {
    let bytes = client.fetch_bytes(download_url).await?;
    info!("Fetched converted file '{}' ({} bytes)", filename, bytes.len());
    Ok(BinaryData::new(bytes, filename))
}
