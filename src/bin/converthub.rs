//! CLI binary for converthub.
//!
//! A thin shim over the library crate that maps subcommands to client
//! calls and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use converthub::config::{API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
use converthub::{
    convert_to_file, poll_for_completion, submit, AttemptOutcome, ClientConfig,
    ConversionOptions, ConversionSource, ConvertHubClient, MetadataEntry, PollAttempt,
    PollProgressCallback, PollRequest, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner showing the job id and the latest poll attempt.
struct CliProgressCallback {
    bar: ProgressBar,
    max_attempts: u32,
}

impl CliProgressCallback {
    fn new(max_attempts: u32) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Submitting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar, max_attempts })
    }

    /// Clear the spinner when the run ends without a poll outcome, e.g. a
    /// rejected submission.
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl PollProgressCallback for CliProgressCallback {
    fn on_submitted(&self, job_id: &str) {
        self.bar.set_prefix("Converting");
        self.bar.set_message(dim(job_id));
    }

    fn on_attempt(&self, attempt: &PollAttempt) {
        let state = match &attempt.outcome {
            AttemptOutcome::Success => "completed".to_string(),
            AttemptOutcome::InProgress => "processing".to_string(),
            AttemptOutcome::TransientError(e) => format!("retrying ({e})"),
            AttemptOutcome::TerminalError(e) => red(e),
        };
        self.bar.set_message(format!(
            "attempt {}/{}  {}",
            attempt.index, self.max_attempts, state
        ));
    }

    fn on_completed(&self, job_id: &str, attempts: u32) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} completed after {} checks",
            green("✔"),
            bold(job_id),
            attempts
        );
    }

    fn on_failed(&self, job_id: &str, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {} {}", red("✘"), bold(job_id), red(message));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a local file into the current directory
  converthub convert report.docx --to pdf

  # Convert a remote file to a specific path
  converthub convert https://example.com/photo.png --to jpg --quality 80 -o out/photo.jpg

  # Submit and wait, but only print the download URL
  converthub convert video.mov --to mp4 --no-download

  # Inspect a job
  converthub status job_123abc
  converthub download-url job_123abc

  # Discover formats
  converthub conversions png
  converthub supports heic jpg

ENVIRONMENT VARIABLES:
  CONVERTHUB_API_KEY    API key (https://converthub.com/api/signup)
  CONVERTHUB_BASE_URL   Override the API root (default https://api.converthub.com/v2)
  RUST_LOG              Override log filtering
"#;

/// Convert files between 800+ formats using the ConvertHub API.
#[derive(Parser, Debug)]
#[command(
    name = "converthub",
    version,
    about = "Convert files between 800+ formats using the ConvertHub API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// ConvertHub API key.
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// API root URL.
    #[arg(long, global = true, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Maximum number of status checks before giving up.
    #[arg(long, global = true, env = "CONVERTHUB_MAX_ATTEMPTS", default_value_t = 150)]
    max_attempts: u32,

    /// Delay between status checks in milliseconds.
    #[arg(long, global = true, env = "CONVERTHUB_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, global = true, env = "CONVERTHUB_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a local file or URL and wait for the result.
    Convert(ConvertArgs),
    /// Show the status of a conversion job.
    Status { job_id: String },
    /// Get the download link of a completed job.
    DownloadUrl { job_id: String },
    /// Cancel a queued or processing job.
    Cancel { job_id: String },
    /// Delete a completed conversion and its files.
    Delete { job_id: String },
    /// List all supported formats.
    Formats,
    /// List the target formats available for a source format.
    Conversions { format: String },
    /// Check whether a source → target conversion is supported.
    Supports { source: String, target: String },
    /// List every supported conversion pair.
    SupportedConversions,
    /// Show credits and plan details.
    Account,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Target format, e.g. pdf, jpg, mp3.
    #[arg(long = "to", short = 't')]
    target: String,

    /// Output file or directory. Default: current directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Custom output filename sent to the API.
    #[arg(long)]
    output_filename: Option<String>,

    /// Quality for lossy formats (1–100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Resolution for image/video output, e.g. 1920x1080.
    #[arg(long)]
    resolution: Option<String>,

    /// Bitrate for audio/video output, e.g. 320k.
    #[arg(long)]
    bitrate: Option<String>,

    /// Sample rate for audio output, e.g. 44100.
    #[arg(long)]
    sample_rate: Option<u32>,

    /// URL notified when the conversion completes.
    #[arg(long)]
    webhook_url: Option<String>,

    /// Custom metadata as key=value. Repeatable.
    #[arg(long = "metadata", value_parser = parse_metadata)]
    metadata: Vec<MetadataEntry>,

    /// Wait for completion but do not download the file.
    #[arg(long)]
    no_download: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

impl ConvertArgs {
    fn options(&self) -> ConversionOptions {
        ConversionOptions {
            output_filename: self.output_filename.clone(),
            webhook_url: self.webhook_url.clone(),
            quality: self.quality,
            resolution: self.resolution.clone(),
            bitrate: self.bitrate.clone(),
            sample_rate: self.sample_rate,
            metadata: self.metadata.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would fight with the spinner; only show them when it's off.
    let show_progress = !cli.quiet && !cli.no_progress && matches!(cli.command, Command::Convert(_));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let spinner = show_progress.then(|| CliProgressCallback::new(cli.max_attempts));
    let progress_cb: Option<ProgressCallback> = spinner
        .clone()
        .map(|cb| cb as Arc<dyn PollProgressCallback>);

    let client = build_client(&cli, progress_cb).inspect_err(|_| {
        if let Some(spinner) = &spinner {
            spinner.abandon();
        }
    })?;

    let value = match &cli.command {
        Command::Convert(args) => {
            let result = run_convert(&client, args, cli.quiet).await;
            if let (Err(_), Some(spinner)) = (&result, &spinner) {
                spinner.abandon();
            }
            return result;
        }
        Command::Status { job_id } => client.job_status(job_id).await,
        Command::DownloadUrl { job_id } => client.download_url(job_id).await,
        Command::Cancel { job_id } => client.cancel_job(job_id).await,
        Command::Delete { job_id } => client.delete_conversion(job_id).await,
        Command::Formats => client.formats().await,
        Command::Conversions { format } => client.format_conversions(format).await,
        Command::Supports { source, target } => {
            client.check_conversion_support(source, target).await
        }
        Command::SupportedConversions => client.supported_conversions().await,
        Command::Account => client.account().await,
    }
    .context("Request failed")?;

    print_json(&value)
}

/// Map global flags to a client.
fn build_client(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConvertHubClient> {
    let api_key = cli.api_key.clone().with_context(|| {
        format!("No API key. Pass --api-key or set {API_KEY_ENV}")
    })?;

    let mut builder = ClientConfig::builder()
        .api_key(api_key)
        .base_url(cli.base_url.clone())
        .max_attempts(cli.max_attempts)
        .poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .request_timeout_secs(cli.timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let config = builder.build().context("Invalid configuration")?;
    ConvertHubClient::new(config).context("Failed to create HTTP client")
}

async fn run_convert(client: &ConvertHubClient, args: &ConvertArgs, quiet: bool) -> Result<()> {
    let source = ConversionSource::parse(&args.input);
    let options = args.options();

    if args.no_download {
        let job = submit(client, &source, &args.target, &options)
            .await
            .context("Conversion failed")?;
        let request = PollRequest::new(job.job_id)
            .download(false)
            .expected_filename(job.output_filename);
        let result = poll_for_completion(client, &request)
            .await
            .context("Conversion failed")?;

        if args.json {
            return print_json(&Value::Object(result.json));
        }
        match result.download_url {
            Some(url) => println!("{url}"),
            None => anyhow::bail!("Job completed without a download URL"),
        }
        return Ok(());
    }

    let output = args.output.clone().unwrap_or_else(|| PathBuf::from("."));
    let (path, result) = convert_to_file(client, &source, &args.target, &options, &output)
        .await
        .context("Conversion failed")?;

    if args.json {
        return print_json(&Value::Object(result.json));
    }
    if !quiet {
        let size = result.file.as_ref().map(|f| f.file_size).unwrap_or(0);
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            args.target,
            dim(&format!("{size} bytes")),
            bold(&path.display().to_string()),
        );
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

/// Parse `--metadata key=value`.
fn parse_metadata(s: &str) -> Result<MetadataEntry, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty metadata key in '{s}'"));
    }
    Ok(MetadataEntry {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandoned_spinner_is_finished() {
        let cb = CliProgressCallback::new(5);
        cb.on_submitted("job_1");
        assert!(!cb.bar.is_finished());
        cb.abandon();
        assert!(cb.bar.is_finished());
        // A later failure event leaves it finished.
        cb.on_failed("job_1", "boom");
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn metadata_pairs() {
        let m = parse_metadata("order=42").unwrap();
        assert_eq!(m.key, "order");
        assert_eq!(m.value, "42");
        assert_eq!(parse_metadata("note=a=b").unwrap().value, "a=b");
        assert!(parse_metadata("novalue").is_err());
        assert!(parse_metadata("=x").is_err());
    }

    #[test]
    fn cli_parses_convert() {
        let cli = Cli::try_parse_from([
            "converthub",
            "--api-key",
            "k",
            "convert",
            "a.png",
            "--to",
            "jpg",
            "--quality",
            "80",
            "--metadata",
            "a=1",
        ])
        .unwrap();
        match cli.command {
            Command::Convert(args) => {
                assert_eq!(args.target, "jpg");
                let opts = args.options();
                assert_eq!(opts.quality, Some(80));
                assert_eq!(opts.metadata.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
