//! # Email Finder CLI
//!
//! Command-line interface for the email finder library (`email_finder_core`).
//! Parses arguments, builds the configuration, runs the discovery pipeline over a
//! JSON file of contacts (or a single contact) and writes the results.

use email_finder_core::{
    check_smtp_connectivity, initialize_finder, process_contacts, Config, ConfigBuilder, Contact,
    ContactResult, ContactStatus, MemorySink, ResultSink, RunReport,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Finds and verifies work email addresses from names and employers.",
    long_about = "Email Finder resolves each contact's company to a mail domain, generates likely address patterns and checks them against the company's mail servers over SMTP, without sending mail."
)]
struct AppArgs {
    /// Path to the input JSON file: an array of contact objects.
    #[arg(short, long, default_value = "input.json", env = "EMAIL_FINDER_INPUT")]
    input: String,

    /// Path to the output JSON file. Rewritten at every checkpoint.
    #[arg(short, long, default_value = "results.json", env = "EMAIL_FINDER_OUTPUT")]
    output: String,

    /// First name of a single contact (enables single contact mode).
    #[arg(long, requires_all = ["last_name", "company"])]
    first_name: Option<String>,

    /// Last name of a single contact.
    #[arg(long, requires_all = ["first_name", "company"])]
    last_name: Option<String>,

    /// Company of a single contact.
    #[arg(long, requires_all = ["first_name", "last_name"])]
    company: Option<String>,

    /// Print the single contact result instead of writing the output file.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Path to a configuration file (TOML). CLI args override file settings.
    #[arg(long, env = "EMAIL_FINDER_CONFIG")]
    config_file: Option<String>,

    /// Number of contacts processed at the same time.
    #[arg(short, long, env = "EMAIL_FINDER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Write partial results after this many completed contacts.
    #[arg(long, env = "EMAIL_FINDER_CHECKPOINT_INTERVAL")]
    checkpoint_interval: Option<usize>,

    /// Skip SMTP verification and report the most common pattern.
    #[arg(long)]
    no_verify: bool,

    /// Also try numeric and middle-initial patterns.
    #[arg(long)]
    extended: bool,

    /// Maximum number of candidates probed per contact.
    #[arg(long, env = "EMAIL_FINDER_MAX_PATTERNS")]
    max_patterns: Option<usize>,

    /// Do not fall back to web search when the guessed domain does not resolve.
    #[arg(long)]
    no_search: bool,

    /// Do not probe a random address to detect catch-all domains.
    #[arg(long)]
    no_catch_all_check: bool,

    /// Sender address used in MAIL FROM.
    #[arg(long, env = "EMAIL_FINDER_SMTP_SENDER")]
    smtp_sender: Option<String>,

    /// Name sent with EHLO.
    #[arg(long, env = "EMAIL_FINDER_HELO_NAME")]
    helo_name: Option<String>,

    /// SMTP port on the mail exchangers.
    #[arg(long, env = "EMAIL_FINDER_SMTP_PORT")]
    smtp_port: Option<u16>,

    /// Timeout for each SMTP step, in seconds.
    #[arg(long, env = "EMAIL_FINDER_SMTP_TIMEOUT")]
    smtp_timeout: Option<u64>,

    /// DNS query timeout in seconds.
    #[arg(long, env = "EMAIL_FINDER_DNS_TIMEOUT")]
    dns_timeout: Option<u64>,

    /// HTTP request timeout for web search, in seconds.
    #[arg(long, env = "EMAIL_FINDER_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Delay between probes for the same contact, in milliseconds.
    #[arg(long, env = "EMAIL_FINDER_PACING_MS")]
    pacing_ms: Option<u64>,

    /// Comma-separated list of DNS servers to use for lookups.
    #[arg(long, value_delimiter = ',', env = "EMAIL_FINDER_DNS_SERVERS")]
    dns_servers: Option<Vec<String>>,

    /// Skip the outbound port check at startup.
    #[arg(long)]
    skip_connectivity_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!("Email Finder CLI v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let config = build_config(&args)?;
    tracing::debug!("Effective configuration loaded: {:?}", config);

    if config.verify && !args.skip_connectivity_check {
        match check_smtp_connectivity(&config).await {
            Ok(_) => tracing::info!("Outbound SMTP looks open (port {}).", config.smtp_port),
            Err(e) => {
                tracing::warn!("SMTP connectivity test failed: {}", e);
                tracing::warn!("Verification will likely fall back to MX heuristics.");
            }
        }
    }

    let finder = Arc::new(
        initialize_finder(config).context("Failed to initialize the email finder")?,
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; cancelling the run.");
            ctrl_c.cancel();
        }
    });

    let start_time = Instant::now();
    if let (Some(first), Some(last), Some(company)) =
        (&args.first_name, &args.last_name, &args.company)
    {
        let contact = Contact::new(first, last, company);
        process_single(finder, contact, &args, cancel).await?;
    } else {
        process_file(finder, &args, cancel).await?;
    }
    tracing::info!("Finished. Total duration: {:.2?}", start_time.elapsed());

    Ok(())
}

fn build_config(args: &AppArgs) -> Result<Config> {
    let mut builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        builder = builder.config_file(path);
    }
    if let Some(c) = args.concurrency {
        builder = builder.max_concurrency(c);
    }
    if let Some(n) = args.checkpoint_interval {
        builder = builder.checkpoint_interval(n);
    }
    if args.no_verify {
        builder = builder.verify(false);
    }
    if args.extended {
        builder = builder.extended_patterns(true);
    }
    if let Some(n) = args.max_patterns {
        builder = builder.max_patterns_per_contact(n);
    }
    if args.no_search {
        builder = builder.enable_web_search(false);
    }
    if args.no_catch_all_check {
        builder = builder.catch_all_check(false);
    }
    if let Some(ref s) = args.smtp_sender {
        builder = builder.smtp_sender_email(s);
    }
    if let Some(ref h) = args.helo_name {
        builder = builder.helo_name(h);
    }
    if let Some(port) = args.smtp_port {
        builder = builder.smtp_port(port);
    }
    if let Some(t) = args.smtp_timeout {
        builder = builder.smtp_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.dns_timeout {
        builder = builder.dns_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.request_timeout {
        builder = builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(ms) = args.pacing_ms {
        builder = builder.pacing_delay(Duration::from_millis(ms));
    }
    if let Some(ref servers) = args.dns_servers {
        if !servers.is_empty() {
            builder = builder.dns_servers(servers.clone());
        }
    }

    builder.build().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to build configuration: {}", e)
    })
}

async fn process_single(
    finder: Arc<email_finder_core::EmailFinder>,
    contact: Contact,
    args: &AppArgs,
    cancel: CancellationToken,
) -> Result<()> {
    tracing::info!("Running in single contact mode.");
    let mut sink = MemorySink::new();
    let report = process_contacts(finder, vec![contact], &mut sink, cancel).await?;

    let Some(result) = report.results.first() else {
        anyhow::bail!("Run was cancelled before the contact completed");
    };
    if args.stdout {
        print_result(result);
    } else {
        save_results(&report.results, Path::new(&args.output))?;
        tracing::info!("Result saved to '{}'.", args.output);
    }
    Ok(())
}

async fn process_file(
    finder: Arc<email_finder_core::EmailFinder>,
    args: &AppArgs,
    cancel: CancellationToken,
) -> Result<()> {
    tracing::info!(
        "Running in file mode. Input: '{}', Output: '{}'",
        args.input,
        args.output
    );
    let output_path = PathBuf::from(&args.output);
    if let Some(parent_dir) = output_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!("Failed to create output directory '{}'", parent_dir.display())
            })?;
        }
    }

    let contacts = load_contacts(&args.input)?;
    if contacts.is_empty() {
        tracing::warn!("Input file '{}' contains no contacts. Writing empty results.", args.input);
        save_results(&[], &output_path)?;
        return Ok(());
    }
    tracing::info!("Loaded {} contacts from '{}'.", contacts.len(), args.input);

    let progress = ProgressBar::new(contacts.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
            .context("Failed to set progress bar template")?
            .progress_chars("=> "),
    );
    progress.set_message("Processing contacts...");

    let mut sink = JsonFileSink::new(output_path, progress.clone());
    let report = process_contacts(finder, contacts, &mut sink, cancel).await?;
    progress.finish_with_message(format!("Processed {} contacts", report.results.len()));

    log_summary(&report);
    Ok(())
}

/// Writes the results so far to a JSON file, sorted by input row.
///
/// Each write goes to a sibling temp file that is then renamed over the output,
/// so an interrupted write never leaves a truncated file behind.
struct JsonFileSink {
    path: PathBuf,
    progress: ProgressBar,
}

impl JsonFileSink {
    fn new(path: PathBuf, progress: ProgressBar) -> Self {
        Self { path, progress }
    }
}

impl ResultSink for JsonFileSink {
    fn record(&mut self, result: &ContactResult) {
        self.progress.inc(1);
        if let Some(ref email) = result.found_email {
            self.progress
                .set_message(format!("{} {}: {}", result.first_name, result.last_name, email));
        }
    }

    fn persist(
        &mut self,
        results: &[ContactResult],
        complete: bool,
    ) -> email_finder_core::Result<()> {
        let mut sorted = results.to_vec();
        sorted.sort_by_key(|r| r.row);

        let tmp_path = self.path.with_extension("json.partial");
        {
            let writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(writer, &sorted)?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        tracing::debug!(
            "Wrote {} results to {} (complete: {})",
            sorted.len(),
            self.path.display(),
            complete
        );
        Ok(())
    }
}

fn load_contacts(file_path: &str) -> Result<Vec<Contact>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open input file '{}'", file_path))?;
    let records: Vec<Contact> = serde_json::from_reader(BufReader::new(file)).with_context(|| {
        format!(
            "Failed to parse JSON from '{}'. Ensure it's an array of contact objects.",
            file_path
        )
    })?;
    Ok(records)
}

fn save_results(results: &[ContactResult], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), results)
        .with_context(|| format!("Failed to serialize results to '{}'", path.display()))?;
    Ok(())
}

/// Logs per-status counts and the success rate.
fn log_summary(report: &RunReport) {
    let stats = &report.stats;
    let duration = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default();

    tracing::info!("-------------------- Processing Summary --------------------");
    tracing::info!("Total Contacts              : {}", stats.total);
    tracing::info!("  - Verified                : {}", stats.verified);
    tracing::info!("  - Catch-all (unconfirmed) : {}", stats.catch_all);
    tracing::info!("  - Unverified guess        : {}", stats.unverified);
    tracing::info!("  - No match                : {}", stats.no_match);
    tracing::info!("  - No domain               : {}", stats.no_domain);
    tracing::info!("  - No patterns             : {}", stats.no_patterns);
    tracing::info!("  - Missing data            : {}", stats.missing_data);
    if report.not_completed > 0 {
        tracing::info!("  - Not completed           : {}", report.not_completed);
    }
    tracing::info!("Success Rate                : {:.1}%", stats.success_rate());
    tracing::info!("Total Time Taken            : {:.2?}", duration);
    tracing::info!("----------------------------------------------------------");
}

/// Prints one result to standard output (single contact mode).
fn print_result(result: &ContactResult) {
    const BLUE: &str = "\x1b[34m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    println!("\n{BLUE}===== Email Finder Result ====={RESET}");
    println!("Name:    {} {}", result.first_name, result.last_name);
    println!("Company: {}", result.company);
    println!(
        "Domain:  {}{}",
        result.domain.as_deref().unwrap_or("N/A"),
        if result.domain.is_some() && !result.domain_verified {
            " (unverified)"
        } else {
            ""
        }
    );

    let color = match result.status {
        ContactStatus::Verified => GREEN,
        _ => YELLOW,
    };
    println!("\n{color}Status: {}{RESET}", result.status);
    if let Some(ref email) = result.found_email {
        println!("Email:   {color}{}{RESET}", email);
    }
    println!("Patterns tried: {}", result.patterns_tried);
    if let Some(evidence) = result.evidence {
        println!("Evidence: {:?}", evidence);
    }
    if let Some(ref detail) = result.detail {
        println!("Detail:  {}", detail);
    }
}
