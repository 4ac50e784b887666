//! CLI binary for docintel.
//!
//! A thin shim over the library crate that maps CLI flags to `PortalConfig`
//! and prints results: `docintel capture` drives the capture pipeline for a
//! file, URL, or folder of scans, and `docintel search` runs a patient lookup
//! and renders the tabbed profile sections.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use docintel::{
    run_capture, run_capture_batch, ApiClient, CaptureProgress, CaptureSession, CaptureStatus,
    ExtractionClient, PortalConfig, ProfileTab, ProfileView, SearchSession, SearchStatus,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Batch progress bar ───────────────────────────────────────────────────────

/// Terminal progress callback for batch capture: a live bar plus a per-file
/// log line, correct even when files complete out of order.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Capturing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl CaptureProgress for CliProgress {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_start(&self, file: &str) {
        self.bar.set_message(file.to_string());
    }

    fn on_file_done(&self, file: &str, error: Option<&str>) {
        match error {
            None => self.bar.println(format!("  {} {file}", green("✓"))),
            Some(e) => {
                let msg = if e.chars().count() > 100 {
                    let cut: String = e.chars().take(99).collect();
                    format!("{cut}\u{2026}")
                } else {
                    e.to_string()
                };
                self.bar.println(format!("  {} {file}  {}", red("✗"), red(&msg)));
            }
        }
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total: usize, _success: usize) {
        self.bar.finish_and_clear();
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Capture a scanned document (extract + save to the record store)
  docintel capture historia-clinica.png

  # Extract only, no save, export the text as CSV next to the image
  docintel capture scan.jpg --no-save --csv .

  # Capture every scan in a folder, 8 at a time
  docintel capture ./scans --concurrency 8

  # Capture from a URL
  docintel capture https://example.org/scans/cedula.jpg

  # Look a patient up by cédula and show the health tab
  docintel search 1122334455 --tab health

  # Machine-readable output
  docintel capture scan.png --json
  docintel search "Ana María" --json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY       AI service credential (API_KEY also accepted)
  DOCINTEL_API_BASE    Backend base URL (default: http://localhost:3001)
  DOCINTEL_MODEL       Vision model ID (default: gemini-2.5-flash)

SETUP:
  1. Set the credential:   export GEMINI_API_KEY=AIza...
  2. Start your backend:   (serves /api/documents and /api/patients/search)
  3. Capture:              docintel capture scan.png
"#;

/// Patient document capture, AI text extraction, and record search.
#[derive(Parser, Debug)]
#[command(
    name = "docintel",
    version,
    about = "Capture patient documents, extract their text with a vision model, and search records",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL.
    #[arg(long, global = true, env = "DOCINTEL_API_BASE")]
    api_base: Option<String>,

    /// Output structured JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture one image (file or URL) or a folder of scans.
    Capture {
        /// Image file path, HTTP/HTTPS URL, or directory of scans.
        input: String,

        /// Extract only; do not persist to the record store.
        #[arg(long)]
        no_save: bool,

        /// Export the extracted text as CSV into this directory.
        #[arg(long, value_name = "DIR")]
        csv: Option<PathBuf>,

        /// Skip deterministic cleanup of the model output.
        #[arg(long)]
        raw: bool,

        /// Concurrent extractions in batch mode.
        #[arg(short, long, env = "DOCINTEL_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// Vision model ID.
        #[arg(long, env = "DOCINTEL_MODEL")]
        model: Option<String>,

        /// Per-request timeout in seconds.
        #[arg(long, default_value_t = 60)]
        api_timeout: u64,

        /// Download timeout for URL inputs in seconds.
        #[arg(long, default_value_t = 120)]
        download_timeout: u64,
    },

    /// Search patient records by name or cédula.
    Search {
        /// Search term.
        query: String,

        /// Show only one profile tab: personal, sociodemographic, academic,
        /// health, or employment.
        #[arg(long, value_enum)]
        tab: Option<TabArg>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TabArg {
    Personal,
    Sociodemographic,
    Academic,
    Health,
    Employment,
}

impl From<TabArg> for ProfileTab {
    fn from(v: TabArg) -> Self {
        match v {
            TabArg::Personal => ProfileTab::Personal,
            TabArg::Sociodemographic => ProfileTab::Sociodemographic,
            TabArg::Academic => ProfileTab::Academic,
            TabArg::Health => ProfileTab::Health,
            TabArg::Employment => ProfileTab::Employment,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar and result output provide the feedback that matters;
    // library logs stay quiet unless asked for.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let mut config = PortalConfig::from_env();
    if let Some(ref base) = cli.api_base {
        config.api_base_url = base.trim_end_matches('/').to_string();
    }

    match cli.command {
        Command::Capture {
            input,
            no_save,
            csv,
            raw,
            concurrency,
            model,
            api_timeout,
            download_timeout,
        } => {
            config.save = !no_save;
            config.clean_output = !raw;
            config.concurrency = concurrency.max(1);
            config.api_timeout_secs = api_timeout.max(1);
            config.download_timeout_secs = download_timeout.max(1);
            if let Some(m) = model {
                config.model = m;
            }
            run_capture_command(&input, csv.as_deref(), config, cli.json, cli.quiet).await
        }
        Command::Search { query, tab } => {
            run_search_command(&query, tab.map(Into::into), &config, cli.json).await
        }
    }
}

// ── capture ──────────────────────────────────────────────────────────────────

async fn run_capture_command(
    input: &str,
    csv_dir: Option<&Path>,
    mut config: PortalConfig,
    json: bool,
    quiet: bool,
) -> Result<()> {
    // Credential is checked here, before any acquisition work.
    let extraction = ExtractionClient::new(&config)?;
    let api = ApiClient::new(&config)?;

    let path = Path::new(input);
    if path.is_dir() {
        let files = list_scan_files(path)?;
        if files.is_empty() {
            bail!("No files found in '{input}'");
        }
        if !quiet && !json {
            config.progress = Some(CliProgress::new());
        }

        let report = run_capture_batch(&files, &extraction, &api, &config).await;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            let ok = report.stats.total_files - report.stats.failed;
            let line = format!(
                "{}/{} files captured  ({} saved, {} failed)  in {:.1}s",
                ok,
                report.stats.total_files,
                report.stats.saved,
                report.stats.failed,
                report.stats.total_duration_ms as f64 / 1000.0,
            );
            if report.stats.failed == 0 {
                eprintln!("{} {}", green("✔"), bold(&line));
            } else {
                eprintln!("{} {}", red("⚠"), bold(&line));
            }
        }
        if report.stats.failed > 0 {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Single image (file or URL).
    let image = docintel::capture::input::acquire(input, config.download_timeout_secs).await?;
    let base_name = image.base_name().to_string();

    let mut session = CaptureSession::new();
    let outcome = run_capture(&mut session, image, &extraction, &api, &config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        if let Some(ref text) = outcome.text {
            println!("{text}");
        }
        match outcome.status {
            CaptureStatus::Saved => eprintln!(
                "{} {}  {}",
                green("✔"),
                bold("Saved to the record store"),
                dim(&format!(
                    "({} chars, extract {}ms, save {}ms)",
                    outcome.stats.text_chars, outcome.stats.extract_ms, outcome.stats.save_ms
                )),
            ),
            CaptureStatus::Extracted => eprintln!(
                "{} {}  {}",
                green("✔"),
                bold("Extracted (not saved)"),
                dim(&format!("({} chars)", outcome.stats.text_chars)),
            ),
            _ => {
                if let Some(ref err) = outcome.error {
                    eprintln!("{} {}", red("✘"), red(err));
                }
            }
        }
    }

    // CSV export works for any outcome with displayable text, matching the
    // download button that is available even after a save failure.
    if let Some(dir) = csv_dir {
        if outcome.status != CaptureStatus::ExtractionFailed {
            if let Some(ref text) = outcome.text {
                let path = docintel::capture::export::export_csv(text, &base_name, dir)?;
                if !json {
                    eprintln!("{} CSV written to {}", cyan("◆"), path.display());
                }
            }
        }
    }

    if matches!(
        outcome.status,
        CaptureStatus::ExtractionFailed | CaptureStatus::SaveFailed
    ) {
        std::process::exit(1);
    }
    Ok(())
}

/// Regular files in the directory, sorted by name. Content validation happens
/// per file inside the batch; non-images are reported as rejected there.
fn list_scan_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| !n.starts_with('.'))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

// ── search ───────────────────────────────────────────────────────────────────

async fn run_search_command(
    query: &str,
    tab: Option<ProfileTab>,
    config: &PortalConfig,
    json: bool,
) -> Result<()> {
    let api = ApiClient::new(config)?;
    let mut session = SearchSession::new();
    session.run(&api, query).await;

    match session.status() {
        SearchStatus::Idle => {
            bail!("Please enter a non-empty search term.");
        }
        SearchStatus::Error => {
            let message = session.error().unwrap_or("Search failed.").to_string();
            bail!("{message}");
        }
        SearchStatus::NotFound => {
            if json {
                println!("[]");
            } else {
                eprintln!(
                    "{} No patient matched \"{}\".",
                    red("✘"),
                    session.query()
                );
            }
            std::process::exit(1);
        }
        SearchStatus::Success => {
            if json {
                println!("{}", serde_json::to_string_pretty(session.results())?);
                return Ok(());
            }
            for patient in session.results().iter().cloned() {
                let mut view = ProfileView::new(patient);
                let (name, cedula) = view.header();
                println!("{}  {}", bold(name), dim(&format!("Cédula: {cedula}")));

                let tabs: Vec<ProfileTab> = match tab {
                    Some(t) => vec![t],
                    None => ProfileTab::ALL.to_vec(),
                };
                for t in tabs {
                    view.select(t);
                    println!("  {}", cyan(view.active_tab().label()));
                    for (label, value) in view.fields() {
                        let shown = if value.is_empty() { "N/A".to_string() } else { value };
                        println!("    {:<22} {}", dim(label), shown);
                    }
                }
                println!();
            }
        }
        SearchStatus::Loading => unreachable!("run() always resolves the session"),
    }
    Ok(())
}
