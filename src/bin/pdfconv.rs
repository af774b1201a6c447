//! CLI binary for pdfconv.
//!
//! A thin shim over the library crate that maps CLI flags onto a
//! `WorkflowController` and walks it from file intake to a saved artifact.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfconv::{
    format_file_size, validate_with_limit, CandidateFile, ConversionRequest, Notifier,
    OutputFormat, Severity, SortOption, WorkflowCallback, WorkflowConfig, WorkflowController,
    DEFAULT_ENDPOINT, MAX_FILE_SIZE,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

// ── CLI callback using indicatif ─────────────────────────────────────────────

/// Shows a spinner for as long as a request is in flight.
struct CliCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        format!("{secs:.1}s")
    }
}

impl WorkflowCallback for CliCallback {
    fn on_submit(&self, request: &ConversionRequest) {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_style(style);
        self.bar.set_prefix("Processing your PDF…");
        self.bar.set_message(format!(
            "{} → {}  {}",
            request.file.name(),
            request.format,
            dim("this may take a few moments")
        ));
        self.bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
    }

    fn on_complete(&self, file_name: &str, bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}  {}  {}",
            green("✔"),
            bold(file_name),
            dim(&format_file_size(bytes as u64)),
            dim(&self.elapsed()),
        );
    }

    fn on_failure(&self, _message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} conversion failed after {}", red("✘"), self.elapsed());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert to Markdown in the current directory
  pdfconv invoice.pdf --format markdown

  # Spreadsheet sorted by unit price, custom layout, into ./out
  pdfconv invoice.pdf --format excel --sort unit_price --custom-format -o out

  # Validate only (no upload)
  pdfconv --check scan.pdf

  # Print the Markdown preview and a JSON summary
  pdfconv report.pdf --format markdown --preview --json

SORT OPTIONS:
  default      document order
  price        total amount, lowest first (alias: amount)
  unit_price   unit price, lowest first
  quantity     quantity, lowest first

LIMITS:
  Only files ending in .pdf are accepted, up to 10 MB.

ENVIRONMENT VARIABLES:
  PDFCONV_ENDPOINT     Conversion endpoint URL
  PDFCONV_OUTPUT_DIR   Directory for converted files
  PDFCONV_FORMAT       Default output format
  PDFCONV_SORT         Default sort order
  RUST_LOG             Log filter (overrides --verbose / --quiet)
"#;

/// Convert PDF files to Markdown or Excel through a conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "pdfconv",
    version,
    about = "Convert PDF files to Markdown or Excel through a conversion service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to convert.
    input: PathBuf,

    /// Output format.
    #[arg(short, long, env = "PDFCONV_FORMAT", value_enum, required_unless_present = "check")]
    format: Option<FormatArg>,

    /// Row ordering for tabular output.
    #[arg(short, long, env = "PDFCONV_SORT", value_enum, default_value = "default")]
    sort: SortArg,

    /// Apply the custom spreadsheet layout (excel only).
    #[arg(long, env = "PDFCONV_CUSTOM_FORMAT")]
    custom_format: bool,

    /// Conversion endpoint URL.
    #[arg(long, env = "PDFCONV_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Directory to save the converted file in.
    #[arg(short, long = "output-dir", env = "PDFCONV_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Only validate the file; do not upload it.
    #[arg(long)]
    check: bool,

    /// Print the start of a Markdown result to stdout.
    #[arg(long)]
    preview: bool,

    /// Characters shown by --preview.
    #[arg(long, default_value_t = 2000)]
    preview_chars: usize,

    /// Print a JSON summary to stdout.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDFCONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFCONV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    #[value(alias = "md")]
    Markdown,
    #[value(alias = "xlsx", alias = "spreadsheet")]
    Excel,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Excel => OutputFormat::Spreadsheet,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Default,
    #[value(alias = "amount")]
    Price,
    #[value(name = "unit_price", alias = "unit-price")]
    UnitPrice,
    Quantity,
}

impl From<SortArg> for SortOption {
    fn from(v: SortArg) -> Self {
        match v {
            SortArg::Default => SortOption::Default,
            SortArg::Price => SortOption::TotalAmount,
            SortArg::UnitPrice => SortOption::UnitPrice,
            SortArg::Quantity => SortOption::Quantity,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters while it is active,
    // so library INFO logs are suppressed unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let file = CandidateFile::from_path(&cli.input)
        .await
        .with_context(|| format!("Cannot open {}", cli.input.display()))?;

    // ── Check-only mode ──────────────────────────────────────────────────
    if cli.check {
        let name = file.name().to_string();
        let size = file.size();
        return match validate_with_limit(file, MAX_FILE_SIZE) {
            Ok(_) => {
                if !cli.quiet {
                    eprintln!(
                        "{} {}  {}",
                        green("✔"),
                        bold(&name),
                        dim(&format_file_size(size))
                    );
                }
                Ok(())
            }
            Err(reason) => {
                anyhow::bail!("{}: {}", name, reason.notification_text())
            }
        };
    }

    // ── Build controller ─────────────────────────────────────────────────
    let mut builder = WorkflowConfig::builder()
        .endpoint(cli.endpoint.clone())
        .output_dir(cli.output_dir.clone());
    if show_progress {
        builder = builder.callback(CliCallback::new() as Arc<dyn WorkflowCallback>);
    }
    let config = builder.build().context("Invalid configuration")?;
    let mut workflow = WorkflowController::new(config).context("Failed to set up client")?;

    // ── Walk the workflow ────────────────────────────────────────────────
    let intake = workflow.select_file(file);
    print_notification(workflow.notifier(), cli.quiet);
    intake.context("File not accepted")?;

    if !cli.quiet {
        if let Some(f) = workflow.selection().file() {
            eprintln!(
                "{} {}  {}",
                cyan("◆"),
                bold(f.name()),
                dim(&format_file_size(f.size()))
            );
        }
    }

    let format: OutputFormat = cli
        .format
        .context("--format is required unless --check is given")?
        .into();
    workflow.set_format(format)?;
    workflow.set_sort_option(cli.sort.into())?;
    if cli.custom_format {
        if format == OutputFormat::Spreadsheet {
            workflow.toggle_custom_format()?;
        } else if !cli.quiet {
            eprintln!("{} --custom-format only applies to excel output; ignoring", cyan("⚠"));
        }
    }

    let outcome = workflow.submit().await;
    print_notification(workflow.notifier(), cli.quiet);
    let artifact = outcome
        .context("Conversion failed")?
        .context("Nothing was submitted")?;

    let saved = workflow.download().await.context("Failed to save result")?;
    if !cli.quiet && !cli.json {
        eprintln!("   {}  {}", dim("saved to"), bold(&saved.display().to_string()));
    }

    if cli.preview {
        match artifact.preview(cli.preview_chars) {
            Some(text) => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(text.as_bytes())
                    .context("Failed to write to stdout")?;
                if !text.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
            None if !cli.quiet => {
                eprintln!("{} no preview for spreadsheet output", dim("·"));
            }
            None => {}
        }
    }

    if cli.json {
        if let Some(summary) = workflow.summary(Some(saved)) {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
            );
        }
    }

    Ok(())
}

/// Echo the visible notification to stderr.
fn print_notification(notifier: &Notifier, quiet: bool) {
    let Some(n) = notifier.current() else {
        return;
    };
    match n.severity() {
        Severity::Error => eprintln!("{} {}", red("✘"), red(n.text())),
        Severity::Success if !quiet => eprintln!("{} {}", green("✔"), n.text()),
        Severity::Success => {}
    }
}
