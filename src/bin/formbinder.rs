//! CLI binary for formbinder.
//!
//! A thin shim over the library crate that maps CLI flags and the optional
//! TOML file to `BinderConfig`, asks for the cutoff date, and prints results.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dialoguer::Input;
use formbinder::pipeline::filter::parse_cutoff;
use formbinder::pipeline::source::read_cutoff_line;
use formbinder::{
    run, BinderConfig, BinderError, CutoffSource, FileConfig, FixedCutoff, HtmlExporter,
    JotformClient, Orientation, PageSize, RawSubmission, RunOutcome, RunReport,
    SubmissionSource, ValueInsertion, WkhtmltopdfExporter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

// ── Interactive cutoff prompt ────────────────────────────────────────────────

/// Asks the operator for the date the binder was last printed.
///
/// The prompt runs on a blocking thread so the submission download proceeds
/// while the operator types. Bad input is not re-prompted; it fails the run.
/// Without a terminal (`echo 01/13/2017 | formbinder`) one line is read from
/// stdin instead.
struct PromptCutoff;

impl CutoffSource for PromptCutoff {
    async fn cutoff(&self) -> Result<NaiveDate, BinderError> {
        tokio::task::spawn_blocking(|| {
            if !io::stdin().is_terminal() {
                return read_cutoff_line(io::stdin().lock());
            }
            let answer = Input::<String>::new()
                .with_prompt(">")
                .allow_empty(true)
                .interact_text()
                .map_err(|e| BinderError::CutoffInput {
                    detail: e.to_string(),
                })?;
            parse_cutoff(&answer)
        })
        .await
        .map_err(|e| BinderError::Internal(format!("Prompt task panicked: {}", e)))?
    }
}

// ── Spinner stages ───────────────────────────────────────────────────────────

const FETCH_MESSAGE: &str = "Downloading submissions…";
const BUILD_MESSAGE: &str = "Rendering and exporting…";

/// Moves the spinner on to the next stage once the download finishes.
struct Staged<'a, S> {
    inner: &'a S,
    spinner: Option<&'a ProgressBar>,
}

impl<S: SubmissionSource + Sync> SubmissionSource for Staged<'_, S> {
    async fn fetch_submissions(&self, form_id: &str) -> Result<Vec<RawSubmission>, BinderError> {
        let result = self.inner.fetch_submissions(form_id).await;
        if let Some(bar) = self.spinner {
            bar.set_message(BUILD_MESSAGE);
        }
        result
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask for the last print date, then build output.pdf and open it
  formbinder

  # Non-interactive
  formbinder --since 01/13/2017

  # Tune templates without running wkhtmltopdf
  formbinder --since 01/13/2017 --templates ./templates --html-only -o preview.html

CONFIG FILE (formbinder.toml):
  api_key      = "0123456789abcdef"
  form_id      = "70123456789012"
  wkhtmltopdf  = 'C:\Program Files\wkhtmltopdf\bin\wkhtmltopdf.exe'
  save_html    = "output.html"

  [page]
  size         = "Letter"
  orientation  = "Landscape"
  margin_top   = "8mm"

  Flags and environment variables override the file.

ENVIRONMENT VARIABLES:
  JOTFORM_API_KEY      JotForm API key
  JOTFORM_FORM_ID      Form whose submissions are printed
  JOTFORM_API_URL      API base URL (EU / HIPAA accounts)
  FORMBINDER_CONFIG    Config file path
  RUST_LOG             Log filter, e.g. formbinder=debug
"#;

/// Print new JotForm registration submissions as a binder-ready PDF.
#[derive(Parser, Debug)]
#[command(
    name = "formbinder",
    version,
    about = "Print new JotForm registration submissions as a binder-ready PDF",
    long_about = "Downloads the form's submissions from JotForm, keeps the ones created after the \
date you last printed, renders each through handlebars templates that mirror the paper form, \
and converts the result to a PDF with wkhtmltopdf.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "FORMBINDER_CONFIG", default_value = "formbinder.toml")]
    config: PathBuf,

    /// JotForm API key.
    #[arg(long, env = "JOTFORM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// JotForm form ID.
    #[arg(long, env = "JOTFORM_FORM_ID")]
    form_id: Option<String>,

    /// JotForm API base URL.
    #[arg(long, env = "JOTFORM_API_URL")]
    api_url: Option<String>,

    /// Last print date (MM/DD/YYYY). Prompts when omitted.
    #[arg(long)]
    since: Option<String>,

    /// Output file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory with page.html, record.html, health_checkin.html, payments.html.
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Also save the assembled HTML to this path.
    #[arg(long)]
    save_html: Option<PathBuf>,

    /// Write HTML to the output path instead of converting to PDF.
    #[arg(long)]
    html_only: bool,

    /// Do not open the result when done.
    #[arg(long)]
    no_open: bool,

    /// HTML-escape submitted values instead of inserting them verbatim.
    #[arg(long)]
    escape_values: bool,

    /// Path to the wkhtmltopdf executable.
    #[arg(long)]
    wkhtmltopdf: Option<PathBuf>,

    /// Page size.
    #[arg(long, value_enum)]
    page_size: Option<PageSizeArg>,

    /// Page orientation.
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// HTTP timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    Letter,
    Legal,
    A4,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::Legal => PageSize::Legal,
            PageSizeArg::A4 => PageSize::A4,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = try_main().await {
        eprintln!("Error: {e:?}");
        // An unanswered date prompt still holds a blocking thread, and the
        // runtime would wait for it on shutdown.
        std::process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO would interleave with the date prompt, so the default is WARN.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let source = JotformClient::new(&config).context("Failed to set up JotForm client")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let outcome = match cli.since {
        Some(ref since) => {
            let cutoff = FixedCutoff(parse_cutoff(since)?);
            let spinner = (!cli.quiet).then(new_spinner);
            let staged = Staged {
                inner: &source,
                spinner: spinner.as_ref(),
            };
            let outcome = execute(&cli, &config, &staged, &cutoff).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            outcome?
        }
        None => {
            if !cli.quiet {
                eprintln!("{}", bold(FETCH_MESSAGE));
                eprintln!("Enter the date submissions were last printed; everything after it will be printed now.");
                eprintln!("{}", dim("Example: 01/13/2017"));
            }
            execute(&cli, &config, &source, &PromptCutoff).await?
        }
    };

    match outcome {
        RunOutcome::NoNewSubmissions { fetched } => {
            if !cli.quiet {
                eprintln!(
                    "{} No new submissions {}",
                    cyan("◆"),
                    dim(&format!("({fetched} checked)"))
                );
            }
        }
        RunOutcome::Printed(report) => {
            if !cli.quiet {
                print_summary(&report, cli.html_only, config.page_options.size);
            }
        }
    }

    Ok(())
}

/// Run with the exporter the flags ask for.
async fn execute<S: SubmissionSource, C: CutoffSource>(
    cli: &Cli,
    config: &BinderConfig,
    source: &S,
    cutoff: &C,
) -> Result<RunOutcome> {
    let outcome = if cli.html_only {
        run(config, source, cutoff, &HtmlExporter).await
    } else {
        let exporter = WkhtmltopdfExporter::new(&config.wkhtmltopdf_path);
        run(config, source, cutoff, &exporter).await
    };
    outcome.context("Run failed")
}

fn new_spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Working");
    bar.set_message(FETCH_MESSAGE);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn print_summary(report: &RunReport, html_only: bool, page_size: PageSize) {
    eprintln!(
        "{}  {} new of {} submissions after {}  {}ms  →  {}",
        green("✔"),
        report.printed,
        report.fetched,
        report.cutoff.format("%m/%d/%Y"),
        report.duration_ms,
        bold(&report.output.display().to_string()),
    );
    if let Some(ref html) = report.html_copy {
        eprintln!("   {}", dim(&format!("HTML saved to {}", html.display())));
    }
    if !html_only {
        eprintln!();
        eprint!("{}", print_instructions(page_size));
    }
}

fn print_instructions(page_size: PageSize) -> String {
    format!(
        "To print the binder pages:\n  \
         1. Print the PDF using the system print dialog.\n  \
         2. Choose double-sided printing, flip on short edge.\n  \
         3. Check the page size is {} and click Print.\n",
        bold(page_size.as_str())
    )
}

/// Merge config file and CLI args into `BinderConfig`.
fn build_config(cli: &Cli) -> Result<BinderConfig> {
    let file = FileConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to read config {:?}", cli.config))?;

    let mut builder = BinderConfig::builder().apply_file(&file);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref id) = cli.form_id {
        builder = builder.form_id(id.clone());
    }
    if let Some(ref url) = cli.api_url {
        builder = builder.api_base_url(url.clone());
    }
    if let Some(ref out) = cli.output {
        builder = builder.output_path(out.clone());
    } else if cli.html_only {
        builder = builder.output_path("output.html");
    }
    if let Some(ref dir) = cli.templates {
        builder = builder.templates_dir(dir.clone());
    }
    if let Some(ref html) = cli.save_html {
        builder = builder.save_html(html.clone());
    }
    if let Some(ref exe) = cli.wkhtmltopdf {
        builder = builder.wkhtmltopdf_path(exe.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if cli.escape_values {
        builder = builder.value_insertion(ValueInsertion::Escaped);
    }
    if cli.no_open {
        builder = builder.open_viewer(false);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Page tweaks apply on top of whatever the file's [page] table set.
    if let Some(size) = cli.page_size {
        config.page_options.size = size.into();
    }
    if let Some(orientation) = cli.orientation {
        config.page_options.orientation = orientation.into();
    }

    Ok(config)
}
