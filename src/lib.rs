//! # formbinder
//!
//! Print new JotForm registration submissions as a PDF that matches the
//! paper form, so online and handwritten registrations can share a binder.
//!
//! ## Pipeline Overview
//!
//! ```text
//! JotForm API ─┐
//!              ├─ 1. Inputs     submissions + cutoff date, awaited together
//! operator  ───┘
//!                 2. Filter     keep submissions created after the cutoff
//!                 3. Normalize  key answers by decoded question text
//!                 4. Render     record template + `field` helper per submission
//!                 5. Assemble   concatenate records into the page template
//!                 6. Export     wkhtmltopdf → output.pdf, open the viewer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formbinder::{run, BinderConfig, FixedCutoff, JotformClient, RunOutcome, WkhtmltopdfExporter};
//! use formbinder::pipeline::filter::parse_cutoff;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BinderConfig::builder()
//!         .api_key(std::env::var("JOTFORM_API_KEY")?)
//!         .form_id("70123456789012")
//!         .build()?;
//!     let source = JotformClient::new(&config)?;
//!     let cutoff = FixedCutoff(parse_cutoff("01/13/2017")?);
//!     let exporter = WkhtmltopdfExporter::new(&config.wkhtmltopdf_path);
//!
//!     match run(&config, &source, &cutoff, &exporter).await? {
//!         RunOutcome::NoNewSubmissions { .. } => println!("No new submissions."),
//!         RunOutcome::Printed(report) => println!("{} printed", report.printed),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Templates
//!
//! Four handlebars files drive the layout: `page.html` (receives
//! `{{records}}`), `record.html`, and the `health_checkin.html` /
//! `payments.html` partials (`{{> healthCheckin}}`, `{{> payments}}`).
//! Built-in versions ship with the crate; point
//! [`BinderConfig::templates_dir`] at a directory to override them.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `formbinder` binary (clap + anyhow + tracing-subscriber + dialoguer) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod run;
pub mod submission;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    BinderConfig, BinderConfigBuilder, FileConfig, Orientation, PageOptions, PageSize,
    ValueInsertion,
};
pub use error::BinderError;
pub use pipeline::export::{Exporter, HtmlExporter, WkhtmltopdfExporter};
pub use pipeline::render::{TemplateEngine, TemplateSources};
pub use pipeline::source::{CutoffSource, FixedCutoff, JotformClient, SubmissionSource};
pub use run::{build_document, run, RunOutcome, RunReport};
pub use submission::{Answer, Document, DocumentFragment, NormalizedRecord, RawSubmission};
