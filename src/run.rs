//! Run entry points.
//!
//! [`build_document`] is the synchronous core: filter, normalize, render and
//! assemble an already-fetched batch. [`run`] wraps it with the collaborators:
//! it awaits the submission listing and the cutoff date together, then
//! exports the document and optionally opens it.
//!
//! Either the whole batch ends up in one document or the run fails; there is
//! no partial output.

use crate::config::BinderConfig;
use crate::error::BinderError;
use crate::pipeline::assemble::assemble;
use crate::pipeline::export::{open_in_viewer, save_html, Exporter};
use crate::pipeline::filter::select_new;
use crate::pipeline::normalize::normalize;
use crate::pipeline::render::{render_record, TemplateEngine};
use crate::pipeline::source::{CutoffSource, SubmissionSource};
use crate::submission::{Document, DocumentFragment, RawSubmission};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was created after the cutoff. Not an error.
    NoNewSubmissions { fetched: usize },
    /// A document was produced and exported.
    Printed(RunReport),
}

/// Summary of a run that produced a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Submissions returned by the source.
    pub fetched: usize,
    /// Submissions rendered into the document.
    pub printed: usize,
    /// The cutoff the batch was filtered against.
    pub cutoff: NaiveDate,
    /// File written by the exporter.
    pub output: PathBuf,
    /// Debug copy of the HTML, if one was requested.
    pub html_copy: Option<PathBuf>,
    pub duration_ms: u64,
}

/// Filter, normalize, render and assemble one batch.
///
/// Returns `Ok(None)` when no submission is newer than `cutoff`; the
/// renderer and assembler are not touched in that case.
pub fn build_document(
    engine: &TemplateEngine,
    submissions: Vec<RawSubmission>,
    cutoff: NaiveDate,
) -> Result<Option<Document>, BinderError> {
    let fetched = submissions.len();
    let selected = select_new(submissions, cutoff);
    if selected.is_empty() {
        info!("No submissions after {} (of {} fetched)", cutoff, fetched);
        return Ok(None);
    }
    info!(
        "Found {} new submission(s) after {}",
        selected.len(),
        cutoff
    );

    let fragments = selected
        .iter()
        .map(|raw| {
            let record = normalize(raw);
            debug!("Rendering submission {} ({} fields)", raw.id, record.len());
            render_record(engine, &record)
        })
        .collect::<Result<Vec<DocumentFragment>, _>>()?;

    assemble(engine, &fragments).map(Some)
}

/// Execute a full run against the given collaborators.
///
/// Templates are compiled before anything is fetched so a broken template
/// fails fast, before the operator is asked for a date.
pub async fn run<S, C, E>(
    config: &BinderConfig,
    source: &S,
    cutoff_source: &C,
    exporter: &E,
) -> Result<RunOutcome, BinderError>
where
    S: SubmissionSource,
    C: CutoffSource,
    E: Exporter,
{
    let start = Instant::now();
    let engine = TemplateEngine::from_config(config)?;

    // ── Step 1: Inputs, concurrently ─────────────────────────────────────
    let (submissions, cutoff) = tokio::try_join!(
        source.fetch_submissions(&config.form_id),
        cutoff_source.cutoff()
    )?;
    let fetched = submissions.len();

    // ── Step 2: Build the document ───────────────────────────────────────
    let document = match build_document(&engine, submissions, cutoff)? {
        Some(doc) => doc,
        None => return Ok(RunOutcome::NoNewSubmissions { fetched }),
    };

    // ── Step 3: Export ───────────────────────────────────────────────────
    if let Some(ref html_path) = config.save_html {
        save_html(&document, html_path).await?;
    }

    let output = exporter
        .export(&document, &config.page_options, &config.output_path)
        .await?;

    if config.open_viewer {
        info!("Opening {}", output.display());
        open_in_viewer(&output);
    }

    Ok(RunOutcome::Printed(RunReport {
        fetched,
        printed: document.record_count,
        cutoff,
        output,
        html_copy: config.save_html.clone(),
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}
