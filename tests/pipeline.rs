//! End-to-end tests for the formbinder run.
//!
//! The JotForm API, the operator prompt and wkhtmltopdf are replaced by
//! in-memory implementations of the collaborator traits, so these run
//! offline and without external binaries.

use chrono::{NaiveDate, NaiveDateTime};
use formbinder::{
    build_document, run, Answer, BinderConfig, BinderError, CutoffSource, Document, Exporter,
    FixedCutoff, PageOptions, RawSubmission, RunOutcome, SubmissionSource, TemplateEngine,
    TemplateSources, ValueInsertion,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn cutoff() -> FixedCutoff {
    FixedCutoff(NaiveDate::from_ymd_opt(2017, 1, 13).unwrap())
}

fn config(dir: &Path) -> BinderConfig {
    BinderConfig::builder()
        .api_key("test-key")
        .form_id("70123456789012")
        .output_path(dir.join("output.pdf"))
        .open_viewer(false)
        .build()
        .unwrap()
}

fn staff(id: &str, created_at: NaiveDateTime, name: &str) -> RawSubmission {
    RawSubmission::new(id, created_at)
        .with_answer("3", Answer::new("Full Name", name.to_lowercase()).with_pretty(name))
        .with_answer("4", Answer::new("T-Shirt Size", "L"))
}

/// Records every document it is asked to export.
#[derive(Default)]
struct RecordingExporter {
    calls: AtomicUsize,
    last: Mutex<Option<Document>>,
}

impl RecordingExporter {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn html(&self) -> String {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|d| d.html.clone())
            .expect("exporter was not called")
    }
}

impl Exporter for RecordingExporter {
    async fn export(
        &self,
        document: &Document,
        _options: &PageOptions,
        output: &Path,
    ) -> Result<PathBuf, BinderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(document.clone());
        Ok(output.to_path_buf())
    }
}

struct FailingSource;

impl SubmissionSource for FailingSource {
    async fn fetch_submissions(&self, form_id: &str) -> Result<Vec<RawSubmission>, BinderError> {
        Err(BinderError::RetrievalFailed {
            form_id: form_id.to_string(),
            reason: "connection refused".into(),
        })
    }
}

struct BadDate;

impl CutoffSource for BadDate {
    async fn cutoff(&self) -> Result<NaiveDate, BinderError> {
        formbinder::pipeline::filter::parse_cutoff("13/01/2017")
    }
}

/// An operator who never answers.
struct NeverAnswers;

impl CutoffSource for NeverAnswers {
    async fn cutoff(&self) -> Result<NaiveDate, BinderError> {
        std::future::pending().await
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_the_submission_after_cutoff_is_printed() {
    let dir = tempfile::tempdir().unwrap();
    let source = vec![
        staff("old", at(2017, 1, 10, 9), "Old Timer"),
        staff("new", at(2017, 1, 14, 9), "Jane Doe"),
    ];
    let exporter = RecordingExporter::default();

    let outcome = run(&config(dir.path()), &source, &cutoff(), &exporter)
        .await
        .unwrap();

    let report = match outcome {
        RunOutcome::Printed(r) => r,
        other => panic!("expected Printed, got {other:?}"),
    };
    assert_eq!(report.fetched, 2);
    assert_eq!(report.printed, 1);
    assert_eq!(report.output, dir.path().join("output.pdf"));

    let html = exporter.html();
    assert_eq!(html.matches("<div class=\"record\">").count(), 1);
    assert!(html.contains("Jane Doe"));
    assert!(!html.contains("Old Timer"));
}

#[tokio::test]
async fn nothing_new_reports_and_skips_export() {
    let dir = tempfile::tempdir().unwrap();
    let source = vec![
        staff("a", at(2017, 1, 2, 9), "A"),
        staff("b", at(2017, 1, 12, 23), "B"),
    ];
    let exporter = RecordingExporter::default();

    let outcome = run(&config(dir.path()), &source, &cutoff(), &exporter)
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NoNewSubmissions { fetched: 2 });
    assert_eq!(exporter.calls(), 0);
    assert!(!dir.path().join("output.pdf").exists());
}

#[tokio::test]
async fn empty_listing_is_no_new_submissions() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = RecordingExporter::default();
    let outcome = run(&config(dir.path()), &Vec::<RawSubmission>::new(), &cutoff(), &exporter)
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::NoNewSubmissions { fetched: 0 });
    assert_eq!(exporter.calls(), 0);
}

#[tokio::test]
async fn blank_pretty_answer_prints_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let source = vec![staff("s", at(2017, 1, 20, 9), "Jane Doe")
        .with_answer("9", Answer::new("Allergies", "").with_pretty(""))];
    let exporter = RecordingExporter::default();

    run(&config(dir.path()), &source, &cutoff(), &exporter)
        .await
        .unwrap();

    let html = exporter.html();
    assert!(html.contains("<p>Allergies: ---</p>"), "{html}");
}

#[tokio::test]
async fn absent_field_prints_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let source = vec![staff("s", at(2017, 1, 20, 9), "Jane Doe")];
    let exporter = RecordingExporter::default();

    run(&config(dir.path()), &source, &cutoff(), &exporter)
        .await
        .unwrap();

    assert!(exporter.html().contains("<p>Emergency Contact: ---</p>"));
}

#[tokio::test]
async fn records_keep_retrieval_order() {
    let dir = tempfile::tempdir().unwrap();
    let source = vec![
        staff("3", at(2017, 1, 30, 9), "Charlie Third"),
        staff("1", at(2017, 1, 14, 9), "Alice First"),
        staff("2", at(2017, 1, 20, 9), "Bob Second"),
    ];
    let exporter = RecordingExporter::default();

    run(&config(dir.path()), &source, &cutoff(), &exporter)
        .await
        .unwrap();

    let html = exporter.html();
    let c = html.find("Charlie Third").unwrap();
    let a = html.find("Alice First").unwrap();
    let b = html.find("Bob Second").unwrap();
    assert!(c < a && a < b);
}

#[tokio::test]
async fn escaped_labels_are_matched_by_templates() {
    let dir = tempfile::tempdir().unwrap();
    let source = vec![RawSubmission::new("s", at(2017, 1, 20, 9)).with_answer(
        "12",
        Answer::new("Relationship to Staff Member", "Mother &amp; guardian"),
    )
    .with_answer("13", Answer::new("Emergency&#32;Contact", "Mary Doe"))];
    let exporter = RecordingExporter::default();

    run(&config(dir.path()), &source, &cutoff(), &exporter)
        .await
        .unwrap();

    let html = exporter.html();
    assert!(html.contains("<p>Emergency Contact: <span class=\"underline\">Mary Doe</span></p>"));
    // Values are inserted as submitted.
    assert!(html.contains("Mother &amp; guardian"));
}

#[tokio::test]
async fn save_html_writes_debug_copy() {
    let dir = tempfile::tempdir().unwrap();
    let html_path = dir.path().join("output.html");
    let config = BinderConfig::builder()
        .api_key("k")
        .form_id("1")
        .output_path(dir.path().join("output.pdf"))
        .save_html(&html_path)
        .open_viewer(false)
        .build()
        .unwrap();
    let exporter = RecordingExporter::default();

    let outcome = run(&config, &vec![staff("s", at(2017, 2, 1, 9), "Jane Doe")], &cutoff(), &exporter)
        .await
        .unwrap();

    let written = std::fs::read_to_string(&html_path).unwrap();
    assert_eq!(written, exporter.html());
    match outcome {
        RunOutcome::Printed(r) => assert_eq!(r.html_copy, Some(html_path)),
        other => panic!("expected Printed, got {other:?}"),
    }
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn retrieval_failure_aborts_without_export() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = RecordingExporter::default();
    let err = run(&config(dir.path()), &FailingSource, &cutoff(), &exporter)
        .await
        .unwrap_err();
    assert!(matches!(err, BinderError::RetrievalFailed { .. }));
    assert_eq!(exporter.calls(), 0);
}

#[tokio::test]
async fn retrieval_failure_does_not_wait_for_the_date() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = RecordingExporter::default();
    let err = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        run(&config(dir.path()), &FailingSource, &NeverAnswers, &exporter),
    )
    .await
    .expect("run waited on the pending date")
    .unwrap_err();
    assert!(matches!(err, BinderError::RetrievalFailed { .. }));
    assert_eq!(exporter.calls(), 0);
}

#[tokio::test]
async fn bad_cutoff_aborts_without_export() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = RecordingExporter::default();
    let source = vec![staff("s", at(2017, 2, 1, 9), "Jane Doe")];
    let err = run(&config(dir.path()), &source, &BadDate, &exporter)
        .await
        .unwrap_err();
    assert!(matches!(err, BinderError::DateParse { .. }));
    assert_eq!(exporter.calls(), 0);
}

#[tokio::test]
async fn broken_template_dir_fails_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    std::fs::create_dir(&templates).unwrap();
    for (file, body) in [
        ("page.html", "{{records}}"),
        ("record.html", "{{#each}}"),
        ("health_checkin.html", ""),
        ("payments.html", ""),
    ] {
        std::fs::write(templates.join(file), body).unwrap();
    }
    let config = BinderConfig::builder()
        .api_key("k")
        .form_id("1")
        .templates_dir(&templates)
        .open_viewer(false)
        .build()
        .unwrap();
    let exporter = RecordingExporter::default();

    // FailingSource would surface a retrieval error if it were reached.
    let err = run(&config, &FailingSource, &cutoff(), &exporter)
        .await
        .unwrap_err();
    assert!(matches!(err, BinderError::Template { .. }), "got {err:?}");
}

// ── Core without collaborators ───────────────────────────────────────────────

#[test]
fn build_document_returns_none_when_nothing_is_new() {
    let engine = TemplateEngine::new(&TemplateSources::builtin(), ValueInsertion::TrustedRaw).unwrap();
    let day = NaiveDate::from_ymd_opt(2017, 1, 13).unwrap();
    let exactly_at_cutoff = staff("edge", at(2017, 1, 13, 0), "Edge Case");
    assert!(build_document(&engine, vec![exactly_at_cutoff], day)
        .unwrap()
        .is_none());
}

#[test]
fn build_document_counts_records() {
    let engine = TemplateEngine::new(&TemplateSources::builtin(), ValueInsertion::TrustedRaw).unwrap();
    let day = NaiveDate::from_ymd_opt(2017, 1, 13).unwrap();
    let doc = build_document(
        &engine,
        vec![
            staff("a", at(2017, 1, 14, 9), "A A"),
            staff("b", at(2017, 1, 15, 9), "B B"),
        ],
        day,
    )
    .unwrap()
    .unwrap();
    assert_eq!(doc.record_count, 2);
    assert_eq!(doc.html.matches("<div class=\"record\">").count(), 2);
}
