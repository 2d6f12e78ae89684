//! Error types for the formbinder library.
//!
//! Every failure in a run is fatal: there is no partial-success mode, so a
//! single [`BinderError`] type covers the whole pipeline. Callers report it
//! once and stop.
//!
//! Finding no new submissions is *not* an error. It is reported through
//! [`crate::run::RunOutcome::NoNewSubmissions`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the formbinder library.
#[derive(Debug, Error)]
pub enum BinderError {
    // ── Retrieval errors ──────────────────────────────────────────────────
    /// The submissions endpoint could not be reached or returned a bad status.
    #[error("Failed to fetch submissions for form '{form_id}': {reason}\nCheck your internet connection and API key.")]
    RetrievalFailed { form_id: String, reason: String },

    /// The submissions request exceeded the configured timeout.
    #[error("Fetching submissions for form '{form_id}' timed out after {secs}s\nIncrease --timeout.")]
    RetrievalTimeout { form_id: String, secs: u64 },

    /// JotForm answered, but with a non-200 `responseCode`.
    #[error("JotForm API error {code}: {message}")]
    ApiError { code: u16, message: String },

    /// The response body was not the JSON shape we expect.
    #[error("Malformed submissions response: {detail}")]
    MalformedResponse { detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The cutoff date is not in `MM/DD/YYYY` form.
    #[error("Invalid date '{input}': expected MM/DD/YYYY (for example 01/13/2017)")]
    DateParse { input: String },

    /// The cutoff date could not be read from the terminal or stdin.
    #[error("Could not read the cutoff date: {detail}\nPass it with --since MM/DD/YYYY instead.")]
    CutoffInput { detail: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// A template failed to load, compile, or render.
    #[error("Template '{name}' failed: {detail}")]
    Template { name: String, detail: String },

    /// The assembler was handed zero fragments.
    #[error("No records to assemble into a document")]
    NothingToAssemble,

    // ── Export errors ─────────────────────────────────────────────────────
    /// The PDF converter binary could not be located.
    #[error("PDF converter '{command}' not found.\nInstall wkhtmltopdf or pass --wkhtmltopdf <PATH>.")]
    ExporterNotFound { command: String },

    /// The PDF converter ran but exited unsuccessfully.
    #[error("PDF conversion failed: {detail}")]
    ExportFailed { detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The TOML config file could not be read or parsed.
    #[error("Failed to load config file '{path}': {detail}")]
    ConfigFile { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BinderError {
    /// Wrap a handlebars failure for the named template.
    pub(crate) fn template(name: &str, detail: impl std::fmt::Display) -> Self {
        BinderError::Template {
            name: name.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_parse_display_shows_expected_format() {
        let e = BinderError::DateParse {
            input: "2017-01-13".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("2017-01-13"), "got: {msg}");
        assert!(msg.contains("MM/DD/YYYY"), "got: {msg}");
    }

    #[test]
    fn cutoff_input_display_suggests_since() {
        let e = BinderError::CutoffInput {
            detail: "stream did not contain valid UTF-8".into(),
        };
        assert!(e.to_string().contains("--since"));
    }

    #[test]
    fn retrieval_timeout_display() {
        let e = BinderError::RetrievalTimeout {
            form_id: "12345".into(),
            secs: 60,
        };
        assert!(e.to_string().contains("60s"));
        assert!(e.to_string().contains("12345"));
    }

    #[test]
    fn api_error_display() {
        let e = BinderError::ApiError {
            code: 401,
            message: "You're not authorized to use (/form-id/submissions)".into(),
        };
        assert!(e.to_string().contains("401"));
        assert!(e.to_string().contains("not authorized"));
    }

    #[test]
    fn template_helper_builds_named_error() {
        let e = BinderError::template("record", "unclosed tag");
        assert!(matches!(e, BinderError::Template { ref name, .. } if name == "record"));
        assert!(e.to_string().contains("unclosed tag"));
    }
}
