//! PDF export and viewing.
//!
//! The assembled HTML is written to a temporary file and handed to
//! `wkhtmltopdf` with the configured page size, orientation and margins.
//! The temp file lives in a `TempDir` that is removed when export returns.

use crate::config::PageOptions;
use crate::error::BinderError;
use crate::submission::Document;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Converts an assembled document into a file on disk.
pub trait Exporter {
    /// Write `document` to `output`, returning the path written.
    fn export(
        &self,
        document: &Document,
        options: &PageOptions,
        output: &Path,
    ) -> impl Future<Output = Result<PathBuf, BinderError>> + Send;
}

/// Drives the `wkhtmltopdf` command-line tool.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfExporter {
    command: PathBuf,
}

impl WkhtmltopdfExporter {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Resolve the executable, on `PATH` or as given.
    fn locate(&self) -> Result<PathBuf, BinderError> {
        which::which(&self.command).map_err(|_| BinderError::ExporterNotFound {
            command: self.command.display().to_string(),
        })
    }
}

impl Default for WkhtmltopdfExporter {
    fn default() -> Self {
        Self::new("wkhtmltopdf")
    }
}

/// Command-line arguments for `wkhtmltopdf`, input and output excluded.
pub fn page_args(options: &PageOptions) -> Vec<OsString> {
    [
        ("--page-size", options.size.as_str()),
        ("--orientation", options.orientation.as_str()),
        ("--margin-top", options.margin_top.as_str()),
        ("--margin-bottom", options.margin_bottom.as_str()),
        ("--margin-left", options.margin_left.as_str()),
        ("--margin-right", options.margin_right.as_str()),
    ]
    .into_iter()
    .flat_map(|(flag, value)| [OsString::from(flag), OsString::from(value)])
    .collect()
}

impl Exporter for WkhtmltopdfExporter {
    async fn export(
        &self,
        document: &Document,
        options: &PageOptions,
        output: &Path,
    ) -> Result<PathBuf, BinderError> {
        let exe = self.locate()?;

        let temp_dir = TempDir::new().map_err(|e| BinderError::Internal(e.to_string()))?;
        let html_path = temp_dir.path().join("binder.html");
        tokio::fs::write(&html_path, &document.html)
            .await
            .map_err(|e| BinderError::Internal(format!("Failed to write temp file: {}", e)))?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BinderError::OutputWriteFailed {
                    path: output.to_path_buf(),
                    source: e,
                })?;
        }

        debug!("Running {} for {} records", exe.display(), document.record_count);
        let result = Command::new(&exe)
            .arg("--quiet")
            .args(page_args(options))
            .arg(&html_path)
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| BinderError::ExportFailed {
                detail: format!("could not start {}: {}", exe.display(), e),
            })?;

        if !result.status.success() {
            return Err(BinderError::ExportFailed {
                detail: format!(
                    "{} exited with {}: {}",
                    exe.display(),
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim()
                ),
            });
        }

        info!("Wrote {}", output.display());
        Ok(output.to_path_buf())
    }
}

/// Writes the HTML itself instead of a PDF (`--html-only`).
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExporter;

impl Exporter for HtmlExporter {
    async fn export(
        &self,
        document: &Document,
        _options: &PageOptions,
        output: &Path,
    ) -> Result<PathBuf, BinderError> {
        save_html(document, output).await?;
        info!("Wrote {}", output.display());
        Ok(output.to_path_buf())
    }
}

/// Write the assembled HTML next to the PDF for template debugging.
pub async fn save_html(document: &Document, path: &Path) -> Result<(), BinderError> {
    tokio::fs::write(path, &document.html)
        .await
        .map_err(|e| BinderError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!("Saved HTML to {}", path.display());
    Ok(())
}

/// Open `path` with the platform's default handler. Fire-and-forget: the
/// viewer is spawned and not waited on, and failures are only logged.
pub fn open_in_viewer(path: &Path) {
    let (cmd, args): (&str, &[&str]) = if cfg!(target_os = "windows") {
        ("cmd", &["/C", "start", ""][..])
    } else if cfg!(target_os = "macos") {
        ("open", &[][..])
    } else {
        ("xdg-open", &[][..])
    };

    match std::process::Command::new(cmd)
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => debug!("Opened {} with {}", path.display(), cmd),
        Err(e) => warn!("Could not open {} with {}: {}", path.display(), cmd, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Orientation, PageSize};

    #[test]
    fn page_args_cover_size_orientation_and_margins() {
        let args: Vec<String> = page_args(&PageOptions::default())
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(
            args,
            vec![
                "--page-size", "Letter",
                "--orientation", "Landscape",
                "--margin-top", "8mm",
                "--margin-bottom", "8mm",
                "--margin-left", "8mm",
                "--margin-right", "8mm",
            ]
        );
    }

    #[test]
    fn page_args_follow_options() {
        let options = PageOptions {
            size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin_top: "1in".into(),
            ..PageOptions::default()
        };
        let args: Vec<String> = page_args(&options)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(&args[..6], &["--page-size", "A4", "--orientation", "Portrait", "--margin-top", "1in"]);
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let exporter = WkhtmltopdfExporter::new("/nonexistent/dir/wkhtmltopdf-not-here");
        let doc = Document {
            html: "<html></html>".into(),
            record_count: 1,
        };
        let dir = tempfile::tempdir().unwrap();
        let err = exporter
            .export(&doc, &PageOptions::default(), &dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, BinderError::ExporterNotFound { .. }));
    }

    #[tokio::test]
    async fn html_exporter_writes_markup_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("binder.html");
        let doc = Document {
            html: "<html>records</html>".into(),
            record_count: 2,
        };
        let written = HtmlExporter
            .export(&doc, &PageOptions::default(), &out)
            .await
            .unwrap();
        assert_eq!(written, out);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<html>records</html>");
    }

    #[tokio::test]
    async fn save_html_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.html");
        let doc = Document {
            html: "<p>hi</p>".into(),
            record_count: 1,
        };
        save_html(&doc, &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn save_html_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("output.html");
        let doc = Document {
            html: String::new(),
            record_count: 1,
        };
        let err = save_html(&doc, &path).await.unwrap_err();
        assert!(matches!(err, BinderError::OutputWriteFailed { .. }));
    }
}
