//! Configuration types for a formbinder run.
//!
//! All run behaviour is controlled through [`BinderConfig`], built via its
//! [`BinderConfigBuilder`]. Values can also come from a TOML file
//! ([`FileConfig`]); the CLI layers its flags on top of the file.

use crate::error::BinderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default JotForm API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.jotform.com";

/// Configuration for one print run.
///
/// # Example
/// ```rust
/// use formbinder::BinderConfig;
///
/// let config = BinderConfig::builder()
///     .api_key("0123456789abcdef")
///     .form_id("70123456789012")
///     .build()
///     .unwrap();
/// assert_eq!(config.output_path.to_str(), Some("output.pdf"));
/// ```
#[derive(Clone)]
pub struct BinderConfig {
    /// JotForm API key. Required.
    pub api_key: String,

    /// ID of the form whose submissions are printed. Required.
    pub form_id: String,

    /// Base URL of the JotForm API. Default: `https://api.jotform.com`.
    ///
    /// Accounts on the EU or HIPAA clusters use `https://eu-api.jotform.com`
    /// or `https://hipaa-api.jotform.com`.
    pub api_base_url: String,

    /// Submissions requested per page of the listing endpoint. Default: 1000.
    pub page_limit: usize,

    /// Per-request HTTP timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Directory holding `page.html`, `record.html`, `health_checkin.html`
    /// and `payments.html`. If None, the built-in templates are used.
    pub templates_dir: Option<PathBuf>,

    /// How answer values are inserted into the markup. Default: trusted raw.
    pub value_insertion: ValueInsertion,

    /// Page size, orientation and margins handed to the PDF converter.
    pub page_options: PageOptions,

    /// Path or name of the `wkhtmltopdf` executable. Default: `wkhtmltopdf`.
    pub wkhtmltopdf_path: PathBuf,

    /// Where the PDF is written. Default: `output.pdf`.
    pub output_path: PathBuf,

    /// Also write the assembled HTML here (useful when tuning templates).
    pub save_html: Option<PathBuf>,

    /// Open the PDF with the system viewer when done. Default: true.
    pub open_viewer: bool,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            form_id: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_limit: 1000,
            request_timeout_secs: 60,
            templates_dir: None,
            value_insertion: ValueInsertion::default(),
            page_options: PageOptions::default(),
            wkhtmltopdf_path: PathBuf::from("wkhtmltopdf"),
            output_path: PathBuf::from("output.pdf"),
            save_html: None,
            open_viewer: true,
        }
    }
}

impl fmt::Debug for BinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("form_id", &self.form_id)
            .field("api_base_url", &self.api_base_url)
            .field("page_limit", &self.page_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("templates_dir", &self.templates_dir)
            .field("value_insertion", &self.value_insertion)
            .field("page_options", &self.page_options)
            .field("wkhtmltopdf_path", &self.wkhtmltopdf_path)
            .field("output_path", &self.output_path)
            .field("save_html", &self.save_html)
            .field("open_viewer", &self.open_viewer)
            .finish()
    }
}

impl BinderConfig {
    /// Create a new builder for `BinderConfig`.
    pub fn builder() -> BinderConfigBuilder {
        BinderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BinderConfig`].
#[derive(Debug)]
pub struct BinderConfigBuilder {
    config: BinderConfig,
}

impl BinderConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn form_id(mut self, id: impl Into<String>) -> Self {
        self.config.form_id = id.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn page_limit(mut self, n: usize) -> Self {
        self.config.page_limit = n.clamp(1, 1000);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.templates_dir = Some(dir.into());
        self
    }

    pub fn value_insertion(mut self, mode: ValueInsertion) -> Self {
        self.config.value_insertion = mode;
        self
    }

    pub fn page_options(mut self, options: PageOptions) -> Self {
        self.config.page_options = options;
        self
    }

    pub fn wkhtmltopdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wkhtmltopdf_path = path.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn save_html(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.save_html = Some(path.into());
        self
    }

    pub fn open_viewer(mut self, v: bool) -> Self {
        self.config.open_viewer = v;
        self
    }

    /// Fill in every value the file provides. Call before the per-flag
    /// setters so flags win over the file.
    pub fn apply_file(mut self, file: &FileConfig) -> Self {
        if let Some(ref key) = file.api_key {
            self = self.api_key(key.clone());
        }
        if let Some(ref id) = file.form_id {
            self = self.form_id(id.clone());
        }
        if let Some(ref url) = file.api_base_url {
            self = self.api_base_url(url.clone());
        }
        if let Some(n) = file.page_limit {
            self = self.page_limit(n);
        }
        if let Some(secs) = file.request_timeout_secs {
            self = self.request_timeout_secs(secs);
        }
        if let Some(ref dir) = file.templates_dir {
            self = self.templates_dir(dir.clone());
        }
        if let Some(true) = file.escape_values {
            self = self.value_insertion(ValueInsertion::Escaped);
        }
        if let Some(ref exe) = file.wkhtmltopdf {
            self = self.wkhtmltopdf_path(exe.clone());
        }
        if let Some(ref out) = file.output {
            self = self.output_path(out.clone());
        }
        if let Some(ref html) = file.save_html {
            self = self.save_html(html.clone());
        }
        if let Some(open) = file.open_viewer {
            self = self.open_viewer(open);
        }
        if let Some(ref page) = file.page {
            self.config.page_options = page.clone();
        }
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BinderConfig, BinderError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(BinderError::InvalidConfig(
                "API key is required (--api-key or JOTFORM_API_KEY)".into(),
            ));
        }
        if c.form_id.trim().is_empty() {
            return Err(BinderError::InvalidConfig(
                "Form ID is required (--form-id or JOTFORM_FORM_ID)".into(),
            ));
        }
        if !c.api_base_url.starts_with("http://") && !c.api_base_url.starts_with("https://") {
            return Err(BinderError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(BinderError::InvalidConfig("Timeout must be ≥ 1 second".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How answer values reach the markup.
///
/// Submitted values are inserted verbatim by default so the printout shows
/// exactly what was typed, markup included. `Escaped` HTML-escapes each value
/// first; the `---` missing marker and labels are never escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueInsertion {
    /// Insert values unchanged. (default)
    #[default]
    TrustedRaw,
    /// HTML-escape values before insertion.
    Escaped,
}

/// Paper size understood by `wkhtmltopdf --page-size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    Letter,
    Legal,
    A4,
}

impl PageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
            PageSize::A4 => "A4",
        }
    }
}

/// Page orientation understood by `wkhtmltopdf --orientation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

/// Presentational options for the PDF converter.
///
/// Margins are passed through as unit strings (`"8mm"`, `"0.5in"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    pub size: PageSize,
    pub orientation: Orientation,
    pub margin_top: String,
    pub margin_bottom: String,
    pub margin_left: String,
    pub margin_right: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            size: PageSize::Letter,
            orientation: Orientation::Landscape,
            margin_top: "8mm".to_string(),
            margin_bottom: "8mm".to_string(),
            margin_left: "8mm".to_string(),
            margin_right: "8mm".to_string(),
        }
    }
}

// ── Config file ──────────────────────────────────────────────────────────

/// Contents of an optional `formbinder.toml`.
///
/// ```toml
/// api_key = "0123456789abcdef"
/// form_id = "70123456789012"
/// wkhtmltopdf = 'C:\Program Files\wkhtmltopdf\bin\wkhtmltopdf.exe'
///
/// [page]
/// orientation = "Landscape"
/// margin_top = "8mm"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub form_id: Option<String>,
    pub api_base_url: Option<String>,
    pub page_limit: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub templates_dir: Option<PathBuf>,
    pub escape_values: Option<bool>,
    pub wkhtmltopdf: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub save_html: Option<PathBuf>,
    pub open_viewer: Option<bool>,
    pub page: Option<PageOptions>,
}

impl FileConfig {
    /// Load a config file. A missing file yields the empty config.
    pub fn load_from(path: &Path) -> Result<Self, BinderError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| BinderError::ConfigFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| BinderError::ConfigFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}
