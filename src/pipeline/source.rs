//! Pipeline inputs: submissions and the cutoff date.
//!
//! Both are traits so the run can be driven by the JotForm API and a terminal
//! prompt in production, and by in-memory values in tests.
//!
//! ## JotForm listing
//!
//! `GET {base}/form/{id}/submissions?limit=…&offset=…`, with the key in the
//! `APIKEY` header so it never appears in a URL, returns
//!
//! ```json
//! { "responseCode": 200, "message": "success",
//!   "content": [ { "id": "…", "created_at": "2017-01-14 09:30:00",
//!                  "answers": { "3": { "text": "Full Name",
//!                                      "answer": {"first": "Jane", "last": "Doe"},
//!                                      "prettyFormat": "Jane Doe" } } } ],
//!   "resultSet": { "offset": 0, "limit": 1000, "count": 1 } }
//! ```
//!
//! Pages are requested until one comes back short. Submissions keep the
//! order the API lists them in.

use crate::config::BinderConfig;
use crate::error::BinderError;
use crate::submission::{Answer, QuestionId, RawSubmission};
use crate::pipeline::filter::parse_cutoff;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::BufRead;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timestamp layout of `created_at` in JotForm responses.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Anything that can list a form's submissions.
pub trait SubmissionSource {
    fn fetch_submissions(
        &self,
        form_id: &str,
    ) -> impl Future<Output = Result<Vec<RawSubmission>, BinderError>> + Send;
}

/// Anything that can supply the cutoff date.
pub trait CutoffSource {
    fn cutoff(&self) -> impl Future<Output = Result<NaiveDate, BinderError>> + Send;
}

/// A cutoff known up front, e.g. from `--since`.
#[derive(Debug, Clone, Copy)]
pub struct FixedCutoff(pub NaiveDate);

impl CutoffSource for FixedCutoff {
    async fn cutoff(&self) -> Result<NaiveDate, BinderError> {
        Ok(self.0)
    }
}

/// Read one line from `reader` and parse it as the cutoff date.
///
/// Used for piped input, where there is no terminal to prompt on. An empty
/// stream reads as an empty date and fails to parse.
pub fn read_cutoff_line(mut reader: impl BufRead) -> Result<NaiveDate, BinderError> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| BinderError::CutoffInput {
            detail: e.to_string(),
        })?;
    parse_cutoff(&line)
}

/// A fixed, already-fetched list of submissions.
impl SubmissionSource for Vec<RawSubmission> {
    async fn fetch_submissions(&self, _form_id: &str) -> Result<Vec<RawSubmission>, BinderError> {
        Ok(self.clone())
    }
}

// ── JotForm client ───────────────────────────────────────────────────────

/// HTTP client for the JotForm submissions endpoint.
pub struct JotformClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    page_limit: usize,
    timeout_secs: u64,
}

impl JotformClient {
    pub fn new(config: &BinderConfig) -> Result<Self, BinderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("formbinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BinderError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            page_limit: config.page_limit,
            timeout_secs: config.request_timeout_secs,
        })
    }

    async fn fetch_page(
        &self,
        form_id: &str,
        offset: usize,
    ) -> Result<SubmissionsPage, BinderError> {
        let url = format!("{}/form/{}/submissions", self.base_url, form_id);
        debug!("GET {} (offset {})", url, offset);

        let limit = self.page_limit.to_string();
        let offset = offset.to_string();
        let response = self
            .http
            .get(&url)
            .header("APIKEY", self.api_key.as_str())
            .query(&[
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.request_error(form_id, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(form_id, e))?;

        match parse_submissions_page(&body) {
            Err(BinderError::MalformedResponse { .. }) if !status.is_success() => {
                Err(BinderError::RetrievalFailed {
                    form_id: form_id.to_string(),
                    reason: format!("HTTP {}", status),
                })
            }
            other => other,
        }
    }

    fn request_error(&self, form_id: &str, e: reqwest::Error) -> BinderError {
        if e.is_timeout() {
            BinderError::RetrievalTimeout {
                form_id: form_id.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            BinderError::RetrievalFailed {
                form_id: form_id.to_string(),
                reason: e.without_url().to_string(),
            }
        }
    }
}

impl SubmissionSource for JotformClient {
    async fn fetch_submissions(&self, form_id: &str) -> Result<Vec<RawSubmission>, BinderError> {
        let mut all = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(form_id, offset).await?;
            let listed = page.listed;
            all.extend(page.submissions);

            if listed < self.page_limit {
                break;
            }
            offset += listed;
        }

        info!("Fetched {} submissions for form {}", all.len(), form_id);
        Ok(all)
    }
}

// ── Response parsing ─────────────────────────────────────────────────────

/// One page of the listing, already converted.
#[derive(Debug)]
pub struct SubmissionsPage {
    pub submissions: Vec<RawSubmission>,
    /// Entries the API listed on this page, deleted ones included.
    pub listed: usize,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(rename = "responseCode")]
    response_code: u16,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    content: Option<Vec<WireSubmission>>,
}

#[derive(Deserialize)]
struct WireSubmission {
    id: String,
    created_at: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    answers: Value,
}

#[derive(Deserialize)]
struct WireAnswer {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    answer: Option<Value>,
    #[serde(rename = "prettyFormat", default)]
    pretty_format: Option<Value>,
}

/// Parse a submissions listing body.
pub fn parse_submissions_page(body: &str) -> Result<SubmissionsPage, BinderError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| BinderError::MalformedResponse {
            detail: e.to_string(),
        })?;

    if wire.response_code != 200 {
        return Err(BinderError::ApiError {
            code: wire.response_code,
            message: wire.message.unwrap_or_else(|| "no message".to_string()),
        });
    }

    let content = wire.content.ok_or_else(|| BinderError::MalformedResponse {
        detail: "missing 'content' array".to_string(),
    })?;
    let listed = content.len();

    let mut submissions = Vec::with_capacity(listed);
    for w in content {
        if w.status.as_deref() == Some("DELETED") {
            debug!("Ignoring deleted submission {}", w.id);
            continue;
        }
        submissions.push(convert_submission(w)?);
    }

    Ok(SubmissionsPage {
        submissions,
        listed,
    })
}

fn convert_submission(w: WireSubmission) -> Result<RawSubmission, BinderError> {
    let created_at = NaiveDateTime::parse_from_str(&w.created_at, CREATED_AT_FORMAT).map_err(
        |e| BinderError::MalformedResponse {
            detail: format!(
                "submission {}: bad created_at '{}': {}",
                w.id, w.created_at, e
            ),
        },
    )?;

    let mut answers = BTreeMap::new();
    match w.answers {
        Value::Object(map) => {
            for (qid, v) in map {
                let wa: WireAnswer =
                    serde_json::from_value(v).map_err(|e| BinderError::MalformedResponse {
                        detail: format!("submission {}: answer {}: {}", w.id, qid, e),
                    })?;
                answers.insert(QuestionId(qid), convert_answer(wa));
            }
        }
        // JotForm encodes "no answers" as an empty array.
        Value::Array(ref items) if items.is_empty() => {}
        Value::Null => {}
        other => {
            return Err(BinderError::MalformedResponse {
                detail: format!("submission {}: unexpected answers value {}", w.id, other),
            })
        }
    }

    Ok(RawSubmission {
        id: w.id,
        created_at,
        answers,
    })
}

fn convert_answer(w: WireAnswer) -> Answer {
    let pretty_value = match w.pretty_format {
        None | Some(Value::Null) => None,
        Some(v) => Some(flatten_value(&v)),
    };

    Answer {
        question_text: w.text.unwrap_or_default(),
        raw_value: w.answer.as_ref().map(flatten_value).unwrap_or_default(),
        pretty_value,
    }
}

/// Reduce a JSON answer to display text.
///
/// Composite fields (name, address) arrive as objects and are joined with
/// spaces; multi-select fields arrive as arrays and are joined with commas.
pub fn flatten_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => join_non_empty(items.iter(), ", "),
        Value::Object(map) => {
            if map.values().any(|v| v.is_object() || v.is_array()) {
                warn!("Flattening nested answer object with {} keys", map.len());
            }
            join_non_empty(map.values(), " ")
        }
    }
}

fn join_non_empty<'a>(values: impl Iterator<Item = &'a Value>, sep: &str) -> String {
    values
        .map(flatten_value)
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}
