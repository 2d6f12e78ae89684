//! Field formatting: one `<p>label: value</p>` line per requested question.
//!
//! Rules, in priority order:
//!
//! 1. question absent from the record → `---`
//! 2. pretty value present and empty → `---` (a blank answer prints like a
//!    missing one, not as an empty underline)
//! 3. pretty value present → underlined pretty value
//! 4. otherwise → underlined raw value
//!
//! Formatting is total: every record and field name produces a line.

use crate::config::ValueInsertion;
use crate::submission::{Answer, NormalizedRecord};
use std::borrow::Cow;
use std::fmt;

/// Text printed in place of an unanswered question.
pub const MISSING_MARKER: &str = "---";

/// What a field line shows after its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Missing,
    Underlined(String),
}

/// A label paired with its formatted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedField {
    pub label: String,
    pub value: FieldValue,
}

impl FormattedField {
    pub fn is_missing(&self) -> bool {
        self.value == FieldValue::Missing
    }

    /// Render as HTML, inserting the value according to `insertion`.
    pub fn to_markup(&self, insertion: ValueInsertion) -> String {
        match &self.value {
            FieldValue::Missing => format!("<p>{}: {}</p>", self.label, MISSING_MARKER),
            FieldValue::Underlined(v) => format!(
                "<p>{}: <span class=\"underline\">{}</span></p>",
                self.label,
                insert_value(v, insertion)
            ),
        }
    }
}

impl fmt::Display for FormattedField {
    /// Plain-text form, e.g. `Allergies: ---`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FieldValue::Missing => write!(f, "{}: {}", self.label, MISSING_MARKER),
            FieldValue::Underlined(v) => write!(f, "{}: {}", self.label, v),
        }
    }
}

/// Format `field_name` from `record`. `label` defaults to the field name.
pub fn format(record: &NormalizedRecord, field_name: &str, label: Option<&str>) -> FormattedField {
    format_answer(record.get(field_name), label.unwrap_or(field_name))
}

/// Format an optional answer under `label`.
pub fn format_answer(answer: Option<&Answer>, label: &str) -> FormattedField {
    let value = match answer {
        None => FieldValue::Missing,
        Some(a) => match a.pretty_value.as_deref() {
            Some("") => FieldValue::Missing,
            Some(pretty) => FieldValue::Underlined(pretty.to_string()),
            None => FieldValue::Underlined(a.raw_value.clone()),
        },
    };

    FormattedField {
        label: label.to_string(),
        value,
    }
}

/// Insert a submitted value into markup.
///
/// `TrustedRaw` passes the value through untouched so the printout matches
/// what was typed. `Escaped` HTML-escapes it.
pub fn insert_value(value: &str, insertion: ValueInsertion) -> Cow<'_, str> {
    match insertion {
        ValueInsertion::TrustedRaw => Cow::Borrowed(value),
        ValueInsertion::Escaped => html_escape::encode_text(value),
    }
}
