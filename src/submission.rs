//! Submission data model.
//!
//! ```text
//! RawSubmission ──normalize──▶ NormalizedRecord ──render──▶ DocumentFragment
//!   id → Answer                 question text → Answer       HTML
//! ```
//!
//! [`Answer`] serialises with JotForm's own field names (`text`, `answer`,
//! `prettyFormat`) so templates can reach a value directly with
//! `{{[Full Name].answer}}` as well as through the `field` helper.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The value given for a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Human-readable question label, as JotForm sends it (may be HTML-escaped).
    #[serde(rename = "text")]
    pub question_text: String,

    /// The raw answer, flattened to a display string.
    #[serde(rename = "answer", default)]
    pub raw_value: String,

    /// JotForm's pretty rendering, when the field type has one.
    ///
    /// `Some("")` means the respondent explicitly left it blank.
    #[serde(
        rename = "prettyFormat",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pretty_value: Option<String>,
}

impl Answer {
    pub fn new(question_text: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            raw_value: raw_value.into(),
            pretty_value: None,
        }
    }

    pub fn with_pretty(mut self, pretty: impl Into<String>) -> Self {
        self.pretty_value = Some(pretty.into());
        self
    }
}

/// JotForm's internal question identifier.
///
/// Ordered the way JotForm lists questions: numeric ids ascending by value,
/// followed by any non-numeric ids in lexicographic order. This fixes the
/// iteration order that decides which answer wins a question-text collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestionId(pub String);

impl QuestionId {
    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for QuestionId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for QuestionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        QuestionId(s.to_string())
    }
}

/// One filled-out form instance, as retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSubmission {
    /// JotForm submission id.
    pub id: String,
    /// Creation time, in the form owner's account timezone.
    pub created_at: NaiveDateTime,
    /// Answers keyed by internal question id.
    pub answers: BTreeMap<QuestionId, Answer>,
}

impl RawSubmission {
    pub fn new(id: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id: id.into(),
            created_at,
            answers: BTreeMap::new(),
        }
    }

    /// Add an answer under `question_id`, replacing any previous one.
    pub fn with_answer(mut self, question_id: &str, answer: Answer) -> Self {
        self.answers.insert(QuestionId::from(question_id), answer);
        self
    }
}

/// A submission re-indexed by decoded question text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedRecord {
    fields: HashMap<String, Answer>,
}

impl NormalizedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under `question_text`, returning the answer it displaced.
    pub fn insert(&mut self, question_text: impl Into<String>, answer: Answer) -> Option<Answer> {
        self.fields.insert(question_text.into(), answer)
    }

    pub fn get(&self, question_text: &str) -> Option<&Answer> {
        self.fields.get(question_text)
    }

    pub fn contains(&self, question_text: &str) -> bool {
        self.fields.contains_key(question_text)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn question_texts(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Rendered markup for one record, prior to assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFragment(pub String);

impl DocumentFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The assembled page, ready for PDF conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full HTML page.
    pub html: String,
    /// Number of records embedded in the page.
    pub record_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_ids_order_numerically_before_text() {
        let mut ids: Vec<QuestionId> = ["10", "3", "name", "21", "alpha"]
            .into_iter()
            .map(QuestionId::from)
            .collect();
        ids.sort();
        let order: Vec<&str> = ids.iter().map(|q| q.0.as_str()).collect();
        assert_eq!(order, vec!["3", "10", "21", "alpha", "name"]);
    }

    #[test]
    fn answers_iterate_in_question_id_order() {
        let created = chrono::NaiveDate::from_ymd_opt(2017, 1, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let s = RawSubmission::new("1", created)
            .with_answer("12", Answer::new("B", "b"))
            .with_answer("2", Answer::new("A", "a"));
        let texts: Vec<&str> = s.answers.values().map(|a| a.question_text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[test]
    fn answer_serialises_with_jotform_names() {
        let a = Answer::new("Name", "Jane").with_pretty("Jane Doe");
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["text"], "Name");
        assert_eq!(v["answer"], "Jane");
        assert_eq!(v["prettyFormat"], "Jane Doe");

        let plain = serde_json::to_value(Answer::new("Age", "30")).unwrap();
        assert!(plain.get("prettyFormat").is_none());
    }

    #[test]
    fn record_serialises_as_plain_map() {
        let mut r = NormalizedRecord::new();
        r.insert("Age", Answer::new("Age", "30"));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["Age"]["answer"], "30");
    }
}
