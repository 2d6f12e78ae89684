//! Cutoff filtering: keep only submissions created after the last print run.
//!
//! The operator types the date the binder was last printed. Anything created
//! on a later instant than the *start* of that day is new, so a submission
//! that arrived at 10:00 on the cutoff day is printed again. That overlap is
//! preferable to silently skipping a form.

use crate::error::BinderError;
use crate::submission::RawSubmission;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

/// Input format for the cutoff date.
pub const CUTOFF_FORMAT: &str = "%m/%d/%Y";

/// Parse an operator-supplied `MM/DD/YYYY` date.
///
/// Surrounding whitespace is ignored and single-digit months and days are
/// accepted (`1/5/2017`). Anything else is returned as
/// [`BinderError::DateParse`]; no guessing at other layouts.
pub fn parse_cutoff(input: &str) -> Result<NaiveDate, BinderError> {
    NaiveDate::parse_from_str(input.trim(), CUTOFF_FORMAT).map_err(|_| BinderError::DateParse {
        input: input.trim().to_string(),
    })
}

/// True iff `created_at` is strictly later than the start of `cutoff`.
pub fn is_new(created_at: NaiveDateTime, cutoff: NaiveDate) -> bool {
    created_at > cutoff.and_time(NaiveTime::MIN)
}

/// Keep the new submissions, preserving retrieval order.
pub fn select_new(submissions: Vec<RawSubmission>, cutoff: NaiveDate) -> Vec<RawSubmission> {
    submissions
        .into_iter()
        .filter(|s| {
            let keep = is_new(s.created_at, cutoff);
            if !keep {
                debug!("Skipping submission {} created {}", s.id, s.created_at);
            }
            keep
        })
        .collect()
}
