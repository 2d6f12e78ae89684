//! Pipeline stages for turning submissions into a printable binder.
//!
//! Each submodule implements one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ filter ──▶ normalize ──▶ render ──▶ assemble ──▶ export
//! (JotForm)  (cutoff)   (by label)    (record)   (page)       (wkhtmltopdf)
//! ```
//!
//! 1. [`source`]    — list raw submissions and obtain the cutoff date
//! 2. [`filter`]    — keep submissions created strictly after the cutoff
//! 3. [`normalize`] — re-key answers by decoded question text
//! 4. [`render`]    — run the record template; uses [`format`] for each field
//! 5. [`assemble`]  — concatenate fragments into the page template
//! 6. [`export`]    — convert the page to PDF and open it

pub mod assemble;
pub mod export;
pub mod filter;
pub mod format;
pub mod normalize;
pub mod render;
pub mod source;
