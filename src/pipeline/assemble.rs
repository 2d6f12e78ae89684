//! Document assembly: fold rendered records into the page template.
//!
//! Fragments are concatenated strictly in the order given and handed to the
//! `page` template as `{{records}}` (plus `{{count}}`). Callers must not pass
//! an empty slice; the pipeline reports "no new submissions" before getting
//! here.

use crate::error::BinderError;
use crate::pipeline::render::{TemplateEngine, PAGE_TEMPLATE};
use crate::submission::{Document, DocumentFragment};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct PageContext<'a> {
    records: &'a str,
    count: usize,
}

/// Concatenate `fragments` in order and embed them in the page template.
pub fn assemble(
    engine: &TemplateEngine,
    fragments: &[DocumentFragment],
) -> Result<Document, BinderError> {
    if fragments.is_empty() {
        return Err(BinderError::NothingToAssemble);
    }

    let records = fragments
        .iter()
        .fold(String::new(), |mut acc, fragment| {
            acc.push_str(fragment.as_str());
            acc
        });
    debug!(
        "Assembling {} fragments ({} bytes)",
        fragments.len(),
        records.len()
    );

    let html = engine.render(
        PAGE_TEMPLATE,
        &PageContext {
            records: &records,
            count: fragments.len(),
        },
    )?;

    Ok(Document {
        html,
        record_count: fragments.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValueInsertion;
    use crate::pipeline::render::TemplateSources;

    fn engine() -> TemplateEngine {
        let sources = TemplateSources {
            page: "<body data-count=\"{{count}}\">{{records}}</body>".into(),
            record: "".into(),
            health_checkin: "".into(),
            payments: "".into(),
        };
        TemplateEngine::new(&sources, ValueInsertion::TrustedRaw).unwrap()
    }

    fn frag(s: &str) -> DocumentFragment {
        DocumentFragment(s.to_string())
    }

    #[test]
    fn concatenates_in_input_order() {
        let doc = assemble(&engine(), &[frag("<a/>"), frag("<b/>"), frag("<c/>")]).unwrap();
        assert_eq!(doc.html, "<body data-count=\"3\"><a/><b/><c/></body>");
        assert_eq!(doc.record_count, 3);
    }

    #[test]
    fn reordering_input_reorders_output() {
        let doc = assemble(&engine(), &[frag("<c/>"), frag("<a/>"), frag("<b/>")]).unwrap();
        assert!(doc.html.contains("<c/><a/><b/>"));
    }

    #[test]
    fn single_fragment() {
        let doc = assemble(&engine(), &[frag("<p>only</p>")]).unwrap();
        assert_eq!(doc.html, "<body data-count=\"1\"><p>only</p></body>");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            assemble(&engine(), &[]),
            Err(BinderError::NothingToAssemble)
        ));
    }

    #[test]
    fn builtin_page_wraps_records() {
        let engine =
            TemplateEngine::new(&TemplateSources::builtin(), ValueInsertion::TrustedRaw).unwrap();
        let doc = assemble(&engine, &[frag("<div class=\"record\">X</div>")]).unwrap();
        assert!(doc.html.starts_with("<!DOCTYPE html>"));
        assert!(doc.html.contains("<div class=\"record\">X</div>"));
        assert!(doc.html.contains(".underline"));
    }
}
