//! Record rendering: turn one [`NormalizedRecord`] into an HTML fragment.
//!
//! A [`TemplateEngine`] owns a handlebars registry holding the `record` and
//! `page` templates, the `healthCheckin` and `payments` partials, and the
//! `field` helper. It is compiled once per run and handed to
//! [`render_record`] and [`crate::pipeline::assemble::assemble`] explicitly.
//!
//! Inside a template, `{{field "Question Text"}}` or
//! `{{field "Question Text" "Printed label"}}` emits one formatted line (see
//! [`crate::pipeline::format`]). Escaping is disabled for the whole registry:
//! values go through the field helper's [`ValueInsertion`] policy instead.

use crate::config::{BinderConfig, ValueInsertion};
use crate::error::BinderError;
use crate::pipeline::format::format_answer;
use crate::submission::{Answer, DocumentFragment, NormalizedRecord};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderErrorReason,
};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

pub const RECORD_TEMPLATE: &str = "record";
pub const PAGE_TEMPLATE: &str = "page";
pub const HEALTH_CHECKIN_PARTIAL: &str = "healthCheckin";
pub const PAYMENTS_PARTIAL: &str = "payments";

/// Template sources before compilation.
#[derive(Debug, Clone)]
pub struct TemplateSources {
    pub page: String,
    pub record: String,
    pub health_checkin: String,
    pub payments: String,
}

impl TemplateSources {
    /// The staff registration templates bundled with the crate.
    pub fn builtin() -> Self {
        Self {
            page: include_str!("../../templates/page.html").to_string(),
            record: include_str!("../../templates/record.html").to_string(),
            health_checkin: include_str!("../../templates/health_checkin.html").to_string(),
            payments: include_str!("../../templates/payments.html").to_string(),
        }
    }

    /// Read `page.html`, `record.html`, `health_checkin.html` and
    /// `payments.html` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, BinderError> {
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read_to_string(&path)
                .map_err(|e| BinderError::template(file, format!("{}: {}", path.display(), e)))
        };

        Ok(Self {
            page: read("page.html")?,
            record: read("record.html")?,
            health_checkin: read("health_checkin.html")?,
            payments: read("payments.html")?,
        })
    }
}

/// Compiled templates plus the `field` helper.
pub struct TemplateEngine {
    registry: Handlebars<'static>,
    insertion: ValueInsertion,
}

impl TemplateEngine {
    /// Compile `sources`. Syntax errors surface here, before any record is
    /// rendered.
    pub fn new(sources: &TemplateSources, insertion: ValueInsertion) -> Result<Self, BinderError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper("field", Box::new(FieldHelper { insertion }));

        registry
            .register_partial(HEALTH_CHECKIN_PARTIAL, &sources.health_checkin)
            .map_err(|e| BinderError::template(HEALTH_CHECKIN_PARTIAL, e))?;
        registry
            .register_partial(PAYMENTS_PARTIAL, &sources.payments)
            .map_err(|e| BinderError::template(PAYMENTS_PARTIAL, e))?;
        registry
            .register_template_string(RECORD_TEMPLATE, &sources.record)
            .map_err(|e| BinderError::template(RECORD_TEMPLATE, e))?;
        registry
            .register_template_string(PAGE_TEMPLATE, &sources.page)
            .map_err(|e| BinderError::template(PAGE_TEMPLATE, e))?;

        debug!("Compiled templates ({:?} value insertion)", insertion);
        Ok(Self { registry, insertion })
    }

    /// Built-in templates, or the ones in `config.templates_dir`.
    pub fn from_config(config: &BinderConfig) -> Result<Self, BinderError> {
        let sources = match config.templates_dir {
            Some(ref dir) => TemplateSources::load(dir)?,
            None => TemplateSources::builtin(),
        };
        Self::new(&sources, config.value_insertion)
    }

    pub fn insertion(&self) -> ValueInsertion {
        self.insertion
    }

    /// Render a named template against `data`.
    pub(crate) fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, BinderError> {
        self.registry
            .render(name, data)
            .map_err(|e| BinderError::template(name, e))
    }
}

/// Render one record through the `record` template.
pub fn render_record(
    engine: &TemplateEngine,
    record: &NormalizedRecord,
) -> Result<DocumentFragment, BinderError> {
    engine.render(RECORD_TEMPLATE, record).map(DocumentFragment)
}

/// `{{field "Question" ["Label"]}}`.
///
/// Looks the question up in the root context, which is always the record
/// being rendered, so it behaves the same inside partials and blocks.
struct FieldHelper {
    insertion: ValueInsertion,
}

impl HelperDef for FieldHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let field = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("field", 0))?
            .value()
            .as_str()
            .ok_or(RenderErrorReason::InvalidParamType("string"))?;

        // A non-string label falls back to the field name.
        let label = h
            .param(1)
            .and_then(|p| p.value().as_str())
            .unwrap_or(field);

        let answer = match ctx.data().get(field) {
            Some(v) => Some(
                serde_json::from_value::<Answer>(v.clone())
                    .map_err(RenderErrorReason::SerdeError)?,
            ),
            None => None,
        };

        let line = format_answer(answer.as_ref(), label).to_markup(self.insertion);
        out.write(&line)?;
        Ok(())
    }
}
