//! Handlebars-backed template engine.

use handlebars::{Handlebars, Template, handlebars_helper, no_escape};
use serde_json::Value;

use super::{TemplateEngine, TemplateError};

handlebars_helper!(to_json: |value: Json| value.to_string());

/// Production template engine using Handlebars syntax.
///
/// Plain rendering performs no escaping, so URLs and trigger expressions
/// come out verbatim. JSON rendering escapes interpolated strings for use
/// inside JSON string literals; use the triple-stash form (`{{{tojson x}}}`)
/// to embed a value as raw JSON.
///
/// # Example
///
/// ```
/// use alert_webhooks::template::{HandlebarsEngine, TemplateEngine};
/// use serde_json::json;
///
/// let engine = HandlebarsEngine::new();
/// let url = engine
///     .render("https://example.com/{{ id }}", &json!({"id": 42}))
///     .unwrap();
/// assert_eq!(url, "https://example.com/42");
/// ```
#[derive(Debug)]
pub struct HandlebarsEngine {
    plain: Handlebars<'static>,
    json: Handlebars<'static>,
}

impl HandlebarsEngine {
    /// Creates an engine where missing variables render as empty strings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_strict_mode(false)
    }

    /// Creates an engine; in strict mode a missing variable is a
    /// [`TemplateError::Warning`].
    #[must_use]
    pub fn with_strict_mode(strict: bool) -> Self {
        let mut plain = Handlebars::new();
        plain.register_escape_fn(no_escape);
        plain.set_strict_mode(strict);
        plain.register_helper("tojson", Box::new(to_json));

        let mut json = Handlebars::new();
        json.register_escape_fn(escape_json_string);
        json.set_strict_mode(strict);
        json.register_helper("tojson", Box::new(to_json));

        Self { plain, json }
    }

    /// Returns true if missing variables are reported as errors.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.plain.strict_mode()
    }

    fn render_with(
        registry: &Handlebars<'static>,
        template: &str,
        context: &Value,
    ) -> Result<String, TemplateError> {
        Template::compile(template).map_err(TemplateError::fatal)?;

        registry
            .render_template(template, context)
            .map_err(TemplateError::warning)
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        Self::render_with(&self.plain, template, context)
    }

    fn render_json(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        Self::render_with(&self.json, template, context)
    }
}

/// Escapes a string for embedding inside a JSON string literal (without quotes).
fn escape_json_string(raw: &str) -> String {
    let quoted = Value::String(raw.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
