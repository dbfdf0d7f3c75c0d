//! Template rendering capability.
//!
//! The dispatch core never inspects template syntax. It only consumes the
//! [`TemplateEngine`] contract: render a template against the event data,
//! or fail with a [`TemplateError`] that carries a fallback message.
//!
//! - Production engine: [`HandlebarsEngine`]
//! - Deterministic test engine: `mock::StubEngine` (test builds only)

mod engine;
mod error;


pub use engine::HandlebarsEngine;
pub use error::TemplateError;

use serde_json::Value;

/// Renders template strings against a structured context.
///
/// The context is the event data. When it is a JSON object, its top-level
/// keys are the named variables visible to the template.
pub trait TemplateEngine: Send + Sync {
    /// Renders `template` against `context`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Fatal`] when the template cannot be compiled
    /// and [`TemplateError::Warning`] when evaluation fails.
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError>;

    /// Renders a template whose output is meant to be parsed as JSON.
    ///
    /// Interpolated strings are escaped so they stay valid inside JSON
    /// string literals. Defaults to [`TemplateEngine::render`].
    ///
    /// # Errors
    ///
    /// Same as [`TemplateEngine::render`].
    fn render_json(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        self.render(template, context)
    }
}
