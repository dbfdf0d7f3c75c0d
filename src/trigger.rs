//! Trigger evaluation: decides whether a webhook fires for an event.

use serde_json::Value;

use crate::dispatch::DispatchError;
use crate::template::TemplateEngine;

/// Result of evaluating a trigger template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDecision {
    /// Whether the webhook fires
    pub fired: bool,
    /// Raw rendered template output; empty when there is no template
    pub rendered: String,
}

impl TriggerDecision {
    /// Decision for a webhook without a trigger template.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            fired: true,
            rendered: String::new(),
        }
    }

    /// Decision derived from a rendered trigger template.
    ///
    /// Fires when the lower-cased output is exactly `"true"` or `"1"`.
    #[must_use]
    pub fn from_rendered(rendered: String) -> Self {
        let lowered = rendered.to_lowercase();
        Self {
            fired: lowered == "true" || lowered == "1",
            rendered,
        }
    }
}

/// Evaluates an optional trigger template against the event data.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidWebhookTrigger`] carrying the engine's
/// fallback message when rendering fails. A failure is never read as
/// "fires" or "does not fire".
pub fn evaluate<T: TemplateEngine + ?Sized>(
    engine: &T,
    trigger_template: Option<&str>,
    event_data: &Value,
) -> Result<TriggerDecision, DispatchError> {
    let Some(template) = trigger_template.filter(|t| !t.is_empty()) else {
        return Ok(TriggerDecision::always());
    };

    engine
        .render(template, event_data)
        .map(TriggerDecision::from_rendered)
        .map_err(|e| DispatchError::InvalidWebhookTrigger(e.fallback_message().to_string()))
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
