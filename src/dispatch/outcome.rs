//! Results of webhook executions.

use std::fmt;

use crate::model::WebhookLog;
use crate::render::RenderedRequest;
use crate::transport::HttpResponse;
use crate::trigger::TriggerDecision;

use super::DispatchError;

/// A request that was sent, with the response received.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// What was sent
    pub request: RenderedRequest,
    /// What came back
    pub response: HttpResponse,
}

/// Terminal state of an execution that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The trigger template rendered to something other than true.
    NotFired {
        /// Raw rendered trigger output
        trigger: String,
    },
    /// The request was sent and a response received, whatever its status.
    Delivered(Delivery),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFired { trigger } => write!(f, "not fired (trigger rendered '{trigger}')"),
            Self::Delivered(delivery) => write!(
                f,
                "{} {} -> {}",
                delivery.request.method,
                delivery.request.url,
                delivery.response.status
            ),
        }
    }
}

/// Result of one webhook execution during dispatch, with its audit record.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Public key of the executed webhook
    pub webhook_id: String,
    /// Outcome, or the error that ended the execution
    pub result: Result<Outcome, DispatchError>,
    /// The audit record written for this execution
    pub log: WebhookLog,
}

impl DispatchOutcome {
    /// Returns true if a request was sent and answered.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self.result, Ok(Outcome::Delivered(_)))
    }

    /// Returns the error, if the execution failed.
    #[must_use]
    pub const fn error(&self) -> Option<&DispatchError> {
        match &self.result {
            Ok(_) => None,
            Err(e) => Some(e),
        }
    }
}

/// Dry-run result: the trigger decision and, if it fired, the request that
/// would be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    /// Trigger decision
    pub decision: TriggerDecision,
    /// Rendered request; `None` when the trigger did not fire
    pub request: Option<RenderedRequest>,
}
