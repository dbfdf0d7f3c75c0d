//! Webhook dispatch: trigger evaluation, rendering, delivery and audit logging.
//!
//! An [`Event`] fans out to every matching webhook. Each webhook runs its
//! own pipeline (trigger -> render -> send -> log) and its failure never
//! affects siblings. Interactive testing goes through
//! [`Dispatcher::test_webhook`], where errors propagate to the caller.

mod dispatcher;
mod error;
mod outcome;

#[cfg(test)]
mod dispatcher_tests;

pub use dispatcher::{DEFAULT_MAX_CONCURRENCY, Dispatcher};
pub use error::DispatchError;
pub use outcome::{Delivery, DispatchOutcome, Outcome, Preview};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{OwnerScope, TriggerType};

/// A lifecycle event handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Category of the event
    pub trigger_type: TriggerType,
    /// Ownership scope used to select webhooks
    #[serde(default)]
    pub scope: OwnerScope,
    /// Event payload; the rendering context of every template
    pub data: Value,
}

impl Event {
    /// Creates an event with an unrestricted scope.
    #[must_use]
    pub fn new(trigger_type: TriggerType, data: Value) -> Self {
        Self {
            trigger_type,
            scope: OwnerScope::default(),
            data,
        }
    }

    /// Sets the ownership scope.
    #[must_use]
    pub fn with_scope(mut self, scope: OwnerScope) -> Self {
        self.scope = scope;
        self
    }
}
