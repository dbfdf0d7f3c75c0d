//! The per-execution audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Audit record of one webhook execution attempt.
///
/// Written once by the dispatcher and never mutated. Fields that a given
/// attempt never reached (e.g. `url` when the trigger did not fire) stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookLog {
    /// Public key of the webhook this record belongs to
    pub webhook_id: String,
    /// When the attempt started
    pub last_run_at: DateTime<Utc>,
    /// Event data as received
    pub input_data: Value,
    /// Rendered trigger expression result
    pub trigger: Option<String>,
    /// Rendered URL
    pub url: Option<String>,
    /// Serialized outgoing request
    pub request: Option<String>,
    /// Response status code, or the error kind when no response was received
    pub response_status: Option<String>,
    /// Response body, or the error message
    pub response: Option<String>,
}

impl WebhookLog {
    /// Starts a record for an attempt.
    #[must_use]
    pub const fn new(webhook_id: String, last_run_at: DateTime<Utc>, input_data: Value) -> Self {
        Self {
            webhook_id,
            last_run_at,
            input_data,
            trigger: None,
            url: None,
            request: None,
            response_status: None,
            response: None,
        }
    }

    /// Returns true if an HTTP response was recorded.
    #[must_use]
    pub fn has_response_code(&self) -> bool {
        self.response_status
            .as_deref()
            .is_some_and(|s| s.parse::<u16>().is_ok())
    }
}
