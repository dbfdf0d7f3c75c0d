//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use crate::dispatch::DEFAULT_MAX_CONCURRENCY;
use crate::transport::REQUEST_TIMEOUT;

/// Default configuration file path.
pub const CONFIG_FILE: &str = "webhooks.toml";

/// Default HTTP method for webhook requests.
pub const METHOD: &str = "POST";

/// Default audit log file path.
pub const LOG_FILE: &str = "webhook-logs.jsonl";

/// Default outgoing request timeout in seconds.
pub const TIMEOUT_SECS: u64 = REQUEST_TIMEOUT.as_secs();

/// Default number of webhooks executed concurrently per event.
pub const MAX_CONCURRENCY: usize = DEFAULT_MAX_CONCURRENCY;
