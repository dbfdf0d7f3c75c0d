//! Webhook configuration lookup and audit log persistence.
//!
//! The dispatcher reads webhooks through [`WebhookStore`] and appends one
//! [`WebhookLog`] per execution attempt. Logs are append-only and never
//! read back by the dispatch path.

mod file;
mod memory;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::io;

use thiserror::Error;

use crate::model::{KeyGenerationError, OwnerScope, TriggerType, Webhook, WebhookLog};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to write the log file.
    #[error("Failed to write log file: {0}")]
    Write(#[source] io::Error),

    /// Failed to read the log file.
    #[error("Failed to read log file: {0}")]
    Read(#[source] io::Error),

    /// Failed to serialize a log record.
    #[error("Failed to serialize log record: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A webhook with the same public key already exists.
    #[error("Webhook '{0}' already exists")]
    DuplicateId(String),

    /// No unique public key could be generated.
    #[error(transparent)]
    KeyGeneration(#[from] KeyGenerationError),

    /// The blocking I/O task did not complete.
    #[error("Store task failed: {0}")]
    Task(String),
}

/// Source of webhook configuration and sink for audit records.
///
/// # Testing
///
/// Use [`MemoryStore`] in tests, or `mock::FailingLogStore` to exercise
/// log-write failures.
pub trait WebhookStore: Send + Sync {
    /// Returns the active webhooks matching `trigger_type` under `scope`.
    ///
    /// The result is a point-in-time snapshot; later configuration changes
    /// are not reflected in it.
    fn matching(&self, trigger_type: TriggerType, scope: &OwnerScope) -> Vec<Webhook>;

    /// Returns the active webhook with public key `id`.
    fn get(&self, id: &str) -> Option<Webhook>;

    /// Appends an audit record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    fn append_log(
        &self,
        log: WebhookLog,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Returns every audit record of webhook `id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if stored records cannot be read.
    fn logs_for(&self, id: &str) -> Result<Vec<WebhookLog>, StoreError>;
}
