//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::KeyGenerationError;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
/// Webhook-level errors name the offending webhook.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid duration value (zero).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid concurrency limit.
    #[error("Invalid max_concurrency: {0}")]
    InvalidConcurrency(String),

    /// Webhook has neither `url` nor `url_template`.
    #[error("Webhook '{webhook}' has no url or url_template")]
    MissingUrl {
        /// Offending webhook
        webhook: String,
    },

    /// Invalid static URL.
    #[error("Webhook '{webhook}': invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending webhook
        webhook: String,
        /// The invalid URL string
        url: String,
        /// Reason for invalidity
        reason: String,
    },

    /// HTTP method outside GET, POST, PUT, DELETE, OPTIONS.
    #[error("Webhook '{webhook}': invalid HTTP method '{method}'")]
    InvalidMethod {
        /// Offending webhook
        webhook: String,
        /// The rejected method
        method: String,
    },

    /// Unknown trigger type name.
    #[error("Webhook '{webhook}': unknown trigger type '{value}'")]
    InvalidTriggerType {
        /// Offending webhook
        webhook: String,
        /// The rejected value
        value: String,
    },

    /// Invalid static header name.
    #[error("Webhook '{webhook}': invalid header name '{name}': {reason}")]
    InvalidHeaderName {
        /// Offending webhook
        webhook: String,
        /// The invalid header name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid static header value.
    #[error("Webhook '{webhook}': invalid header value for '{name}': {reason}")]
    InvalidHeaderValue {
        /// Offending webhook
        webhook: String,
        /// The header name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Template that does not compile.
    #[error("Webhook '{webhook}': invalid {field}: {reason}")]
    InvalidTemplate {
        /// Offending webhook
        webhook: String,
        /// Name of the template field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Two webhooks share a public key.
    #[error("Duplicate webhook id '{0}'")]
    DuplicateWebhook(String),

    /// No public key could be generated for a webhook without one.
    #[error(transparent)]
    KeyGeneration(#[from] KeyGenerationError),
}
