//! Error kinds surfaced by the dispatch pipeline.

use thiserror::Error;

use crate::transport::HttpError;

/// Error type for a single webhook execution.
///
/// Every kind is distinct. In fan-out dispatch these are caught per webhook
/// and written to the audit log; in interactive testing they propagate to
/// the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// URL missing, unparsable, or its template failed to render.
    #[error("Invalid webhook URL: {0}")]
    InvalidWebhookUrl(String),

    /// Header rendering failed, or headers are not a JSON object of valid headers.
    #[error("Invalid webhook headers: {0}")]
    InvalidWebhookHeaders(String),

    /// Trigger template rendering failed.
    #[error("Invalid webhook trigger: {0}")]
    InvalidWebhookTrigger(String),

    /// Body template rendering failed (strict mode only).
    #[error("Invalid webhook data: {0}")]
    InvalidWebhookData(String),

    /// The configured method is outside the supported set.
    #[error("Unsupported http method: {0}")]
    UnsupportedHttpMethod(String),

    /// Network-level failure while executing the request.
    #[error("Transport error: {0}")]
    Transport(#[from] HttpError),

    /// No webhook with the given public key exists.
    #[error("Webhook '{0}' not found")]
    UnknownWebhook(String),
}

impl DispatchError {
    /// Stable name of the error kind, stored as the log's response status.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidWebhookUrl(_) => "InvalidWebhookUrl",
            Self::InvalidWebhookHeaders(_) => "InvalidWebhookHeaders",
            Self::InvalidWebhookTrigger(_) => "InvalidWebhookTrigger",
            Self::InvalidWebhookData(_) => "InvalidWebhookData",
            Self::UnsupportedHttpMethod(_) => "UnsupportedHttpMethod",
            Self::Transport(_) => "TransportError",
            Self::UnknownWebhook(_) => "UnknownWebhook",
        }
    }

    /// Returns true if the error stems from webhook configuration rather
    /// than from the network.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }
}
