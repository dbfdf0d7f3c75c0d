//! Error type for template rendering.

use thiserror::Error;

/// Template rendering failure.
///
/// Both variants carry a human-readable fallback message that callers may
/// store or send in place of the rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template could not be compiled.
    #[error("{fallback_message}")]
    Fatal {
        /// Message describing the failure
        fallback_message: String,
    },

    /// The template compiled but could not be evaluated against the context.
    #[error("{fallback_message}")]
    Warning {
        /// Message describing the failure
        fallback_message: String,
    },
}

impl TemplateError {
    /// Creates a `Fatal` error with the standard message prefix.
    #[must_use]
    pub fn fatal(reason: impl std::fmt::Display) -> Self {
        Self::Fatal {
            fallback_message: format!("Template Error: {reason}"),
        }
    }

    /// Creates a `Warning` error with the standard message prefix.
    #[must_use]
    pub fn warning(reason: impl std::fmt::Display) -> Self {
        Self::Warning {
            fallback_message: format!("Template Warning: {reason}"),
        }
    }

    /// Returns the fallback message.
    #[must_use]
    pub fn fallback_message(&self) -> &str {
        match self {
            Self::Fatal { fallback_message } | Self::Warning { fallback_message } => {
                fallback_message
            }
        }
    }

    /// Returns true for compile-time failures.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}
