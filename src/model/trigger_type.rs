//! Categories of alert group lifecycle events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle event category that can cause a webhook to fire.
///
/// A webhook whose trigger type is `None` is manual-only and never matches
/// an automatically dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerType {
    /// Fired as a step of an escalation chain.
    EscalationStep,
    /// Fired as a step of a user notification policy.
    UserNotificationStep,
    /// A new alert group was created.
    AlertGroupNew,
    /// An alert group was acknowledged.
    AlertGroupAcknowledge,
    /// An alert group was resolved.
    AlertGroupResolve,
    /// An alert group was silenced.
    AlertGroupSilence,
    /// An alert group was unsilenced.
    AlertGroupUnsilence,
}

/// Error returned when parsing an unknown trigger type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown trigger type '{0}'")]
pub struct UnknownTriggerType(pub String);

impl TriggerType {
    /// All trigger types, ordered by their numeric code.
    pub const ALL: [Self; 7] = [
        Self::EscalationStep,
        Self::UserNotificationStep,
        Self::AlertGroupNew,
        Self::AlertGroupAcknowledge,
        Self::AlertGroupResolve,
        Self::AlertGroupSilence,
        Self::AlertGroupUnsilence,
    ];

    /// Returns the kebab-case name used in configuration and on the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EscalationStep => "escalation-step",
            Self::UserNotificationStep => "user-notification-step",
            Self::AlertGroupNew => "alert-group-new",
            Self::AlertGroupAcknowledge => "alert-group-acknowledge",
            Self::AlertGroupResolve => "alert-group-resolve",
            Self::AlertGroupSilence => "alert-group-silence",
            Self::AlertGroupUnsilence => "alert-group-unsilence",
        }
    }

    /// Returns the persisted numeric code (0..=6).
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a trigger type by its persisted numeric code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EscalationStep => "As escalation step",
            Self::UserNotificationStep => "As user notification step",
            Self::AlertGroupNew => "Alert group new",
            Self::AlertGroupAcknowledge => "Alert group acknowledge",
            Self::AlertGroupResolve => "Alert group resolve",
            Self::AlertGroupSilence => "Alert group silence",
            Self::AlertGroupUnsilence => "Alert group unsilence",
        }
    }
}

impl FromStr for TriggerType {
    type Err = UnknownTriggerType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTriggerType(s.to_string()))
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
