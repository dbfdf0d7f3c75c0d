//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::model::{OwnerScope, TriggerType};

use super::defaults;

/// alert-webhooks: outbound webhook dispatcher
///
/// Renders and sends configured webhooks for alert group lifecycle events,
/// and records every execution in an audit log.
#[derive(Debug, Parser)]
#[command(name = "alert-webhooks")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file [default: webhooks.toml]
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Outgoing request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of webhooks sent concurrently per event
    #[arg(long, global = true, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Path to the JSON Lines audit log
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,

    /// Treat missing template variables as errors
    #[arg(long = "strict-templates", global = true)]
    pub strict_templates: bool,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for alert-webhooks
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,
    },

    /// List configured webhooks
    List,

    /// Dispatch an event to every matching webhook
    Dispatch {
        /// Trigger type of the event
        #[arg(long, value_enum)]
        trigger: TriggerTypeArg,

        /// JSON file holding the event data ('-' for stdin)
        #[arg(long)]
        event: PathBuf,

        /// Organization the event belongs to
        #[arg(long)]
        organization: Option<String>,

        /// Team the event belongs to
        #[arg(long)]
        team: Option<String>,

        /// User the event belongs to
        #[arg(long)]
        user: Option<String>,
    },

    /// Send a single webhook with sample event data
    Test {
        /// Public key of the webhook
        #[arg(long)]
        webhook: String,

        /// JSON file holding the event data ('-' for stdin)
        #[arg(long)]
        event: PathBuf,

        /// Render the request without sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the audit log of a webhook
    Logs {
        /// Public key of the webhook
        #[arg(long)]
        webhook: String,
    },
}

/// Trigger type argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TriggerTypeArg {
    /// An escalation chain step ran
    EscalationStep,
    /// A user notification step ran
    UserNotificationStep,
    /// An alert group was created
    AlertGroupNew,
    /// An alert group was acknowledged
    AlertGroupAcknowledge,
    /// An alert group was resolved
    AlertGroupResolve,
    /// An alert group was silenced
    AlertGroupSilence,
    /// An alert group was unsilenced
    AlertGroupUnsilence,
}

impl From<TriggerTypeArg> for TriggerType {
    fn from(arg: TriggerTypeArg) -> Self {
        match arg {
            TriggerTypeArg::EscalationStep => Self::EscalationStep,
            TriggerTypeArg::UserNotificationStep => Self::UserNotificationStep,
            TriggerTypeArg::AlertGroupNew => Self::AlertGroupNew,
            TriggerTypeArg::AlertGroupAcknowledge => Self::AlertGroupAcknowledge,
            TriggerTypeArg::AlertGroupResolve => Self::AlertGroupResolve,
            TriggerTypeArg::AlertGroupSilence => Self::AlertGroupSilence,
            TriggerTypeArg::AlertGroupUnsilence => Self::AlertGroupUnsilence,
        }
    }
}

impl Command {
    /// Ownership scope given to `dispatch`; unrestricted for other commands.
    #[must_use]
    pub fn scope(&self) -> OwnerScope {
        match self {
            Self::Dispatch {
                organization,
                team,
                user,
                ..
            } => OwnerScope {
                organization: organization.clone(),
                team: team.clone(),
                user: user.clone(),
            },
            _ => OwnerScope::default(),
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }

    /// Returns the configuration file path, falling back to the default.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        self.config
            .as_deref()
            .unwrap_or_else(|| Path::new(defaults::CONFIG_FILE))
    }
}
