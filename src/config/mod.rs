//! Configuration layer for alert-webhooks.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Dispatch settings are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - `--timeout`, `--concurrency`, `--log-file`
//! 2. **TOML config file** - the `[dispatch]` section
//! 3. **Built-in defaults** - see [`defaults`]
//!
//! Webhooks are only configured in the TOML file, one `[[webhook]]` table each.
//!
//! # Boolean Flag Semantics
//!
//! `--strict-templates` uses OR semantics with `template.strict`: once set
//! `true` in TOML, the CLI cannot turn it off.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;
#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command, TriggerTypeArg};
pub use error::ConfigError;
pub use toml::{DispatchSection, TemplateSection, TomlConfig, WebhookEntry, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
