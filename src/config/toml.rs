//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// Settings are optional so they can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Dispatch settings
    #[serde(default)]
    pub dispatch: DispatchSection,

    /// Template engine settings
    #[serde(default)]
    pub template: TemplateSection,

    /// Configured webhooks, one `[[webhook]]` table each
    #[serde(default, rename = "webhook")]
    pub webhooks: Vec<WebhookEntry>,
}

/// Dispatch configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    /// Outgoing request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Maximum number of webhooks sent concurrently per event
    pub max_concurrency: Option<usize>,

    /// Path to the JSON Lines audit log
    pub log_file: Option<String>,
}

/// Template configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSection {
    /// Treat missing variables as errors
    #[serde(default)]
    pub strict: bool,
}

/// One `[[webhook]]` table.
///
/// Mirrors the persisted webhook fields. Values are validated when the
/// configuration is merged.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookEntry {
    /// Public key; generated when omitted
    pub id: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Owning organization
    pub organization: Option<String>,
    /// Owning team
    pub team: Option<String>,
    /// Owning user
    pub user: Option<String>,
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Static `Authorization` header value
    pub authorization_header: Option<String>,
    /// Trigger template
    pub trigger_template: Option<String>,
    /// Static headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Headers template
    pub headers_template: Option<String>,
    /// Static URL
    pub url: Option<String>,
    /// URL template
    pub url_template: Option<String>,
    /// Body template
    pub data: Option<String>,
    /// Send the full event as body (default: true)
    pub forward_all: Option<bool>,
    /// HTTP method (default: POST)
    pub http_method: Option<String>,
    /// Trigger type name, e.g. "alert-group-resolve"
    pub trigger_type: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# alert-webhooks configuration file

[dispatch]
# Outgoing request timeout in seconds (default: 4)
# timeout_secs = 4

# Webhooks sent concurrently per event (default: 8)
# max_concurrency = 8

# JSON Lines audit log (default: webhook-logs.jsonl)
# log_file = "webhook-logs.jsonl"

[template]
# Treat missing template variables as errors (default: false)
# strict = false

# One [[webhook]] table per webhook.
# Templates use Handlebars syntax; the event data fields are the variables.
#
# trigger_type: escalation-step, user-notification-step, alert-group-new,
#   alert-group-acknowledge, alert-group-resolve, alert-group-silence,
#   alert-group-unsilence (omit for manual-only webhooks)
# http_method: GET, POST, PUT, DELETE, OPTIONS (default: POST)

[[webhook]]
# Public key (generated when omitted)
id = "WHEXAMPLE0001"
name = "Resolved alerts"
trigger_type = "alert-group-resolve"
url = "https://example.com/hooks/resolved"

# Template overriding url
# url_template = "https://example.com/hooks/{{ alert_group.id }}"

# Fire only when the template renders "true" or "1"
# trigger_template = "{{#if alert_group.escalated}}true{{/if}}"

# Replaces the static headers entirely when set
# headers_template = '{"X-Alert-Group": "{{ alert_group.id }}"}'

# Overrides any Authorization header from the header step
# authorization_header = "Bearer your-token"

# HTTP Basic credentials (used only when both are set)
# username = "user"
# password = "secret"

# Send the whole event as JSON body (default: true); set false to use `data`
# forward_all = false
# data = '{"title": "{{ alert_group.title }}", "labels": {{{tojson labels}}}}'

# Static headers (keep this table last in the webhook entry)
# [webhook.headers]
# X-Source = "alerting"
"#
    .to_string()
}
