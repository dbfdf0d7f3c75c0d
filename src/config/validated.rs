//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use handlebars::Template;
use http::header::{HeaderName, HeaderValue};
use serde_json::{Map, Value};
use url::Url;

use crate::model::{HttpMethod, TriggerType, Webhook, generate_public_key};

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::{TomlConfig, WebhookEntry};

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Configured webhooks, in file order
    pub webhooks: Vec<Webhook>,

    /// Outgoing request timeout
    pub request_timeout: Duration,

    /// Webhooks sent concurrently per event
    pub max_concurrency: usize,

    /// Path to the JSON Lines audit log
    pub log_file: PathBuf,

    /// Missing template variables are errors
    pub strict_templates: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ webhooks: {}, timeout: {}s, max_concurrency: {}, log_file: {}, strict_templates: {} }}",
            self.webhooks.len(),
            self.request_timeout.as_secs(),
            self.max_concurrency,
            self.log_file.display(),
            self.strict_templates,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The timeout or concurrency limit is zero
    /// - A webhook has an invalid method, trigger type, URL, header or template
    /// - Two webhooks share an id
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let request_timeout = Self::resolve_timeout(cli, toml)?;
        let max_concurrency = Self::resolve_concurrency(cli, toml)?;
        let log_file = Self::resolve_log_file(cli, toml);

        // Flag only enables; CLI cannot turn off a TOML `strict = true`
        let strict_templates = cli.strict_templates || toml.is_some_and(|t| t.template.strict);

        let webhooks = toml.map_or_else(|| Ok(Vec::new()), |t| build_webhooks(&t.webhooks))?;

        Ok(Self {
            webhooks,
            request_timeout,
            max_concurrency,
            log_file,
            strict_templates,
            verbose: cli.verbose,
        })
    }

    /// Loads the config file named by the CLI (or the default path) and
    /// merges it with the CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = TomlConfig::load(cli.config_path())?;
        Self::from_raw(cli, Some(&toml))
    }

    fn resolve_timeout(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let seconds = cli
            .timeout
            .or_else(|| toml.and_then(|t| t.dispatch.timeout_secs))
            .unwrap_or(defaults::TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn resolve_concurrency(cli: &Cli, toml: Option<&TomlConfig>) -> Result<usize, ConfigError> {
        let limit = cli
            .concurrency
            .or_else(|| toml.and_then(|t| t.dispatch.max_concurrency))
            .unwrap_or(defaults::MAX_CONCURRENCY);

        if limit == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "must be greater than 0".to_string(),
            ));
        }

        Ok(limit)
    }

    fn resolve_log_file(cli: &Cli, toml: Option<&TomlConfig>) -> PathBuf {
        if let Some(ref path) = cli.log_file {
            return path.clone();
        }

        toml.and_then(|t| t.dispatch.log_file.as_ref())
            .map_or_else(|| PathBuf::from(defaults::LOG_FILE), PathBuf::from)
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Validates every entry and assigns keys to entries without one.
///
/// Explicit ids are reserved first so generated keys never collide with
/// an entry further down the file.
fn build_webhooks(entries: &[WebhookEntry]) -> Result<Vec<Webhook>, ConfigError> {
    let mut taken = HashSet::new();
    for id in entries.iter().filter_map(|e| e.id.as_deref()) {
        if !taken.insert(id.to_string()) {
            return Err(ConfigError::DuplicateWebhook(id.to_string()));
        }
    }

    let mut webhooks = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = match entry.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let id = generate_public_key(|key| taken.contains(key))?;
                taken.insert(id.clone());
                id
            }
        };
        webhooks.push(build_webhook(id, entry)?);
    }

    Ok(webhooks)
}

fn build_webhook(id: String, entry: &WebhookEntry) -> Result<Webhook, ConfigError> {
    let http_method = entry
        .http_method
        .as_deref()
        .unwrap_or(defaults::METHOD)
        .to_string();
    if HttpMethod::parse(&http_method).is_none() {
        return Err(ConfigError::InvalidMethod {
            webhook: id,
            method: http_method,
        });
    }

    let trigger_type = entry
        .trigger_type
        .as_deref()
        .map(|name| {
            name.parse::<TriggerType>()
                .map_err(|_| ConfigError::InvalidTriggerType {
                    webhook: id.clone(),
                    value: name.to_string(),
                })
        })
        .transpose()?;

    validate_url(&id, entry)?;
    let headers = build_headers(&id, entry)?;

    for (field, template) in [
        ("trigger_template", &entry.trigger_template),
        ("url_template", &entry.url_template),
        ("headers_template", &entry.headers_template),
        ("data", &entry.data),
    ] {
        if let Some(template) = template {
            validate_template(&id, field, template)?;
        }
    }

    Ok(Webhook {
        id,
        name: entry.name.clone(),
        organization: entry.organization.clone(),
        team: entry.team.clone(),
        user: entry.user.clone(),
        created_at: Utc::now(),
        deleted_at: None,
        username: entry.username.clone(),
        password: entry.password.clone(),
        authorization_header: entry.authorization_header.clone(),
        trigger_template: entry.trigger_template.clone(),
        headers,
        headers_template: entry.headers_template.clone(),
        url: entry.url.clone(),
        url_template: entry.url_template.clone(),
        data: entry.data.clone(),
        forward_all: entry.forward_all.unwrap_or(true),
        http_method,
        trigger_type,
    })
}

/// A static URL is only checked when no template overrides it.
fn validate_url(id: &str, entry: &WebhookEntry) -> Result<(), ConfigError> {
    if entry.url_template.as_deref().is_some_and(|t| !t.is_empty()) {
        return Ok(());
    }

    let raw = entry
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ConfigError::MissingUrl {
            webhook: id.to_string(),
        })?;

    let invalid = |reason: String| ConfigError::InvalidUrl {
        webhook: id.to_string(),
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_string()));
    }
    Ok(())
}

fn build_headers(id: &str, entry: &WebhookEntry) -> Result<Value, ConfigError> {
    let mut headers = Map::new();
    for (name, value) in &entry.headers {
        name.parse::<HeaderName>()
            .map_err(|e| ConfigError::InvalidHeaderName {
                webhook: id.to_string(),
                name: name.clone(),
                reason: e.to_string(),
            })?;
        HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeaderValue {
            webhook: id.to_string(),
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(name.clone(), Value::String(value.clone()));
    }
    Ok(Value::Object(headers))
}

/// Compile-check only; rendering needs event data.
fn validate_template(id: &str, field: &'static str, template: &str) -> Result<(), ConfigError> {
    Template::compile(template)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidTemplate {
            webhook: id.to_string(),
            field,
            reason: e.to_string(),
        })
}
