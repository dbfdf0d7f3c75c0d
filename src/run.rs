//! Subcommand execution.
//!
//! This module turns a parsed [`Command`] and the validated configuration
//! into dispatcher calls and prints their results.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use alert_webhooks::config::{Command, ConfigError, ValidatedConfig, write_default_config};
use alert_webhooks::dispatch::{DispatchError, DispatchOutcome, Dispatcher, Event, Outcome, Preview};
use alert_webhooks::model::{Webhook, WebhookLog};
use alert_webhooks::store::{FileStore, StoreError, WebhookStore};
use alert_webhooks::template::HandlebarsEngine;
use alert_webhooks::transport::ReqwestClient;

/// Type alias for the application's dispatcher.
type AppDispatcher = Dispatcher<FileStore, ReqwestClient, HandlebarsEngine>;

/// Event path that reads from standard input.
const STDIN_PATH: &str = "-";

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to write the configuration template.
    #[error("Failed to write configuration template: {0}")]
    Init(#[source] ConfigError),

    /// Failed to build the HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Failed to read the event data.
    #[error("Failed to read event from '{}': {source}", path.display())]
    EventRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Event data is not valid JSON.
    #[error("Event data from '{}' is not valid JSON: {source}", path.display())]
    EventParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A single webhook test failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Failed to read the audit log.
    #[error("Failed to read webhook logs: {0}")]
    Logs(#[from] StoreError),

    /// Some webhooks of a dispatch failed; details are in the audit log.
    #[error("{failed} of {total} webhook(s) failed")]
    Deliveries { failed: usize, total: usize },
}

/// Writes the configuration template to `output`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn init(output: &Path) -> Result<(), RunError> {
    write_default_config(output).map_err(RunError::Init)?;
    println!("Configuration template written to: {}", output.display());
    Ok(())
}

/// Executes `command` against the validated configuration.
///
/// # Errors
///
/// Returns an error if:
/// - The event data cannot be read or parsed
/// - The HTTP client cannot be created
/// - A tested webhook fails, or any webhook of a dispatch fails
/// - The audit log cannot be read
pub async fn execute(command: Command, config: ValidatedConfig) -> Result<(), RunError> {
    let scope = command.scope();

    match command {
        Command::Init { output } => init(&output),
        Command::List => {
            list(&config.webhooks);
            Ok(())
        }
        Command::Dispatch { trigger, event, .. } => {
            let data = read_event(&event).await?;
            let event = Event::new(trigger.into(), data).with_scope(scope);
            let dispatcher = create_dispatcher(&config)?;
            dispatch(&dispatcher, &event).await
        }
        Command::Test {
            webhook,
            event,
            dry_run,
        } => {
            let data = read_event(&event).await?;
            let dispatcher = create_dispatcher(&config)?;
            if dry_run {
                let preview = dispatcher.preview(&webhook, &data)?;
                println!("{}", describe_preview(&preview));
            } else {
                let outcome = dispatcher.test_webhook(&webhook, &data).await?;
                println!("{}", describe_outcome(&outcome));
            }
            Ok(())
        }
        Command::Logs { webhook } => {
            let store = FileStore::new(config.webhooks, config.log_file);
            let logs = store.logs_for(&webhook)?;
            if logs.is_empty() {
                println!("No logs for webhook {webhook}");
            }
            for log in &logs {
                println!("{}", describe_log(log));
            }
            Ok(())
        }
    }
}

/// Creates the dispatcher from configuration.
fn create_dispatcher(config: &ValidatedConfig) -> Result<AppDispatcher, RunError> {
    let client =
        ReqwestClient::with_timeout(config.request_timeout).map_err(RunError::HttpClient)?;
    let store = FileStore::new(config.webhooks.clone(), config.log_file.clone());
    let engine = HandlebarsEngine::with_strict_mode(config.strict_templates);

    Ok(Dispatcher::new(store, client, engine)
        .with_max_concurrency(config.max_concurrency)
        .with_request_timeout(config.request_timeout))
}

/// Reads event data from a file, or from stdin when `path` is `-`.
async fn read_event(path: &Path) -> Result<Value, RunError> {
    let read_error = |source| RunError::EventRead {
        path: path.to_path_buf(),
        source,
    };

    let content = if path == Path::new(STDIN_PATH) {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .map_err(read_error)?;
        content
    } else {
        tokio::fs::read_to_string(path).await.map_err(read_error)?
    };

    serde_json::from_str(&content).map_err(|source| RunError::EventParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Dispatches `event`, cancelling in-flight webhooks on Ctrl+C.
async fn dispatch(dispatcher: &AppDispatcher, event: &Event) -> Result<(), RunError> {
    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling dispatch...");
                cancel.cancel();
            }
        }
    });

    let outcomes = dispatcher.dispatch_with_cancel(event, cancel).await;
    interrupt.abort();

    for outcome in &outcomes {
        println!("{}", describe_dispatch_outcome(outcome));
    }
    check_outcomes(&outcomes)
}

/// Fails when any outcome carries an error.
fn check_outcomes(outcomes: &[DispatchOutcome]) -> Result<(), RunError> {
    let failed = outcomes.iter().filter(|o| o.error().is_some()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(RunError::Deliveries {
            failed,
            total: outcomes.len(),
        })
    }
}

fn list(webhooks: &[Webhook]) {
    if webhooks.is_empty() {
        println!("No webhooks configured");
        return;
    }
    for webhook in webhooks {
        println!("{}", describe_webhook(webhook));
    }
}

/// One-line summary of a configured webhook.
fn describe_webhook(webhook: &Webhook) -> String {
    let trigger = webhook
        .trigger_type
        .map_or("-", |trigger| trigger.as_str());
    let url = webhook
        .url_template
        .as_deref()
        .or(webhook.url.as_deref())
        .unwrap_or("-");

    format!(
        "{id}  {trigger}  {method}  {url}  ({name})",
        id = webhook.id,
        method = webhook.http_method,
        name = webhook.display_name(),
    )
}

fn describe_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::NotFired { .. } => outcome.to_string(),
        Outcome::Delivered(delivery) => {
            format!("{outcome}\n{}", delivery.response.body_text_lossy())
        }
    }
}

fn describe_dispatch_outcome(outcome: &DispatchOutcome) -> String {
    match &outcome.result {
        Ok(result) => format!("{}: {result}", outcome.webhook_id),
        Err(e) => format!("{}: FAILED {e}", outcome.webhook_id),
    }
}

fn describe_preview(preview: &Preview) -> String {
    preview.request.as_ref().map_or_else(
        || {
            format!(
                "Trigger did not fire (rendered '{}')",
                preview.decision.rendered
            )
        },
        alert_webhooks::render::RenderedRequest::to_log_string,
    )
}

/// One-line summary of an audit record.
fn describe_log(log: &WebhookLog) -> String {
    format!(
        "{at}  {status}  {url}  {response}",
        at = log.last_run_at.to_rfc3339(),
        status = log.response_status.as_deref().unwrap_or("-"),
        url = log.url.as_deref().unwrap_or("-"),
        response = log.response.as_deref().unwrap_or(""),
    )
}
