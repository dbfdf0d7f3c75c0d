//! File-backed store: fixed webhook list plus a JSON Lines audit log.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::model::{OwnerScope, TriggerType, Webhook, WebhookLog};

use super::{StoreError, WebhookStore};

/// [`WebhookStore`] serving configured webhooks and appending logs to a file.
///
/// Each log record is one JSON object per line. Writes append only, so
/// records from concurrent executions never overwrite each other.
#[derive(Debug, Clone)]
pub struct FileStore {
    webhooks: Vec<Webhook>,
    log_path: PathBuf,
}

impl FileStore {
    /// Creates a store over `webhooks`, logging to `log_path`.
    #[must_use]
    pub fn new(webhooks: Vec<Webhook>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            webhooks,
            log_path: log_path.into(),
        }
    }

    /// Returns the path to the log file.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Returns every configured webhook, active or not.
    #[must_use]
    pub fn webhooks(&self) -> &[Webhook] {
        &self.webhooks
    }

    /// Performs the blocking append.
    ///
    /// Separated out so it can be wrapped in `spawn_blocking`.
    fn append_blocking(path: &Path, line: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::Write)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(StoreError::Write)?;
        writeln!(file, "{line}").map_err(StoreError::Write)
    }
}

impl WebhookStore for FileStore {
    fn matching(&self, trigger_type: TriggerType, scope: &OwnerScope) -> Vec<Webhook> {
        self.webhooks
            .iter()
            .filter(|w| w.matches(trigger_type, scope))
            .cloned()
            .collect()
    }

    fn get(&self, id: &str) -> Option<Webhook> {
        self.webhooks
            .iter()
            .find(|w| w.id == id && w.is_active())
            .cloned()
    }

    async fn append_log(&self, log: WebhookLog) -> Result<(), StoreError> {
        let line = serde_json::to_string(&log).map_err(StoreError::Serialize)?;
        let path = self.log_path.clone();

        tokio::task::spawn_blocking(move || Self::append_blocking(&path, &line))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    fn logs_for(&self, id: &str) -> Result<Vec<WebhookLog>, StoreError> {
        let content = match std::fs::read_to_string(&self.log_path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Read(e)),
        };

        let logs = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str::<WebhookLog>(line) {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!(
                        "Skipping corrupt log line {} in {}: {e}",
                        index + 1,
                        self.log_path.display()
                    );
                    None
                }
            })
            .filter(|log| log.webhook_id == id)
            .collect();

        Ok(logs)
    }
}
