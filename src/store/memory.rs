//! In-memory store.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::model::{OwnerScope, TriggerType, Webhook, WebhookLog, generate_public_key};

use super::{StoreError, WebhookStore};

/// [`WebhookStore`] keeping webhooks and logs in memory.
///
/// Insertion order is preserved, so `matching` returns webhooks in the
/// order they were added.
#[derive(Debug, Default)]
pub struct MemoryStore {
    webhooks: RwLock<Vec<Webhook>>,
    logs: RwLock<Vec<WebhookLog>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `webhooks` as given, without key checks.
    #[must_use]
    pub fn with_webhooks(webhooks: Vec<Webhook>) -> Self {
        Self {
            webhooks: RwLock::new(webhooks),
            logs: RwLock::default(),
        }
    }

    /// Adds a webhook and returns its public key.
    ///
    /// A webhook with an empty `id` is assigned a freshly generated key.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateId`] if the key is already taken
    /// - [`StoreError::KeyGeneration`] if no unique key could be generated
    pub fn insert(&self, mut webhook: Webhook) -> Result<String, StoreError> {
        let mut webhooks = self.webhooks.write().unwrap_or_else(PoisonError::into_inner);
        let taken = |key: &str| webhooks.iter().any(|w| w.id == key);

        if webhook.id.is_empty() {
            webhook.id = generate_public_key(taken)?;
        } else if taken(&webhook.id) {
            return Err(StoreError::DuplicateId(webhook.id));
        }

        let id = webhook.id.clone();
        webhooks.push(webhook);
        Ok(id)
    }

    /// Marks webhook `id` as deleted at `at`.
    ///
    /// Returns false if no active webhook has that key.
    pub fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> bool {
        let mut webhooks = self.webhooks.write().unwrap_or_else(PoisonError::into_inner);
        match webhooks.iter_mut().find(|w| w.id == id && w.is_active()) {
            Some(webhook) => {
                webhook.deleted_at = Some(at);
                true
            }
            None => false,
        }
    }

    /// Removes webhook `id` together with all of its logs.
    ///
    /// Returns false if no webhook has that key.
    pub fn purge(&self, id: &str) -> bool {
        let mut webhooks = self.webhooks.write().unwrap_or_else(PoisonError::into_inner);
        let before = webhooks.len();
        webhooks.retain(|w| w.id != id);
        if webhooks.len() == before {
            return false;
        }

        self.logs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|log| log.webhook_id != id);
        true
    }

    /// Returns every stored log, oldest first.
    #[must_use]
    pub fn logs(&self) -> Vec<WebhookLog> {
        self.logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl WebhookStore for MemoryStore {
    fn matching(&self, trigger_type: TriggerType, scope: &OwnerScope) -> Vec<Webhook> {
        self.webhooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|w| w.matches(trigger_type, scope))
            .cloned()
            .collect()
    }

    fn get(&self, id: &str) -> Option<Webhook> {
        self.webhooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|w| w.id == id && w.is_active())
            .cloned()
    }

    async fn append_log(&self, log: WebhookLog) -> Result<(), StoreError> {
        self.logs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(log);
        Ok(())
    }

    fn logs_for(&self, id: &str) -> Result<Vec<WebhookLog>, StoreError> {
        Ok(self
            .logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|log| log.webhook_id == id)
            .cloned()
            .collect())
    }
}
