//! Webhook configuration and audit record types.
//!
//! This module provides:
//! - The persisted webhook configuration ([`Webhook`])
//! - The per-execution audit record ([`WebhookLog`])
//! - The closed sets of trigger types and HTTP methods ([`TriggerType`], [`HttpMethod`])
//! - The ownership scope an event is dispatched under ([`OwnerScope`])
//! - Public key generation for new webhooks ([`generate_public_key`])

mod key;
mod log;
mod method;
mod trigger_type;
mod webhook;


pub use key::{KeyGenerationError, generate_public_key, random_key};
pub use log::WebhookLog;
pub use method::{HttpMethod, UnknownHttpMethod};
pub use trigger_type::{TriggerType, UnknownTriggerType};
pub use webhook::{OwnerScope, Webhook};
