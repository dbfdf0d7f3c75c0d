//! Alert Webhooks: outbound webhook dispatch for alert group lifecycle events
//!
//! A library for evaluating webhook trigger templates, rendering HTTP
//! requests from event data, sending them with bounded concurrency and
//! recording an audit log of every execution.

pub mod config;
pub mod dispatch;
pub mod model;
pub mod render;
pub mod store;
pub mod template;
pub mod time;
pub mod transport;
pub mod trigger;
