//! Transport layer for executing outgoing webhook requests.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`])
//! - Handling HTTP responses ([`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])

mod client;
mod error;
mod message;

#[cfg(test)]
mod client_tests;

use std::time::Duration;

pub use client::ReqwestClient;
pub use error::HttpError;
pub use message::{HttpClient, HttpRequest, HttpResponse};

/// Fixed timeout applied to every outgoing webhook request, regardless of method.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);
