//! Request rendering: turns a webhook configuration plus event data into a
//! concrete HTTP request.

use std::collections::BTreeMap;
use std::fmt;

use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue};
use serde_json::{Map, Value, json};
use url::Url;

use crate::dispatch::DispatchError;
use crate::model::{HttpMethod, Webhook};
use crate::template::TemplateEngine;
use crate::transport::{HttpError, HttpRequest};

const AUTHORIZATION: &str = "Authorization";

/// How rendering failures of the body template are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Substitute `{"error": <fallback message>}` as the body and continue.
    #[default]
    Lenient,
    /// Fail with [`DispatchError::InvalidWebhookData`].
    Strict,
}

/// Body of a rendered request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured body, sent as JSON.
    Json(Value),
    /// Opaque text body, sent verbatim.
    Text(String),
}

/// HTTP Basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A fully resolved request, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Final target URL
    pub url: Url,
    /// Header name to value, in name order
    pub headers: BTreeMap<String, String>,
    /// Body; always `None` for methods other than POST and PUT
    pub body: Option<RequestBody>,
    /// Basic credentials, independent of the `Authorization` header
    pub auth: Option<BasicAuth>,
}

impl RenderedRequest {
    /// Serializes the request for the audit log.
    ///
    /// The Basic auth password is never written out.
    #[must_use]
    pub fn to_log_string(&self) -> String {
        let body = match &self.body {
            Some(RequestBody::Json(value)) => json!({ "json": value }),
            Some(RequestBody::Text(text)) => json!({ "data": text }),
            None => Value::Null,
        };
        let auth = self
            .auth
            .as_ref()
            .map_or(Value::Null, |auth| json!({ "username": auth.username }));

        json!({
            "method": self.method.as_str(),
            "url": self.url.as_str(),
            "headers": self.headers,
            "body": body,
            "auth": auth,
        })
        .to_string()
    }

    /// Builds the wire request.
    ///
    /// JSON bodies get `Content-Type: application/json` unless a rendered
    /// header already sets a content type. Basic credentials are applied
    /// last and take the `Authorization` header on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if a header cannot be encoded.
    pub fn to_http_request(&self) -> Result<HttpRequest, HttpError> {
        let mut request = HttpRequest::new(self.method.to_http(), self.url.clone());

        for (name, value) in &self.headers {
            request = request.try_with_header(name, value)?;
        }

        match &self.body {
            Some(RequestBody::Json(value)) => {
                if !request.headers.contains_key(CONTENT_TYPE) {
                    request = request
                        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                request = request.with_body(value.to_string().into_bytes());
            }
            Some(RequestBody::Text(text)) => {
                request = request.with_body(text.clone().into_bytes());
            }
            None => {}
        }

        if let Some(auth) = &self.auth {
            request = request.with_basic_auth(&auth.username, &auth.password);
        }

        Ok(request)
    }
}

/// Builds [`RenderedRequest`]s from webhook configuration and event data.
///
/// Steps run in a fixed order and each may fail independently:
/// method, URL, headers, `Authorization` override, Basic auth, body.
#[derive(Debug)]
pub struct RequestRenderer<'a, T: ?Sized> {
    engine: &'a T,
    mode: RenderMode,
}

impl<'a, T: TemplateEngine + ?Sized> RequestRenderer<'a, T> {
    /// Creates a renderer using `engine` for every templated field.
    #[must_use]
    pub const fn new(engine: &'a T, mode: RenderMode) -> Self {
        Self { engine, mode }
    }

    /// Renders the request for `webhook` against `event_data`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::UnsupportedHttpMethod`] for a method outside the fixed set
    /// - [`DispatchError::InvalidWebhookUrl`] for a missing, unrenderable or invalid URL
    /// - [`DispatchError::InvalidWebhookHeaders`] for unrenderable or non-object headers
    /// - [`DispatchError::InvalidWebhookData`] for an unrenderable body, in strict mode only
    pub fn render(&self, webhook: &Webhook, event_data: &Value) -> Result<RenderedRequest, DispatchError> {
        let method = HttpMethod::parse(&webhook.http_method)
            .ok_or_else(|| DispatchError::UnsupportedHttpMethod(webhook.http_method.clone()))?;

        let url = self.render_url(webhook, event_data)?;

        let mut headers = self.render_headers(webhook, event_data)?;
        if let Some(authorization) = webhook
            .authorization_header
            .as_deref()
            .filter(|v| !v.is_empty())
        {
            override_authorization(&mut headers, authorization)?;
        }

        let auth = webhook
            .basic_credentials()
            .map(|(username, password)| BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            });

        let body = self.render_body(method, webhook, event_data)?;

        Ok(RenderedRequest {
            method,
            url,
            headers,
            body,
            auth,
        })
    }

    fn render_url(&self, webhook: &Webhook, event_data: &Value) -> Result<Url, DispatchError> {
        let url = match webhook.url_template.as_deref().filter(|t| !t.is_empty()) {
            Some(template) => self
                .engine
                .render(template, event_data)
                .map_err(|e| DispatchError::InvalidWebhookUrl(e.fallback_message().to_string()))?,
            None => webhook
                .url
                .clone()
                .ok_or_else(|| DispatchError::InvalidWebhookUrl("URL is not set".to_string()))?,
        };

        parse_url(url.trim())
    }

    fn render_headers(
        &self,
        webhook: &Webhook,
        event_data: &Value,
    ) -> Result<BTreeMap<String, String>, DispatchError> {
        let object = match webhook.headers_template.as_deref().filter(|t| !t.is_empty()) {
            Some(template) => {
                let rendered = self.engine.render_json(template, event_data).map_err(|e| {
                    DispatchError::InvalidWebhookHeaders(e.fallback_message().to_string())
                })?;
                parse_header_object(&rendered)?
            }
            None => static_headers(&webhook.headers)?,
        };

        let mut headers = BTreeMap::new();
        for (name, value) in object {
            let value = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            validate_header(&name, &value)?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    fn render_body(
        &self,
        method: HttpMethod,
        webhook: &Webhook,
        event_data: &Value,
    ) -> Result<Option<RequestBody>, DispatchError> {
        if !method.carries_body() {
            return Ok(None);
        }

        if webhook.forward_all {
            return Ok(Some(RequestBody::Json(event_data.clone())));
        }

        let Some(template) = webhook.data.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        match self.engine.render_json(template, event_data) {
            Ok(rendered) => Ok(Some(
                serde_json::from_str::<Value>(&rendered)
                    .map_or_else(|_| RequestBody::Text(rendered), RequestBody::Json),
            )),
            Err(e) if self.mode == RenderMode::Strict => Err(DispatchError::InvalidWebhookData(
                e.fallback_message().to_string(),
            )),
            Err(e) => {
                tracing::warn!(
                    webhook = %webhook.id,
                    "Data template failed, sending error body: {}",
                    e.fallback_message()
                );
                Ok(Some(RequestBody::Json(
                    json!({ "error": e.fallback_message() }),
                )))
            }
        }
    }
}

/// Parses and checks a webhook URL: absolute, http(s), with a host.
fn parse_url(raw: &str) -> Result<Url, DispatchError> {
    let url = Url::parse(raw)
        .map_err(|e| DispatchError::InvalidWebhookUrl(format!("'{raw}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DispatchError::InvalidWebhookUrl(format!(
            "'{raw}': scheme must be http or https"
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(DispatchError::InvalidWebhookUrl(format!("'{raw}': missing host")));
    }

    Ok(url)
}

fn parse_header_object(rendered: &str) -> Result<Map<String, Value>, DispatchError> {
    match serde_json::from_str::<Value>(rendered) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(DispatchError::InvalidWebhookHeaders(
            "Template did not result in json/dict".to_string(),
        )),
    }
}

/// Static headers may be stored as an object or as JSON text of an object.
fn static_headers(headers: &Value) -> Result<Map<String, Value>, DispatchError> {
    match headers {
        Value::Null => Ok(Map::new()),
        Value::Object(object) => Ok(object.clone()),
        Value::String(text) if text.trim().is_empty() => Ok(Map::new()),
        Value::String(text) => parse_header_object(text),
        _ => Err(DispatchError::InvalidWebhookHeaders(
            "Headers must be a JSON object".to_string(),
        )),
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), DispatchError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| DispatchError::InvalidWebhookHeaders(format!("header name '{name}': {e}")))?;
    HeaderValue::from_str(value).map_err(|e| {
        DispatchError::InvalidWebhookHeaders(format!("header value for '{name}': {e}"))
    })?;
    Ok(())
}

/// Forces the `Authorization` header, dropping any differently-cased variant.
fn override_authorization(
    headers: &mut BTreeMap<String, String>,
    value: &str,
) -> Result<(), DispatchError> {
    validate_header(AUTHORIZATION, value)?;
    headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
    headers.insert(AUTHORIZATION.to_string(), value.to_string());
    Ok(())
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
