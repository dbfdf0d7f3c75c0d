//! The persisted webhook configuration entity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{HttpMethod, TriggerType};

/// Ownership references an event is dispatched under.
///
/// A webhook only matches an event when every ownership reference set on the
/// webhook equals the event's corresponding reference. References left unset
/// on the webhook do not restrict matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerScope {
    /// Owning organization
    pub organization: Option<String>,
    /// Owning team
    pub team: Option<String>,
    /// Owning user
    pub user: Option<String>,
}

impl OwnerScope {
    /// Creates a scope restricted to a single organization.
    #[must_use]
    pub fn organization(organization: impl Into<String>) -> Self {
        Self {
            organization: Some(organization.into()),
            ..Self::default()
        }
    }

    /// Sets the team reference.
    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Sets the user reference.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// An outgoing webhook configuration.
///
/// The dispatch path reads every field here and nothing else. Templated
/// fields take precedence over their static counterparts:
/// - `url_template` overrides `url`
/// - `headers_template` replaces `headers` entirely (no merge)
/// - `forward_all` overrides `data`
///
/// `authorization_header`, when set, always overwrites any `Authorization`
/// header produced by the header step.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    /// Immutable public key, globally unique
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Owning organization
    #[serde(default)]
    pub organization: Option<String>,
    /// Owning team
    #[serde(default)]
    pub team: Option<String>,
    /// Owning user
    #[serde(default)]
    pub user: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker; `None` means active
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// HTTP Basic auth username (used only together with `password`)
    #[serde(default)]
    pub username: Option<String>,
    /// HTTP Basic auth password (used only together with `username`)
    #[serde(default)]
    pub password: Option<String>,
    /// Static `Authorization` header value
    #[serde(default)]
    pub authorization_header: Option<String>,
    /// Template deciding whether the webhook fires; `None` means always
    #[serde(default)]
    pub trigger_template: Option<String>,
    /// Static headers as a JSON object
    #[serde(default = "empty_object")]
    pub headers: Value,
    /// Template rendering to a JSON object of headers
    #[serde(default)]
    pub headers_template: Option<String>,
    /// Static target URL
    #[serde(default)]
    pub url: Option<String>,
    /// Template rendering to the target URL
    #[serde(default)]
    pub url_template: Option<String>,
    /// Body template
    #[serde(default)]
    pub data: Option<String>,
    /// Send the full event payload as the body, ignoring `data`
    #[serde(default = "default_forward_all")]
    pub forward_all: bool,
    /// Configured HTTP method name, validated at render time
    #[serde(default = "default_http_method")]
    pub http_method: String,
    /// Event category this webhook reacts to; `None` means manual only
    #[serde(default)]
    pub trigger_type: Option<TriggerType>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

const fn default_forward_all() -> bool {
    true
}

fn default_http_method() -> String {
    HttpMethod::Post.as_str().to_string()
}

impl Webhook {
    /// Creates an active webhook with default settings.
    ///
    /// Defaults: `POST`, `forward_all = true`, empty static headers,
    /// no templates, no trigger type, no credentials.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            organization: None,
            team: None,
            user: None,
            created_at: Utc::now(),
            deleted_at: None,
            username: None,
            password: None,
            authorization_header: None,
            trigger_template: None,
            headers: empty_object(),
            headers_template: None,
            url: None,
            url_template: None,
            data: None,
            forward_all: default_forward_all(),
            http_method: default_http_method(),
            trigger_type: None,
        }
    }

    /// Sets the static URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the URL template.
    #[must_use]
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    /// Sets the HTTP method name. Unsupported names are accepted here and
    /// rejected when a request is rendered.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = method.into();
        self
    }

    /// Sets the trigger type.
    #[must_use]
    pub const fn with_trigger_type(mut self, trigger_type: TriggerType) -> Self {
        self.trigger_type = Some(trigger_type);
        self
    }

    /// Sets the trigger template.
    #[must_use]
    pub fn with_trigger_template(mut self, template: impl Into<String>) -> Self {
        self.trigger_template = Some(template.into());
        self
    }

    /// Sets the static headers object.
    #[must_use]
    pub fn with_headers(mut self, headers: Value) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the headers template.
    #[must_use]
    pub fn with_headers_template(mut self, template: impl Into<String>) -> Self {
        self.headers_template = Some(template.into());
        self
    }

    /// Sets the static `Authorization` header value.
    #[must_use]
    pub fn with_authorization_header(mut self, value: impl Into<String>) -> Self {
        self.authorization_header = Some(value.into());
        self
    }

    /// Sets HTTP Basic auth credentials.
    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the body template and disables `forward_all`.
    #[must_use]
    pub fn with_data(mut self, template: impl Into<String>) -> Self {
        self.data = Some(template.into());
        self.forward_all = false;
        self
    }

    /// Sets the `forward_all` flag.
    #[must_use]
    pub const fn with_forward_all(mut self, forward_all: bool) -> Self {
        self.forward_all = forward_all;
        self
    }

    /// Sets the ownership references.
    #[must_use]
    pub fn with_owner(mut self, scope: OwnerScope) -> Self {
        self.organization = scope.organization;
        self.team = scope.team;
        self.user = scope.user;
        self
    }

    /// Returns true if the webhook has not been soft-deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Returns true if this webhook should be considered for an event.
    ///
    /// The webhook must be active, configured for `trigger_type`, and every
    /// ownership reference it sets must equal the event's.
    #[must_use]
    pub fn matches(&self, trigger_type: TriggerType, scope: &OwnerScope) -> bool {
        fn owned_by(own: Option<&String>, event: Option<&String>) -> bool {
            own.is_none_or(|own| event == Some(own))
        }

        self.is_active()
            && self.trigger_type == Some(trigger_type)
            && owned_by(self.organization.as_ref(), scope.organization.as_ref())
            && owned_by(self.team.as_ref(), scope.team.as_ref())
            && owned_by(self.user.as_ref(), scope.user.as_ref())
    }

    /// Returns the Basic auth credentials if both username and password are set.
    #[must_use]
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// Returns the name if set, otherwise the public key.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl fmt::Debug for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Webhook")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("organization", &self.organization)
            .field("team", &self.team)
            .field("user", &self.user)
            .field("created_at", &self.created_at)
            .field("deleted_at", &self.deleted_at)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("authorization_header", &self.authorization_header.as_ref().map(|_| "***"))
            .field("trigger_template", &self.trigger_template)
            .field("headers", &self.headers)
            .field("headers_template", &self.headers_template)
            .field("url", &self.url)
            .field("url_template", &self.url_template)
            .field("data", &self.data)
            .field("forward_all", &self.forward_all)
            .field("http_method", &self.http_method)
            .field("trigger_type", &self.trigger_type)
            .finish()
    }
}
