//! Home Assistant entity types and structures.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Home Assistant connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HassConnectionConfig {
    /// Home Assistant URL (e.g., http://192.168.1.100:8123)
    pub url: String,

    /// Long-lived access token
    pub token: String,

    /// Request timeout in seconds; the HTTP client default applies when unset
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl HassConnectionConfig {
    /// Create a connection config for a plain-HTTP host and port.
    pub fn new(host: &str, port: u16, token: impl Into<String>) -> Self {
        Self {
            url: format!("http://{}:{}", host, port),
            token: token.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> String {
        format!("{}/api", self.url.trim_end_matches('/'))
    }

    /// Get the authorization header value.
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Home Assistant entity state, as returned by `GET /api/states/{entity_id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HassEntityState {
    /// Entity ID (e.g., climate.living_room)
    #[serde(default)]
    pub entity_id: String,

    /// Current state value
    #[serde(default)]
    pub state: String,

    /// Entity attributes
    #[serde(default)]
    pub attributes: Map<String, JsonValue>,

    #[serde(default)]
    pub last_changed: Option<String>,

    #[serde(default)]
    pub last_updated: Option<String>,
}

impl HassEntityState {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Named attribute, or 0 when the entity does not report it.
    pub fn attribute_or_zero(&self, name: &str) -> JsonValue {
        self.attributes
            .get(name)
            .cloned()
            .unwrap_or_else(|| JsonValue::from(0))
    }
}

/// Home Assistant entity domains with built-in point handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HassDomain {
    Light,
    Fan,
    Climate,
    Switch,
    Siren,
    Humidifier,
    LawnMower,
    InputBoolean,
    #[serde(other)]
    Unknown,
}

impl HassDomain {
    /// Domain prefix of an entity ID: the text before the first `.`.
    pub fn prefix(entity_id: &str) -> &str {
        entity_id.split('.').next().unwrap_or(entity_id)
    }

    /// Parse domain from entity ID.
    pub fn from_entity_id(entity_id: &str) -> Self {
        Self::from_name(Self::prefix(entity_id))
    }

    pub fn from_name(domain: &str) -> Self {
        match domain {
            "light" => HassDomain::Light,
            "fan" => HassDomain::Fan,
            "climate" => HassDomain::Climate,
            "switch" => HassDomain::Switch,
            "siren" => HassDomain::Siren,
            "humidifier" => HassDomain::Humidifier,
            "lawn_mower" => HassDomain::LawnMower,
            "input_boolean" => HassDomain::InputBoolean,
            _ => HassDomain::Unknown,
        }
    }

    /// Get the domain as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            HassDomain::Light => "light",
            HassDomain::Fan => "fan",
            HassDomain::Climate => "climate",
            HassDomain::Switch => "switch",
            HassDomain::Siren => "siren",
            HassDomain::Humidifier => "humidifier",
            HassDomain::LawnMower => "lawn_mower",
            HassDomain::InputBoolean => "input_boolean",
            HassDomain::Unknown => "unknown",
        }
    }

    /// Domains whose `state` is a plain on/off toggle.
    pub fn is_on_off(&self) -> bool {
        matches!(
            self,
            HassDomain::Light
                | HassDomain::Fan
                | HassDomain::Switch
                | HassDomain::Siren
                | HassDomain::Humidifier
                | HassDomain::InputBoolean
        )
    }
}

/// Service call request for Home Assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HassServiceCall {
    /// Domain (e.g., "light", "climate")
    pub domain: String,

    /// Service name (e.g., "turn_on", "set_hvac_mode")
    pub service: String,

    /// Service data (entity_id and parameters)
    pub service_data: JsonValue,
}

impl HassServiceCall {
    /// Create a new service call targeting one entity.
    pub fn new(domain: impl Into<String>, service: impl Into<String>, entity_id: &str) -> Self {
        let mut service_data = Map::new();
        service_data.insert("entity_id".to_string(), JsonValue::from(entity_id));

        Self {
            domain: domain.into(),
            service: service.into(),
            service_data: JsonValue::Object(service_data),
        }
    }

    /// Add a parameter to the service call.
    pub fn with_param(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        if let Some(obj) = self.service_data.as_object_mut() {
            obj.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn param(&self, key: &str) -> Option<&JsonValue> {
        self.service_data.get(key)
    }

    /// Human-readable label used in logs, e.g. `light/turn_on light.kitchen`.
    pub fn describe(&self) -> String {
        let entity = self
            .service_data
            .get("entity_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        format!("{}/{} {}", self.domain, self.service, entity)
    }
}
