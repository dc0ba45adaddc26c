//! Per-domain entity handlers.
//!
//! A handler turns one semantic write (set the state, set the brightness, ...)
//! into exactly one validated Home Assistant service call. Validation happens
//! before anything is sent, so a rejected value never reaches the network.
//!
//! | Domain | `state` | Other actions |
//! |--------|---------|---------------|
//! | light | 0/1 | brightness |
//! | input_boolean, switch | 0/1 | - |
//! | siren | 0/1 | volume_level, tone, duration |
//! | humidifier | 0/1 | humidity, mode |
//! | fan | 0/1 | percentage, preset_mode, direction, oscillating |
//! | climate | 0/2/3/4 hvac mode | temperature |
//! | lawn_mower | 0 dock, 1 mow, 2 pause | - |

use crate::client::HassApi;
use crate::entities::HassServiceCall;
use crate::error::{DriverError, DriverResult};
use crate::value::PointValue;
use std::fmt;
use std::sync::Arc;

/// Writable entity attribute, resolved from a register's entity point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityAction {
    State,
    Brightness,
    Temperature,
    Percentage,
    PresetMode,
    Direction,
    Oscillating,
    VolumeLevel,
    Tone,
    Duration,
    Humidity,
    Mode,
    /// Attribute no built-in handler knows how to write
    Other(String),
}

impl EntityAction {
    pub fn from_point(entity_point: &str) -> Self {
        match entity_point {
            "state" => Self::State,
            "brightness" => Self::Brightness,
            "temperature" => Self::Temperature,
            "percentage" => Self::Percentage,
            "preset_mode" => Self::PresetMode,
            "direction" => Self::Direction,
            "oscillating" => Self::Oscillating,
            "volume_level" => Self::VolumeLevel,
            "tone" => Self::Tone,
            "duration" => Self::Duration,
            "humidity" => Self::Humidity,
            "mode" => Self::Mode,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::State => "state",
            Self::Brightness => "brightness",
            Self::Temperature => "temperature",
            Self::Percentage => "percentage",
            Self::PresetMode => "preset_mode",
            Self::Direction => "direction",
            Self::Oscillating => "oscillating",
            Self::VolumeLevel => "volume_level",
            Self::Tone => "tone",
            Self::Duration => "duration",
            Self::Humidity => "humidity",
            Self::Mode => "mode",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single write request handed to a domain handler.
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    pub entity_id: &'a str,
    pub action: &'a EntityAction,
    pub value: &'a PointValue,
    /// Unit label of the register being written (temperature conversion)
    pub units: Option<&'a str>,
}

/// Translates writes on one Home Assistant domain into service calls.
///
/// Implementations are stateless; the factory shares one instance per domain.
pub trait DomainHandler: Send + Sync {
    /// Build the service call for a write, or reject it.
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall>;
}

/// Handler bound to one entity and an API handle, created per operation.
pub struct Entity {
    api: Arc<dyn HassApi>,
    entity_id: String,
    handler: Arc<dyn DomainHandler>,
}

impl Entity {
    pub fn new(
        api: Arc<dyn HassApi>,
        entity_id: impl Into<String>,
        handler: Arc<dyn DomainHandler>,
    ) -> Self {
        Self {
            api,
            entity_id: entity_id.into(),
            handler,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub async fn set_state(&self, value: &PointValue) -> DriverResult<()> {
        self.apply(&EntityAction::State, value, None).await
    }

    /// Validate and send one write.
    pub async fn apply(
        &self,
        action: &EntityAction,
        value: &PointValue,
        units: Option<&str>,
    ) -> DriverResult<()> {
        let call = self.handler.service_call(&WriteRequest {
            entity_id: &self.entity_id,
            action,
            value,
            units,
        })?;
        self.api.call_service(&call).await?;
        Ok(())
    }
}

fn unexpected_point(request: &WriteRequest<'_>) -> DriverError {
    DriverError::Unsupported(format!(
        "Unexpected point {} for entity {}",
        request.action, request.entity_id
    ))
}

fn invalid(message: &str) -> DriverError {
    DriverError::Validation(message.to_string())
}

/// 0/1 to turn_off/turn_on.
fn on_off(domain: &str, label: &str, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
    let service = match request.value.as_i64() {
        Some(1) => "turn_on",
        Some(0) => "turn_off",
        _ => return Err(invalid(&format!("{} state must be 0 or 1", label))),
    };
    Ok(HassServiceCall::new(domain, service, request.entity_id))
}

fn string_param<'a>(request: &'a WriteRequest<'_>, message: &str) -> DriverResult<&'a str> {
    request.value.as_str().ok_or_else(|| invalid(message))
}

fn number_in_range(
    request: &WriteRequest<'_>,
    min: f64,
    max: f64,
    message: &str,
) -> DriverResult<f64> {
    match request.value.as_f64() {
        Some(v) if (min..=max).contains(&v) => Ok(v),
        _ => Err(invalid(message)),
    }
}

pub struct LightHandler;

impl DomainHandler for LightHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        match request.action {
            EntityAction::State => on_off("light", "Light", request),
            EntityAction::Brightness => match request.value {
                PointValue::Integer(v) if (0..=255).contains(v) => {
                    Ok(HassServiceCall::new("light", "turn_on", request.entity_id)
                        .with_param("brightness", *v))
                }
                _ => Err(invalid("Brightness must be an int 0..255")),
            },
            _ => Err(unexpected_point(request)),
        }
    }
}

pub struct InputBooleanHandler;

impl DomainHandler for InputBooleanHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        match request.action {
            EntityAction::State => on_off("input_boolean", "Input boolean", request),
            _ => Err(unexpected_point(request)),
        }
    }
}

pub struct SwitchHandler;

impl DomainHandler for SwitchHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        match request.action {
            EntityAction::State => on_off("switch", "Switch", request),
            _ => Err(unexpected_point(request)),
        }
    }
}

/// Sirens take volume, tone and duration as `turn_on` parameters.
pub struct SirenHandler;

impl DomainHandler for SirenHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        let turn_on = || HassServiceCall::new("siren", "turn_on", request.entity_id);
        match request.action {
            EntityAction::State => on_off("siren", "Siren", request),
            EntityAction::VolumeLevel => {
                let level =
                    number_in_range(request, 0.0, 1.0, "Siren volume_level must be 0.0..1.0")?;
                Ok(turn_on().with_param("volume_level", level))
            }
            EntityAction::Tone => {
                let tone = string_param(request, "Siren tone must be a string")?;
                Ok(turn_on().with_param("tone", tone))
            }
            EntityAction::Duration => match request.value.as_f64() {
                Some(secs) if secs.is_finite() && secs > 0.0 => {
                    Ok(turn_on().with_param("duration", secs.trunc() as i64))
                }
                _ => Err(invalid("Siren duration must be a positive number (seconds)")),
            },
            _ => Err(unexpected_point(request)),
        }
    }
}

pub struct HumidifierHandler;

impl DomainHandler for HumidifierHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        match request.action {
            EntityAction::State => on_off("humidifier", "Humidifier", request),
            EntityAction::Humidity => {
                let humidity =
                    number_in_range(request, 0.0, 100.0, "Humidifier humidity must be 0..100")?;
                Ok(
                    HassServiceCall::new("humidifier", "set_humidity", request.entity_id)
                        .with_param("humidity", humidity.trunc() as i64),
                )
            }
            EntityAction::Mode => {
                let mode = string_param(request, "Humidifier mode must be a string")?;
                Ok(HassServiceCall::new("humidifier", "set_mode", request.entity_id)
                    .with_param("mode", mode))
            }
            _ => Err(unexpected_point(request)),
        }
    }
}

pub struct FanHandler;

impl DomainHandler for FanHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        let call = |service: &str| HassServiceCall::new("fan", service, request.entity_id);
        match request.action {
            EntityAction::State => on_off("fan", "Fan", request),
            EntityAction::Percentage => {
                number_in_range(request, 0.0, 100.0, "Fan percentage must be 0..100")?;
                let percentage = request
                    .value
                    .to_json_number()
                    .ok_or_else(|| invalid("Fan percentage must be 0..100"))?;
                Ok(call("set_percentage").with_param("percentage", percentage))
            }
            EntityAction::PresetMode => {
                let mode = string_param(request, "Fan preset_mode must be string")?;
                Ok(call("set_preset_mode").with_param("preset_mode", mode))
            }
            EntityAction::Direction => {
                let direction = request
                    .value
                    .as_str()
                    .map(str::to_lowercase)
                    .filter(|d| d == "forward" || d == "reverse")
                    .ok_or_else(|| invalid("Fan direction must be 'forward' or 'reverse'"))?;
                Ok(call("set_direction").with_param("direction", direction))
            }
            EntityAction::Oscillating => match request.value.as_i64() {
                Some(v @ (0 | 1)) => Ok(call("oscillate").with_param("oscillating", v == 1)),
                _ => Err(invalid("Fan oscillating must be bool or 0/1")),
            },
            _ => Err(unexpected_point(request)),
        }
    }
}

/// Climate HVAC modes by point code.
pub const CLIMATE_MODES: [(i64, &str); 4] = [(0, "off"), (2, "heat"), (3, "cool"), (4, "auto")];

/// Fahrenheit to Celsius, rounded to one decimal.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    ((fahrenheit - 32.0) * 5.0 / 9.0 * 10.0).round() / 10.0
}

pub struct ClimateHandler;

impl DomainHandler for ClimateHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        match request.action {
            EntityAction::State => {
                let mode = request
                    .value
                    .as_i64()
                    .and_then(|code| CLIMATE_MODES.iter().find(|(c, _)| *c == code))
                    .map(|(_, mode)| *mode)
                    .ok_or_else(|| invalid("Climate state must be one of 0, 2, 3, 4"))?;
                Ok(
                    HassServiceCall::new("climate", "set_hvac_mode", request.entity_id)
                        .with_param("hvac_mode", mode),
                )
            }
            EntityAction::Temperature => {
                let temperature = match (request.value.as_f64(), request.units) {
                    (Some(f), Some("C")) => serde_json::Value::from(fahrenheit_to_celsius(f)),
                    (Some(_), _) => request
                        .value
                        .to_json_number()
                        .ok_or_else(|| invalid("Temperature must be numeric"))?,
                    (None, _) => return Err(invalid("Temperature must be numeric")),
                };
                Ok(
                    HassServiceCall::new("climate", "set_temperature", request.entity_id)
                        .with_param("temperature", temperature),
                )
            }
            _ => Err(unexpected_point(request)),
        }
    }
}

pub struct LawnMowerHandler;

impl DomainHandler for LawnMowerHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        match request.action {
            EntityAction::State => {
                let service = match request.value.as_i64() {
                    Some(0) => "dock",
                    Some(1) => "start_mowing",
                    Some(2) => "pause",
                    Some(_) => {
                        return Err(invalid(
                            "Lawn mower state must be 0 (dock), 1 (start_mowing), or 2 (pause)",
                        ))
                    }
                    None => return Err(invalid("Lawn mower state must be an integer")),
                };
                Ok(HassServiceCall::new("lawn_mower", service, request.entity_id))
            }
            _ => Err(unexpected_point(request)),
        }
    }
}

/// Fallback for domains without a registered handler: nothing is writable.
pub struct GenericHandler;

impl DomainHandler for GenericHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        match request.action {
            EntityAction::State => Err(DriverError::Unsupported(format!(
                "State not supported for {}",
                request.entity_id
            ))),
            _ => Err(unexpected_point(request)),
        }
    }
}
