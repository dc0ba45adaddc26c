//! Normalization of Home Assistant entity states into point values.

use crate::entities::{HassDomain, HassEntityState};
use serde_json::Value as JsonValue;

/// Climate HVAC mode to point code.
pub const CLIMATE_STATES: [(&str, i64); 4] = [("off", 0), ("heat", 2), ("cool", 3), ("auto", 4)];

/// Lawn mower activity to point code.
pub const LAWN_MOWER_STATES: [(&str, i64); 5] = [
    ("docked", 0),
    ("mowing", 1),
    ("paused", 2),
    ("returning", 3),
    ("error", 4),
];

/// Result of normalizing one point.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Value(JsonValue),
    /// The entity reported a state with no point code
    Unmapped(String),
}

fn lookup(table: &[(&str, i64)], state: &str) -> Normalized {
    table
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, code)| Normalized::Value(JsonValue::from(*code)))
        .unwrap_or_else(|| Normalized::Unmapped(state.to_string()))
}

/// Convert an entity's reported state into the value of one point.
pub fn normalize(domain: HassDomain, entity_point: &str, entity: &HassEntityState) -> Normalized {
    if entity_point != "state" {
        return Normalized::Value(entity.attribute_or_zero(entity_point));
    }

    match domain {
        HassDomain::Climate => lookup(&CLIMATE_STATES, &entity.state),
        HassDomain::LawnMower => lookup(&LAWN_MOWER_STATES, &entity.state),
        d if d.is_on_off() => Normalized::Value(JsonValue::from(i64::from(entity.state == "on"))),
        _ => Normalized::Value(JsonValue::String(entity.state.clone())),
    }
}
