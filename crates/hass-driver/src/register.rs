//! Point definitions and the register table built from them.

use crate::entities::HassDomain;
use crate::error::{DriverError, DriverResult};
use crate::handlers::EntityAction;
use crate::value::{PointType, PointValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// One row of the point registry, as supplied by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointDefinition {
    #[serde(rename = "Entity ID", alias = "entity_id", default)]
    pub entity_id: Option<String>,

    /// `state` or the name of an entity attribute
    #[serde(rename = "Entity Point", alias = "entity_point", default)]
    pub entity_point: Option<String>,

    #[serde(
        rename = "Point Name",
        alias = "Volttron Point Name",
        alias = "point_name",
        default
    )]
    pub point_name: Option<String>,

    /// `"true"` (any case) makes the point writable
    #[serde(rename = "Writable", alias = "writable", default)]
    pub writable: Option<JsonValue>,

    #[serde(rename = "Units", alias = "units", default)]
    pub units: Option<String>,

    #[serde(rename = "Type", alias = "type", default)]
    pub type_name: Option<String>,

    #[serde(rename = "Attributes", alias = "attributes", default)]
    pub attributes: Option<Map<String, JsonValue>>,

    #[serde(rename = "Starting Value", alias = "starting_value", default)]
    pub starting_value: Option<JsonValue>,

    #[serde(rename = "Notes", alias = "notes", default)]
    pub notes: Option<String>,
}

impl PointDefinition {
    pub fn new(entity_id: &str, entity_point: &str, point_name: &str) -> Self {
        Self {
            entity_id: Some(entity_id.to_string()),
            entity_point: Some(entity_point.to_string()),
            point_name: Some(point_name.to_string()),
            ..Default::default()
        }
    }

    pub fn writable(mut self) -> Self {
        self.writable = Some(JsonValue::from("TRUE"));
        self
    }

    pub fn with_type(mut self, type_name: &str) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    pub fn with_starting_value(mut self, value: JsonValue) -> Self {
        self.starting_value = Some(value);
        self
    }

    fn is_writable(&self) -> bool {
        match &self.writable {
            Some(JsonValue::String(s)) => s.eq_ignore_ascii_case("true"),
            Some(JsonValue::Bool(b)) => *b,
            _ => false,
        }
    }
}

/// In-memory state of one configured point.
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    pub point_name: String,
    pub read_only: bool,
    pub units: Option<String>,
    pub point_type: PointType,
    pub attributes: Map<String, JsonValue>,
    pub entity_id: String,
    /// `state` or the name of an entity attribute
    pub entity_point: String,
    /// Last value read from or written to the device
    pub value: Option<JsonValue>,
    /// Value restored by a revert
    pub starting_value: Option<PointValue>,
    pub description: String,
}

impl Register {
    pub fn domain(&self) -> HassDomain {
        HassDomain::from_entity_id(&self.entity_id)
    }

    pub fn action(&self) -> EntityAction {
        EntityAction::from_point(&self.entity_point)
    }

    pub fn is_state(&self) -> bool {
        self.entity_point == "state"
    }

    fn from_definition(def: &PointDefinition, entity_id: &str) -> DriverResult<Self> {
        let entity_point = required(&def.entity_point, "Entity Point", entity_id)?;
        let point_name = required(&def.point_name, "Point Name", entity_id)?;
        let point_type = def
            .type_name
            .as_deref()
            .map(PointType::from_name)
            .unwrap_or_default();

        let starting_value = def
            .starting_value
            .as_ref()
            .and_then(|raw| match PointValue::from_json(raw) {
                Some(v) => match point_type.cast(&v) {
                    Ok(cast) => Some(cast),
                    Err(e) => {
                        warn!(point = %point_name, "Ignoring starting value: {}", e);
                        None
                    }
                },
                None => {
                    if !raw.is_null() {
                        warn!(point = %point_name, "Ignoring non-scalar starting value {}", raw);
                    }
                    None
                }
            });

        Ok(Self {
            point_name,
            read_only: !def.is_writable(),
            units: def.units.clone().filter(|u| !u.is_empty()),
            point_type,
            attributes: def.attributes.clone().unwrap_or_default(),
            entity_id: entity_id.to_string(),
            entity_point,
            value: starting_value.clone().map(JsonValue::from),
            starting_value,
            description: def.notes.clone().unwrap_or_default(),
        })
    }
}

fn required(field: &Option<String>, name: &str, entity_id: &str) -> DriverResult<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            DriverError::Configuration(format!("{} is required for entity {}", name, entity_id))
        })
}

/// Registers of one device, in definition order.
#[derive(Debug, Clone, Default)]
pub struct PointRegistry {
    registers: Vec<Register>,
    index: HashMap<String, usize>,
}

impl PointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build registers from point definitions.
    ///
    /// Definitions without an entity ID are skipped; duplicate point names
    /// are rejected.
    pub fn parse(definitions: &[PointDefinition]) -> DriverResult<Self> {
        let mut registry = Self::new();

        for def in definitions {
            let entity_id = match def.entity_id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => id,
                _ => {
                    debug!("Skipping point definition without an entity ID");
                    continue;
                }
            };
            registry.insert(Register::from_definition(def, entity_id)?)?;
        }

        info!(points = registry.len(), "Parsed point registry");
        Ok(registry)
    }

    pub fn insert(&mut self, register: Register) -> DriverResult<()> {
        if self.index.contains_key(&register.point_name) {
            return Err(DriverError::Configuration(format!(
                "Duplicate point name: {}",
                register.point_name
            )));
        }
        self.index
            .insert(register.point_name.clone(), self.registers.len());
        self.registers.push(register);
        Ok(())
    }

    pub fn get(&self, point_name: &str) -> DriverResult<&Register> {
        self.index
            .get(point_name)
            .map(|&i| &self.registers[i])
            .ok_or_else(|| DriverError::PointNotFound(point_name.to_string()))
    }

    pub fn get_mut(&mut self, point_name: &str) -> DriverResult<&mut Register> {
        match self.index.get(point_name) {
            Some(&i) => Ok(&mut self.registers[i]),
            None => Err(DriverError::PointNotFound(point_name.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.registers.iter()
    }

    /// Registers filtered by access: read-only first, then writable, like
    /// the host polls them.
    pub fn by_access(&self, read_only: bool) -> impl Iterator<Item = &Register> {
        self.registers.iter().filter(move |r| r.read_only == read_only)
    }

    /// Starting values keyed by point name.
    pub fn defaults(&self) -> HashMap<String, PointValue> {
        self.registers
            .iter()
            .filter_map(|r| {
                r.starting_value
                    .clone()
                    .map(|v| (r.point_name.clone(), v))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}
