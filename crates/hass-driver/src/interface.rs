//! Interface facade consumed by the host driver framework.
//!
//! The host calls [`HassInterface::configure`] once per device configuration,
//! then [`get_point`](HassInterface::get_point),
//! [`set_point`](HassInterface::set_point) and
//! [`scrape_all`](HassInterface::scrape_all) as it schedules them. Every read
//! re-queries Home Assistant; the register cache only feeds reverts and
//! diagnostics.

use crate::client::{HassApi, HassClient};
use crate::config::ConnectionParams;
use crate::entities::{HassDomain, HassEntityState};
use crate::error::{DriverError, DriverResult};
use crate::factory::EntityFactory;
use crate::handlers::DomainHandler;
use crate::register::{PointDefinition, PointRegistry, Register};
use crate::scrape::{normalize, Normalized};
use crate::value::PointValue;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Outcome of scraping a single point.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Value(JsonValue),
    /// Logged and left out of the scrape result
    Skipped(String),
}

/// Home Assistant point driver for one device configuration.
pub struct HassInterface {
    api: Option<Arc<dyn HassApi>>,
    factory: EntityFactory,
    registry: PointRegistry,
}

impl HassInterface {
    pub fn new() -> Self {
        Self {
            api: None,
            factory: EntityFactory::new(),
            registry: PointRegistry::new(),
        }
    }

    /// Validate connection parameters, build the HTTP client and parse points.
    pub fn configure(
        &mut self,
        connection: &ConnectionParams,
        points: &[PointDefinition],
    ) -> DriverResult<()> {
        let config = connection.connection_config()?;
        info!(url = %config.url, "Configuring Home Assistant driver");
        let client = HassClient::new(config)?;
        self.configure_with_api(Arc::new(client), points)
    }

    /// Configure against an already constructed API handle.
    pub fn configure_with_api(
        &mut self,
        api: Arc<dyn HassApi>,
        points: &[PointDefinition],
    ) -> DriverResult<()> {
        let registry = PointRegistry::parse(points)?;
        self.factory.attach(api.clone());
        self.api = Some(api);
        self.registry = registry;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.api.is_some()
    }

    /// Add or override a domain handler. Survives reconfiguration.
    pub fn register_domain(
        &mut self,
        domain: impl Into<String>,
        handler: impl DomainHandler + 'static,
    ) {
        self.factory.register(domain, handler);
    }

    pub fn register(&self, point_name: &str) -> DriverResult<&Register> {
        self.registry.get(point_name)
    }

    pub fn registers(&self) -> impl Iterator<Item = &Register> {
        self.registry.iter()
    }

    /// Starting values keyed by point name, for the host's revert bookkeeping.
    pub fn default_values(&self) -> HashMap<String, PointValue> {
        self.registry.defaults()
    }

    async fn entity_data(&self, entity_id: &str) -> DriverResult<HassEntityState> {
        let api = self.api.as_ref().ok_or(DriverError::NotConfigured)?;
        Ok(api.get_state(entity_id).await?)
    }

    /// Read one point from the live device.
    ///
    /// Returns the raw state string for `state` points, otherwise the named
    /// attribute (0 when the entity does not report it).
    pub async fn get_point(&mut self, point_name: &str) -> DriverResult<JsonValue> {
        let register = self.registry.get(point_name)?;
        let entity = match self.entity_data(&register.entity_id).await {
            Ok(entity) => entity,
            Err(e) => {
                error!(
                    point = %point_name,
                    entity_id = %register.entity_id,
                    "Failed to read point: {}", e
                );
                return Err(e);
            }
        };

        let value = if register.is_state() {
            JsonValue::String(entity.state)
        } else {
            entity.attribute_or_zero(&register.entity_point)
        };

        self.registry.get_mut(point_name)?.value = Some(value.clone());
        Ok(value)
    }

    /// Write one point and return the value now cached for it.
    pub async fn set_point(
        &mut self,
        point_name: &str,
        value: PointValue,
    ) -> DriverResult<PointValue> {
        let register = self.registry.get(point_name)?;
        if register.read_only {
            return Err(DriverError::ReadOnly(point_name.to_string()));
        }

        let cast = register.point_type.cast(&value)?;
        let entity = self.factory.create(&register.entity_id)?;
        debug!(
            point = %point_name,
            entity_id = %register.entity_id,
            action = %register.action(),
            "Writing {}",
            cast
        );
        entity
            .apply(&register.action(), &cast, register.units.as_deref())
            .await?;

        self.registry.get_mut(point_name)?.value = Some(JsonValue::from(cast.clone()));
        Ok(cast)
    }

    /// Write a point's starting value back to the device.
    pub async fn revert_point(&mut self, point_name: &str) -> DriverResult<PointValue> {
        let default = self
            .registry
            .get(point_name)?
            .starting_value
            .clone()
            .ok_or_else(|| DriverError::NoStartingValue(point_name.to_string()))?;
        self.set_point(point_name, default).await
    }

    /// Revert every writable point that has a starting value.
    ///
    /// Failures are logged and skipped; returns the names of reverted points.
    pub async fn revert_all(&mut self) -> Vec<String> {
        let targets: Vec<(String, PointValue)> = self
            .registry
            .by_access(false)
            .filter_map(|r| r.starting_value.clone().map(|v| (r.point_name.clone(), v)))
            .collect();

        let mut reverted = Vec::with_capacity(targets.len());
        for (point_name, value) in targets {
            match self.set_point(&point_name, value).await {
                Ok(_) => reverted.push(point_name),
                Err(e) => error!(point = %point_name, "Failed to revert point: {}", e),
            }
        }
        reverted
    }

    /// Poll every point, one outcome per register.
    ///
    /// Each distinct entity is fetched once. A failed fetch or an unmapped
    /// state skips the affected points without failing the others.
    pub async fn scrape_outcomes(&mut self) -> Vec<(String, ScrapeOutcome)> {
        let api = match &self.api {
            Some(api) => api.clone(),
            None => {
                error!("Scrape requested before the driver was configured");
                return Vec::new();
            }
        };

        let order: Vec<(String, String, String)> = self
            .registry
            .by_access(true)
            .chain(self.registry.by_access(false))
            .map(|r| {
                (
                    r.point_name.clone(),
                    r.entity_id.clone(),
                    r.entity_point.clone(),
                )
            })
            .collect();

        let mut fetched: HashMap<String, Result<HassEntityState, String>> = HashMap::new();
        let mut outcomes = Vec::with_capacity(order.len());

        for (point_name, entity_id, entity_point) in order {
            if !fetched.contains_key(&entity_id) {
                let result = api.get_state(&entity_id).await.map_err(|e| {
                    error!(
                        entity_id = %entity_id,
                        "Unexpected error for entity_id {}: {}", entity_id, e
                    );
                    e.to_string()
                });
                fetched.insert(entity_id.clone(), result);
            }

            let outcome = match &fetched[&entity_id] {
                Err(e) => ScrapeOutcome::Skipped(e.clone()),
                Ok(entity) => {
                    let domain = HassDomain::from_entity_id(&entity_id);
                    match normalize(domain, &entity_point, entity) {
                        Normalized::Value(value) => ScrapeOutcome::Value(value),
                        Normalized::Unmapped(state) => {
                            error!(
                                entity_id = %entity_id,
                                "State {} from {} is not yet supported", state, entity_id
                            );
                            ScrapeOutcome::Skipped(format!("unsupported state {}", state))
                        }
                    }
                }
            };

            if let ScrapeOutcome::Value(value) = &outcome {
                if let Ok(register) = self.registry.get_mut(&point_name) {
                    register.value = Some(value.clone());
                }
            }
            outcomes.push((point_name, outcome));
        }

        outcomes
    }

    /// Poll every point; points that could not be read are left out.
    pub async fn scrape_all(&mut self) -> BTreeMap<String, JsonValue> {
        self.scrape_outcomes()
            .await
            .into_iter()
            .filter_map(|(name, outcome)| match outcome {
                ScrapeOutcome::Value(value) => Some((name, value)),
                ScrapeOutcome::Skipped(_) => None,
            })
            .collect()
    }
}

impl Default for HassInterface {
    fn default() -> Self {
        Self::new()
    }
}
