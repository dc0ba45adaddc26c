//! Entity factory: picks the domain handler for an entity ID.

use crate::client::HassApi;
use crate::entities::HassDomain;
use crate::error::{DriverError, DriverResult};
use crate::handlers::{
    ClimateHandler, DomainHandler, Entity, FanHandler, GenericHandler, HumidifierHandler,
    InputBooleanHandler, LawnMowerHandler, LightHandler, SirenHandler, SwitchHandler,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Creates [`Entity`] handlers based on the Home Assistant domain.
pub struct EntityFactory {
    api: Option<Arc<dyn HassApi>>,
    registry: HashMap<String, Arc<dyn DomainHandler>>,
    fallback: Arc<dyn DomainHandler>,
}

impl EntityFactory {
    /// Factory with the built-in domain handlers and no API attached.
    pub fn new() -> Self {
        let mut factory = Self {
            api: None,
            registry: HashMap::new(),
            fallback: Arc::new(GenericHandler),
        };
        factory.register("light", LightHandler);
        factory.register("fan", FanHandler);
        factory.register("climate", ClimateHandler);
        factory.register("input_boolean", InputBooleanHandler);
        factory.register("switch", SwitchHandler);
        factory.register("siren", SirenHandler);
        factory.register("humidifier", HumidifierHandler);
        factory.register("lawn_mower", LawnMowerHandler);
        factory
    }

    pub fn with_api(api: Arc<dyn HassApi>) -> Self {
        let mut factory = Self::new();
        factory.attach(api);
        factory
    }

    /// Attach (or replace) the API handle used by created entities.
    pub fn attach(&mut self, api: Arc<dyn HassApi>) {
        self.api = Some(api);
    }

    pub fn is_attached(&self) -> bool {
        self.api.is_some()
    }

    /// Add or override the handler for a domain.
    pub fn register(&mut self, domain: impl Into<String>, handler: impl DomainHandler + 'static) {
        let domain = domain.into();
        debug!(domain = %domain, "Registering domain handler");
        self.registry.insert(domain, Arc::new(handler));
    }

    pub fn has_handler(&self, domain: &str) -> bool {
        self.registry.contains_key(domain)
    }

    /// Handler for an entity, bound to the attached API.
    pub fn create(&self, entity_id: &str) -> DriverResult<Entity> {
        let api = self.api.clone().ok_or(DriverError::NotConfigured)?;
        let domain = HassDomain::prefix(entity_id);
        let handler = self
            .registry
            .get(domain)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(Entity::new(api, entity_id, handler))
    }
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::new()
    }
}
