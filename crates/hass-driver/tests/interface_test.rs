//! HassInterface tests against an in-memory Home Assistant.

use async_trait::async_trait;
use hass_driver::{
    DomainHandler, DriverError, DriverResult, HassApi, HassClientError, HassEntityState,
    HassInterface, HassResult, HassServiceCall, PointDefinition, PointValue, WriteRequest,
};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Records service calls and serves entity states from a map.
#[derive(Default)]
struct FakeHass {
    states: Mutex<HashMap<String, HassEntityState>>,
    calls: Mutex<Vec<HassServiceCall>>,
    fetches: Mutex<Vec<String>>,
}

impl FakeHass {
    fn with_state(self, state: HassEntityState) -> Self {
        self.states
            .lock()
            .unwrap()
            .insert(state.entity_id.clone(), state);
        self
    }

    fn set_state(&self, state: HassEntityState) {
        self.states
            .lock()
            .unwrap()
            .insert(state.entity_id.clone(), state);
    }

    fn calls(&self) -> Vec<HassServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn fetch_count(&self, entity_id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.as_str() == entity_id)
            .count()
    }
}

#[async_trait]
impl HassApi for FakeHass {
    async fn get_state(&self, entity_id: &str) -> HassResult<HassEntityState> {
        self.fetches.lock().unwrap().push(entity_id.to_string());
        self.states
            .lock()
            .unwrap()
            .get(entity_id)
            .cloned()
            .ok_or_else(|| HassClientError::Status {
                method: "GET",
                url: format!("http://fake/api/states/{}", entity_id),
                status: 404,
                body: "Entity not found.".to_string(),
            })
    }

    async fn call_service(&self, call: &HassServiceCall) -> HassResult<Option<JsonValue>> {
        self.calls.lock().unwrap().push(call.clone());
        Ok(Some(json!([])))
    }
}

fn points() -> Vec<PointDefinition> {
    vec![
        PointDefinition::new("input_boolean.test", "state", "bool_state")
            .writable()
            .with_type("int")
            .with_starting_value(json!(0)),
        PointDefinition::new("fan.office", "state", "fan_state")
            .writable()
            .with_type("int"),
        PointDefinition::new("fan.office", "percentage", "fan_percentage")
            .writable()
            .with_type("int")
            .with_starting_value(json!(25)),
        PointDefinition::new("fan.office", "oscillating", "fan_oscillating")
            .writable()
            .with_type("int"),
        PointDefinition::new("fan.office", "direction", "fan_direction").writable(),
        PointDefinition::new("climate.hall", "state", "hvac_mode")
            .writable()
            .with_type("int"),
        PointDefinition::new("climate.hall", "temperature", "hall_setpoint")
            .writable()
            .with_type("float")
            .with_units("C"),
        PointDefinition::new("climate.office", "temperature", "office_setpoint")
            .writable()
            .with_type("float")
            .with_units("F"),
        PointDefinition::new("lawn_mower.yard", "state", "mower_state")
            .writable()
            .with_type("int"),
        PointDefinition::new("sensor.outdoor", "state", "outdoor_temp"),
        PointDefinition::new("vacuum.x", "state", "vacuum_state").writable(),
    ]
}

fn fake() -> FakeHass {
    FakeHass::default()
        .with_state(HassEntityState::new("input_boolean.test", "off"))
        .with_state(
            HassEntityState::new("fan.office", "on")
                .with_attribute("percentage", json!(50))
                .with_attribute("oscillating", json!(true))
                .with_attribute("direction", json!("forward")),
        )
        .with_state(
            HassEntityState::new("climate.hall", "heat").with_attribute("temperature", json!(21.5)),
        )
        .with_state(HassEntityState::new("climate.office", "cool"))
        .with_state(HassEntityState::new("lawn_mower.yard", "mowing"))
        .with_state(HassEntityState::new("sensor.outdoor", "12.5"))
        .with_state(HassEntityState::new("vacuum.x", "cleaning"))
}

fn driver(api: Arc<FakeHass>) -> HassInterface {
    let mut driver = HassInterface::new();
    driver.configure_with_api(api, &points()).unwrap();
    driver
}

#[tokio::test]
async fn test_get_point_reads_live_state() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    assert_eq!(driver.get_point("bool_state").await.unwrap(), json!("off"));
    assert_eq!(driver.get_point("fan_percentage").await.unwrap(), json!(50));
    assert_eq!(driver.get_point("hvac_mode").await.unwrap(), json!("heat"));
    assert_eq!(driver.get_point("office_setpoint").await.unwrap(), json!(0));
    assert_eq!(
        driver.register("fan_percentage").unwrap().value,
        Some(json!(50))
    );
}

#[tokio::test]
async fn test_get_point_errors() {
    let api = Arc::new(FakeHass::default());
    let mut driver = driver(api);

    let err = driver.get_point("bool_state").await.unwrap_err();
    assert!(matches!(err, DriverError::Transport(_)));
    assert!(err.to_string().contains("404"));

    assert!(matches!(
        driver.get_point("no_such_point").await,
        Err(DriverError::PointNotFound(_))
    ));
}

#[tokio::test]
async fn test_set_point_state() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    assert_eq!(
        driver.set_point("bool_state", PointValue::Integer(1)).await.unwrap(),
        PointValue::Integer(1)
    );
    assert_eq!(driver.register("bool_state").unwrap().value, Some(json!(1)));

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].describe(), "input_boolean/turn_on input_boolean.test");
}

#[tokio::test]
async fn test_set_point_casts_to_register_type() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    let value = driver
        .set_point("fan_percentage", PointValue::from("75"))
        .await
        .unwrap();
    assert_eq!(value, PointValue::Integer(75));
    assert_eq!(api.calls()[0].param("percentage"), Some(&json!(75)));

    let err = driver
        .set_point("fan_percentage", PointValue::from("fast"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Cast { .. }));
    assert_eq!(api.calls().len(), 1);
}

#[tokio::test]
async fn test_validation_happens_before_network() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    assert!(matches!(
        driver.set_point("fan_percentage", PointValue::Integer(150)).await,
        Err(DriverError::Validation(_))
    ));
    assert!(matches!(
        driver.set_point("mower_state", PointValue::Integer(3)).await,
        Err(DriverError::Validation(_))
    ));
    assert!(matches!(
        driver.set_point("hvac_mode", PointValue::Integer(1)).await,
        Err(DriverError::Validation(_))
    ));
    assert!(api.calls().is_empty());
    assert_eq!(driver.register("fan_percentage").unwrap().value, Some(json!(25)));
}

#[tokio::test]
async fn test_read_only_point_rejected() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    let err = driver
        .set_point("outdoor_temp", PointValue::from("1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::ReadOnly(_)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_temperature_uses_register_units() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    driver
        .set_point("hall_setpoint", PointValue::Float(98.6))
        .await
        .unwrap();
    driver
        .set_point("office_setpoint", PointValue::Float(72.0))
        .await
        .unwrap();

    let calls = api.calls();
    assert_eq!(calls[0].describe(), "climate/set_temperature climate.hall");
    assert_eq!(calls[0].param("temperature"), Some(&json!(37.0)));
    assert_eq!(calls[1].param("temperature"), Some(&json!(72.0)));
}

#[tokio::test]
async fn test_unknown_domain_and_attribute() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    let err = driver
        .set_point("vacuum_state", PointValue::from("1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Unsupported(_)));
    assert!(err.to_string().contains("State not supported"));

    let mut other = HassInterface::new();
    other
        .configure_with_api(
            api.clone(),
            &[PointDefinition::new("switch.plug", "power", "plug_power").writable()],
        )
        .unwrap();
    let err = other
        .set_point("plug_power", PointValue::from("5"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Unsupported(_)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_scrape_all_normalizes_states() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    let result = driver.scrape_all().await;

    assert_eq!(result["bool_state"], json!(0));
    assert_eq!(result["fan_state"], json!(1));
    assert_eq!(result["fan_percentage"], json!(50));
    assert_eq!(result["fan_oscillating"], json!(true));
    assert_eq!(result["fan_direction"], json!("forward"));
    assert_eq!(result["hvac_mode"], json!(2));
    assert_eq!(result["hall_setpoint"], json!(21.5));
    assert_eq!(result["office_setpoint"], json!(0));
    assert_eq!(result["mower_state"], json!(1));
    assert_eq!(result["outdoor_temp"], json!("12.5"));
    assert_eq!(result["vacuum_state"], json!("cleaning"));
    assert_eq!(result.len(), 11);

    // One fetch per entity, however many points it backs.
    assert_eq!(api.fetch_count("fan.office"), 1);
    assert_eq!(driver.register("hvac_mode").unwrap().value, Some(json!(2)));
}

#[tokio::test]
async fn test_scrape_skips_unmapped_state() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());
    api.set_state(HassEntityState::new("climate.hall", "dry"));

    let result = driver.scrape_all().await;
    assert!(!result.contains_key("hvac_mode"));
    assert_eq!(result["hall_setpoint"], json!(0));
    assert_eq!(result["bool_state"], json!(0));
}

#[tokio::test]
async fn test_scrape_continues_past_failed_entity() {
    let api = Arc::new(
        FakeHass::default().with_state(HassEntityState::new("fan.office", "off")),
    );
    let mut driver = HassInterface::new();
    driver
        .configure_with_api(
            api,
            &[
                PointDefinition::new("light.missing", "state", "a_state"),
                PointDefinition::new("fan.office", "state", "b_state"),
            ],
        )
        .unwrap();

    let result = driver.scrape_all().await;
    assert_eq!(result.len(), 1);
    assert_eq!(result["b_state"], json!(0));
}

#[tokio::test]
async fn test_reads_requery_device() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    driver
        .set_point("fan_oscillating", PointValue::Integer(0))
        .await
        .unwrap();
    // The device has not applied the change yet; the read reflects the device.
    assert_eq!(driver.get_point("fan_oscillating").await.unwrap(), json!(true));

    api.set_state(
        HassEntityState::new("fan.office", "on").with_attribute("oscillating", json!(false)),
    );
    assert_eq!(driver.get_point("fan_oscillating").await.unwrap(), json!(false));
}

#[tokio::test]
async fn test_revert() {
    let api = Arc::new(fake());
    let mut driver = driver(api.clone());

    let defaults = driver.default_values();
    assert_eq!(defaults.len(), 2);
    assert_eq!(defaults["bool_state"], PointValue::Integer(0));
    assert_eq!(defaults["fan_percentage"], PointValue::Integer(25));

    assert_eq!(
        driver.revert_point("fan_percentage").await.unwrap(),
        PointValue::Integer(25)
    );
    assert!(matches!(
        driver.revert_point("fan_state").await,
        Err(DriverError::NoStartingValue(_))
    ));

    let reverted = driver.revert_all().await;
    assert_eq!(reverted, vec!["bool_state".to_string(), "fan_percentage".to_string()]);

    let services: Vec<String> = api.calls().iter().map(|c| c.describe()).collect();
    assert_eq!(
        services,
        vec![
            "fan/set_percentage fan.office",
            "input_boolean/turn_off input_boolean.test",
            "fan/set_percentage fan.office",
        ]
    );
}

struct VacuumHandler;

impl DomainHandler for VacuumHandler {
    fn service_call(&self, request: &WriteRequest<'_>) -> DriverResult<HassServiceCall> {
        let service = match request.value.as_str() {
            Some("1") => "start",
            _ => "return_to_base",
        };
        Ok(HassServiceCall::new("vacuum", service, request.entity_id))
    }
}

#[tokio::test]
async fn test_registered_domain_survives_reconfigure() {
    let api = Arc::new(fake());
    let mut driver = HassInterface::new();
    driver.register_domain("vacuum", VacuumHandler);
    driver.configure_with_api(api.clone(), &points()).unwrap();

    driver
        .set_point("vacuum_state", PointValue::from("1"))
        .await
        .unwrap();
    assert_eq!(api.calls()[0].describe(), "vacuum/start vacuum.x");
}

#[tokio::test]
async fn test_unconfigured_driver() {
    let mut driver = HassInterface::new();
    assert!(!driver.is_configured());
    assert!(driver.scrape_all().await.is_empty());
    assert!(matches!(
        driver.get_point("anything").await,
        Err(DriverError::PointNotFound(_))
    ));
}

#[test]
fn test_configure_validates_connection() {
    let mut driver = HassInterface::new();
    let err = driver
        .configure(&hass_driver::ConnectionParams::default(), &points())
        .unwrap_err();
    assert!(matches!(err, DriverError::Configuration(_)));
    assert!(!driver.is_configured());
}
