//! Home Assistant point driver.
//!
//! Maps typed, named points of a building-automation host onto Home Assistant
//! REST calls, and normalizes polled entity states back into point values.
//!
//! ## Architecture
//!
//! - **HassClient**: authenticated `GET /api/states` and `POST /api/services`
//! - **DomainHandler**: per-domain validation of writes into service calls
//! - **EntityFactory**: domain → handler table with a fallback and runtime registration
//! - **PointRegistry**: registers parsed from the host's point definitions
//! - **scrape**: fixed lookup tables turning entity states into point values
//! - **HassInterface**: `configure` / `get_point` / `set_point` / `scrape_all`
//!
//! ## Example
//!
//! ```rust,no_run
//! use hass_driver::{ConnectionParams, HassInterface, PointDefinition, PointValue};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut driver = HassInterface::new();
//!     driver.configure(
//!         &ConnectionParams::new("192.168.1.100", "your_token_here", 8123),
//!         &[PointDefinition::new("light.kitchen", "state", "kitchen_light")
//!             .writable()
//!             .with_type("int")],
//!     )?;
//!
//!     driver.set_point("kitchen_light", PointValue::Integer(1)).await?;
//!     println!("{:?}", driver.scrape_all().await);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod entities;
pub mod error;
pub mod factory;
pub mod handlers;
pub mod interface;
pub mod register;
pub mod scrape;
pub mod value;

// Re-exports for convenience
pub use client::{HassApi, HassClient, HassClientError, HassResult};
pub use config::{ConnectionParams, DriverConfig, PortSetting};
pub use entities::{HassConnectionConfig, HassDomain, HassEntityState, HassServiceCall};
pub use error::{DriverError, DriverResult};
pub use factory::EntityFactory;
pub use handlers::{DomainHandler, Entity, EntityAction, WriteRequest};
pub use interface::{HassInterface, ScrapeOutcome};
pub use register::{PointDefinition, PointRegistry, Register};
pub use value::{PointType, PointValue};
