//! Driver error types.

use crate::client::HassClientError;
use crate::value::PointType;
use thiserror::Error;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Error type for point driver operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Missing or invalid connection parameters or point definitions
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation needed the HTTP client before `configure` ran
    #[error("Driver is not configured")]
    NotConfigured,

    /// Home Assistant rejected the request or could not be reached
    #[error(transparent)]
    Transport(#[from] HassClientError),

    /// Value outside the range, type or set a domain accepts
    #[error("Invalid value: {0}")]
    Validation(String),

    /// Value could not be converted to the register's declared type
    #[error("Cannot cast {value} to {target}")]
    Cast { value: String, target: PointType },

    /// Setter the entity's domain does not provide
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Point not found: {0}")]
    PointNotFound(String),

    #[error("Trying to write to a point configured read only: {0}")]
    ReadOnly(String),

    #[error("Point {0} has no starting value to revert to")]
    NoStartingValue(String),
}
