//! Home Assistant REST API client.

use super::entities::{HassConnectionConfig, HassEntityState, HassServiceCall};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur when interacting with Home Assistant.
#[derive(Debug, Error)]
pub enum HassClientError {
    #[error("{method} {url} error: {source}")]
    Request {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} failed with status {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from Home Assistant: {0}")]
    InvalidResponse(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl HassClientError {
    /// HTTP status of a rejected request, if Home Assistant answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for HASS client operations.
pub type HassResult<T> = Result<T, HassClientError>;

/// The two Home Assistant operations the driver needs.
///
/// [`HassClient`] is the HTTP implementation; tests drive the driver with an
/// in-memory one.
#[async_trait]
pub trait HassApi: Send + Sync {
    /// Fetch the current state and attributes of an entity.
    async fn get_state(&self, entity_id: &str) -> HassResult<HassEntityState>;

    /// Invoke a domain service. Returns the response body, if any.
    async fn call_service(&self, call: &HassServiceCall) -> HassResult<Option<JsonValue>>;
}

/// Home Assistant REST API client.
pub struct HassClient {
    config: HassConnectionConfig,
    http_client: reqwest::Client,
}

impl HassClient {
    /// Create a new Home Assistant client.
    pub fn new(config: HassConnectionConfig) -> HassResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }

        let http_client = builder
            .build()
            .map_err(|e| HassClientError::ConnectionError(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Get the base API URL.
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base(),
            path.trim_start_matches('/')
        )
    }

    /// Add authorization headers to a request.
    fn add_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, self.config.auth_header())
            .header(CONTENT_TYPE, "application/json")
    }

    /// Test the connection to Home Assistant.
    pub async fn check_connection(&self) -> HassResult<bool> {
        let url = self.api_url("/");
        let response = self
            .add_auth(self.http_client.get(&url))
            .send()
            .await
            .map_err(|source| HassClientError::Request {
                method: "GET",
                url,
                source,
            })?;

        Ok(response.status() == reqwest::StatusCode::OK)
    }

    /// Get the connection config.
    pub fn config(&self) -> &HassConnectionConfig {
        &self.config
    }
}

#[async_trait]
impl HassApi for HassClient {
    async fn get_state(&self, entity_id: &str) -> HassResult<HassEntityState> {
        let url = self.api_url(&format!("/states/{}", entity_id));
        debug!(entity_id = %entity_id, "GET {}", url);

        let response = self
            .add_auth(self.http_client.get(&url))
            .send()
            .await
            .map_err(|source| HassClientError::Request {
                method: "GET",
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(HassClientError::Status {
                method: "GET",
                url,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<HassEntityState>()
            .await
            .map_err(|e| HassClientError::InvalidResponse(format!("GET {}: {}", url, e)))
    }

    async fn call_service(&self, call: &HassServiceCall) -> HassResult<Option<JsonValue>> {
        let url = self.api_url(&format!("/services/{}/{}", call.domain, call.service));
        let desc = call.describe();

        let response = match self
            .add_auth(self.http_client.post(&url))
            .json(&call.service_data)
            .send()
            .await
        {
            Ok(response) => response,
            Err(source) => {
                error!(service = %desc, "Error when attempting {}: {}", desc, source);
                return Err(HassClientError::Request {
                    method: "POST",
                    url,
                    source,
                });
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != reqwest::StatusCode::OK {
            error!(
                service = %desc,
                status = status.as_u16(),
                "Failed to {}. Response {}", desc, body
            );
            return Err(HassClientError::Status {
                method: "POST",
                url,
                status: status.as_u16(),
                body,
            });
        }

        info!(service = %desc, "Success: {}", desc);

        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| HassClientError::InvalidResponse(format!("POST {}: {}", url, e)))
    }
}
