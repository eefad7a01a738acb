//! BambooHR application status transitions.

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::{BambooHrSettings, ConfigError};
use crate::connectors::{endpoint_with_segments, BambooHrConnector};

#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Applied {
        response: Value,
    },
    Failed {
        /// `None` when no response was received.
        status: Option<u16>,
        error: String,
    },
}

impl StatusUpdate {
    pub fn is_applied(&self) -> bool {
        matches!(self, StatusUpdate::Applied { .. })
    }
}

impl Serialize for StatusUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatusUpdate::Applied { response } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("response", response)?;
                map.end()
            }
            StatusUpdate::Failed { status, error } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("status", status)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusUpdater {
    client: Client,
    base_url: String,
    token: String,
}

impl StatusUpdater {
    /// `base_url` is the BambooHR API root, e.g. `https://acme.bamboohr.com/api/v1`.
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Uses `BAMBOOHR_BASE_URL` when set, otherwise the tenant's API root.
    pub fn from_settings(client: Client, settings: &BambooHrSettings) -> Result<Self, ConfigError> {
        let token = settings
            .access_token
            .clone()
            .ok_or(ConfigError::MissingCredential {
                key: "ACCESS_TOKEN",
            })?;
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| BambooHrConnector::default_base_url(&settings.subdomain));
        Ok(Self::new(client, base_url, token))
    }

    pub async fn update(&self, application_id: &str, status_id: u32) -> StatusUpdate {
        let url = match self.status_url(application_id) {
            Ok(url) => url,
            Err(error) => {
                warn!(%application_id, %error, "status update refused");
                return StatusUpdate::Failed {
                    status: None,
                    error: error.to_string(),
                };
            }
        };
        info!(%application_id, status_id, %url, "updating application status");

        let response = match self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token)
            .json(&json!({ "status": { "id": status_id } }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(%application_id, error = %err, "status update request failed");
                return StatusUpdate::Failed {
                    status: None,
                    error: err.to_string(),
                };
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != StatusCode::OK && status != StatusCode::CREATED {
            warn!(%application_id, %status, %body, "status update rejected");
            return StatusUpdate::Failed {
                status: Some(status.as_u16()),
                error: body,
            };
        }

        let response = if body.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };
        info!(%application_id, status_id, "application status updated");
        StatusUpdate::Applied { response }
    }

    fn status_url(&self, application_id: &str) -> Result<String, &'static str> {
        if !is_application_id(application_id) {
            return Err("application id must be numeric");
        }
        endpoint_with_segments(
            &self.base_url,
            &["applicant_tracking", "applications", application_id, "status"],
        )
        .ok_or("BambooHR base URL cannot carry a path")
    }
}

/// BambooHR application ids are plain decimal numbers.
pub fn is_application_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_access_token() {
        let settings = BambooHrSettings {
            subdomain: "acme".to_string(),
            access_token: None,
            base_url: None,
        };
        assert!(matches!(
            StatusUpdater::from_settings(Client::new(), &settings),
            Err(ConfigError::MissingCredential { key: "ACCESS_TOKEN" })
        ));

        let settings = BambooHrSettings {
            access_token: Some("t".to_string()),
            ..settings
        };
        let updater = StatusUpdater::from_settings(Client::new(), &settings).expect("builds");
        assert_eq!(updater.base_url, "https://acme.bamboohr.com/api/v1");
    }

    #[test]
    fn only_numeric_application_ids_are_accepted() {
        assert!(is_application_id("901"));
        assert!(!is_application_id(""));
        assert!(!is_application_id("-1"));
        assert!(!is_application_id("../../employees/5/files?x="));

        let updater = StatusUpdater::new(Client::new(), "https://acme.bamboohr.com/api/v1", "t");
        assert_eq!(
            updater.status_url("901").as_deref(),
            Ok("https://acme.bamboohr.com/api/v1/applicant_tracking/applications/901/status")
        );
        assert!(updater.status_url("901/../../employees").is_err());
    }

    #[test]
    fn serializes_with_success_flag() {
        let applied = serde_json::to_value(StatusUpdate::Applied {
            response: json!({ "id": 3 }),
        })
        .expect("serializes");
        assert_eq!(applied, json!({ "success": true, "response": { "id": 3 } }));

        let failed = serde_json::to_value(StatusUpdate::Failed {
            status: Some(403),
            error: "forbidden".to_string(),
        })
        .expect("serializes");
        assert_eq!(
            failed,
            json!({ "success": false, "status": 403, "error": "forbidden" })
        );
    }
}
