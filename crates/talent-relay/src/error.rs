use crate::config::ConfigError;
use crate::connectors::ConnectorError;
use crate::domain::UnknownSource;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Connector(ConnectorError),
    UnknownSource(UnknownSource),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Connector(err) => write!(f, "connector error: {}", err),
            AppError::UnknownSource(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Connector(err) => Some(err),
            AppError::UnknownSource(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::UnknownSource(_) => StatusCode::BAD_REQUEST,
            AppError::Config(ConfigError::MissingCredential { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Connector(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ConnectorError> for AppError {
    fn from(value: ConnectorError) -> Self {
        Self::Connector(value)
    }
}

impl From<UnknownSource> for AppError {
    fn from(value: UnknownSource) -> Self {
        Self::UnknownSource(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_maps_to_bad_request() {
        let error = AppError::from(UnknownSource("greenhouse".to_string()));
        assert!(error.to_string().contains("greenhouse"));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_credential_is_a_configuration_error() {
        let error = AppError::from(ConfigError::MissingCredential {
            key: "WORKABLE_API_KEY",
        });
        assert_eq!(
            error.to_string(),
            "configuration error: WORKABLE_API_KEY is not set; export it or add it to .env"
        );
        assert_eq!(
            error.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let error = AppError::from(ConfigError::InvalidPort);
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
