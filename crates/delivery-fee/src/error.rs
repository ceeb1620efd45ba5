use crate::config::ConfigError;
use crate::fees::router::status_for;
use crate::fees::FeeError;
use crate::ingestion::IngestionError;
use crate::tariffs::TariffImportError;
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
    Tariffs(TariffImportError),
    Ingestion(IngestionError),
    Fee(FeeError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Tariffs(err) => write!(f, "tariff error: {}", err),
            AppError::Ingestion(err) => write!(f, "ingestion error: {}", err),
            AppError::Fee(err) => write!(f, "fee calculation failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Tariffs(err) => Some(err),
            AppError::Ingestion(err) => Some(err),
            AppError::Fee(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Fee(err) => status_for(err),
            AppError::Ingestion(
                IngestionError::Http(_) | IngestionError::Xml(_) | IngestionError::Timestamp(_),
            ) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Tariffs(_)
            | AppError::Ingestion(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

impl From<TariffImportError> for AppError {
    fn from(value: TariffImportError) -> Self {
        Self::Tariffs(value)
    }
}

impl From<IngestionError> for AppError {
    fn from(value: IngestionError) -> Self {
        Self::Ingestion(value)
    }
}

impl From<FeeError> for AppError {
    fn from(value: FeeError) -> Self {
        Self::Fee(value)
    }
}
