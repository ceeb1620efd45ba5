use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::repository::{TariffRepository, WeatherRepository};
use super::service::{DeliveryFeeCalculator, FeeError};

/// Query string accepted by the delivery fee endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryFeeQuery {
    pub city: String,
    pub vehicle_type: String,
    #[serde(default)]
    pub observation_time: Option<String>,
}

/// Router builder exposing the fee calculation endpoint.
pub fn delivery_fee_router<W, T>(calculator: Arc<DeliveryFeeCalculator<W, T>>) -> Router
where
    W: WeatherRepository + 'static,
    T: TariffRepository + 'static,
{
    Router::new()
        .route("/api/v1/delivery-fee", get(quote_handler::<W, T>))
        .with_state(calculator)
}

pub(crate) async fn quote_handler<W, T>(
    State(calculator): State<Arc<DeliveryFeeCalculator<W, T>>>,
    Query(query): Query<DeliveryFeeQuery>,
) -> Response
where
    W: WeatherRepository + 'static,
    T: TariffRepository + 'static,
{
    let city = query.city.trim();
    if city.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "city must not be blank");
    }

    let reference_time = match query.observation_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match parse_observation_time(raw) {
            Ok(at) => Some(at),
            Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
        },
    };

    match calculator.quote(city, &query.vehicle_type, reference_time) {
        Ok(quote) => (StatusCode::OK, axum::Json(quote)).into_response(),
        Err(error) => error_response(status_for(&error), &error.to_string()),
    }
}

/// HTTP status for each engine failure kind.
pub fn status_for(error: &FeeError) -> StatusCode {
    match error {
        FeeError::WeatherNotFound { .. } | FeeError::BaseFeeNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        FeeError::InvalidVehicleType(_) => StatusCode::BAD_REQUEST,
        FeeError::UsageForbidden(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FeeError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Accepts RFC 3339 or a naive `YYYY-MM-DDTHH:MM:SS`, the latter read as UTC.
///
/// A positive offset sent without percent-encoding arrives with its `+` decoded to a space
/// (`2025-03-18T14:00:00 02:00`); that form is read as `+02:00`.
pub fn parse_observation_time(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.with_timezone(&Utc));
    }

    if let Some(restored) = restore_plus_offset(trimmed) {
        if let Ok(at) = DateTime::parse_from_rfc3339(&restored) {
            return Ok(at.with_timezone(&Utc));
        }
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map(|naive| naive.and_utc())
        .map_err(|err| format!("failed to parse observation_time '{raw}' ({err})"))
}

fn restore_plus_offset(value: &str) -> Option<String> {
    let (timestamp, offset) = value.rsplit_once(' ')?;
    let bytes = offset.as_bytes();
    let offset_shaped = bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(index, byte)| index == 2 || byte.is_ascii_digit());
    offset_shaped.then(|| format!("{}+{offset}", timestamp.trim_end()))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let payload = json!({
        "error": message,
    });
    (status, axum::Json(payload)).into_response()
}
