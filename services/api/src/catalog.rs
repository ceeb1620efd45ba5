//! Operator endpoints: read back tariff tables and stored observations, and pull the
//! weather feed on demand.

use crate::infra::InMemoryStore;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use delivery_fee::error::AppError;
use delivery_fee::fees::{BaseFeeEntry, City, ConditionRule, VehicleType, WeatherObservation};
use delivery_fee::ingestion::{FeedClient, IngestionReport, WeatherIngestor};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct CatalogState {
    store: Arc<InMemoryStore>,
    ingestor: Arc<WeatherIngestor<InMemoryStore, InMemoryStore>>,
    feed: FeedClient,
}

impl CatalogState {
    pub(crate) fn new(store: Arc<InMemoryStore>, feed: FeedClient) -> Self {
        Self {
            ingestor: Arc::new(WeatherIngestor::new(store.clone(), store.clone())),
            store,
            feed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CityFilter {
    #[serde(default)]
    pub(crate) city: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RuleFilter {
    #[serde(default)]
    pub(crate) vehicle_type: Option<String>,
}

pub(crate) fn catalog_router(state: CatalogState) -> Router {
    Router::new()
        .route("/api/v1/cities", get(list_cities))
        .route("/api/v1/base-fees", get(list_base_fees))
        .route("/api/v1/condition-rules", get(list_condition_rules))
        .route("/api/v1/weather", get(list_observations))
        .route("/api/v1/weather/read", post(read_weather))
        .with_state(state)
}

pub(crate) async fn list_cities(State(state): State<CatalogState>) -> Json<Vec<City>> {
    Json(state.store.cities().to_vec())
}

pub(crate) async fn list_base_fees(
    State(state): State<CatalogState>,
    Query(filter): Query<CityFilter>,
) -> Json<Vec<BaseFeeEntry>> {
    let entries = state
        .store
        .base_fees()
        .iter()
        .filter(|entry| {
            filter
                .city
                .as_deref()
                .map_or(true, |city| entry.city_name == city)
        })
        .cloned()
        .collect();
    Json(entries)
}

pub(crate) async fn list_condition_rules(
    State(state): State<CatalogState>,
    Query(filter): Query<RuleFilter>,
) -> Result<Json<Vec<ConditionRule>>, AppError> {
    let vehicle = filter
        .vehicle_type
        .as_deref()
        .map(str::parse::<VehicleType>)
        .transpose()
        .map_err(|err| AppError::Fee(err.into()))?;

    let rules = state
        .store
        .rules()
        .iter()
        .filter(|rule| vehicle.map_or(true, |vehicle| rule.vehicle_type == vehicle))
        .cloned()
        .collect();
    Ok(Json(rules))
}

pub(crate) async fn list_observations(
    State(state): State<CatalogState>,
    Query(filter): Query<CityFilter>,
) -> Result<Json<Vec<WeatherObservation>>, AppError> {
    let observations = state
        .store
        .observations(filter.city.as_deref())
        .map_err(|err| AppError::Fee(err.into()))?;
    Ok(Json(observations))
}

/// Fetches the configured feed once and records it, outside the polling schedule.
pub(crate) async fn read_weather(
    State(state): State<CatalogState>,
) -> Result<Json<IngestionReport>, AppError> {
    let report = state.ingestor.refresh(&state.feed).await?;
    info!(
        url = state.feed.url(),
        recorded = report.recorded.len(),
        "weather feed read on request"
    );
    Ok(Json(report))
}
