use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::fees::domain::{
    BaseFeeEntry, ConditionCategory, ConditionRule, NewObservation, RuleMatcher, RuleTrigger,
    VehicleType, WeatherObservation,
};
use crate::fees::repository::{RepositoryError, TariffRepository, WeatherRepository};
use crate::fees::DeliveryFeeCalculator;

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 18, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn observation(
    id: u64,
    city: &str,
    temperature: Option<f64>,
    wind: Option<f64>,
    phenomenon: Option<&str>,
    observed_at: DateTime<Utc>,
) -> WeatherObservation {
    WeatherObservation {
        id,
        city_name: city.to_string(),
        air_temperature: temperature,
        wind_speed: wind,
        phenomenon: phenomenon.map(str::to_string),
        observed_at,
    }
}

pub(super) fn base_fee(id: u64, city: &str, vehicle: VehicleType, amount: f64) -> BaseFeeEntry {
    BaseFeeEntry {
        id,
        city_name: city.to_string(),
        vehicle_type: vehicle,
        amount: Some(amount),
    }
}

pub(super) fn temperature_rule(
    id: u64,
    vehicle: VehicleType,
    min: f64,
    max: f64,
    fee: f64,
) -> ConditionRule {
    ConditionRule {
        id,
        vehicle_type: vehicle,
        trigger: RuleTrigger::Temperature { min, max },
        surcharge_fee: Some(fee),
        usage_forbidden: false,
    }
}

pub(super) fn wind_rule(
    id: u64,
    vehicle: VehicleType,
    min: f64,
    max: f64,
    fee: f64,
    usage_forbidden: bool,
) -> ConditionRule {
    ConditionRule {
        id,
        vehicle_type: vehicle,
        trigger: RuleTrigger::Wind { min, max },
        surcharge_fee: Some(fee),
        usage_forbidden,
    }
}

pub(super) fn phenomenon_rule(
    id: u64,
    vehicle: VehicleType,
    phenomenon: &str,
    fee: f64,
    usage_forbidden: bool,
) -> ConditionRule {
    ConditionRule {
        id,
        vehicle_type: vehicle,
        trigger: RuleTrigger::Phenomenon {
            phenomenon: phenomenon.to_string(),
        },
        surcharge_fee: Some(fee),
        usage_forbidden,
    }
}

#[derive(Default)]
pub(super) struct MemoryWeather {
    observations: Mutex<Vec<WeatherObservation>>,
}

impl MemoryWeather {
    pub(super) fn with(observations: Vec<WeatherObservation>) -> Self {
        Self {
            observations: Mutex::new(observations),
        }
    }

    fn newest<F>(&self, city_name: &str, filter: F) -> Option<WeatherObservation>
    where
        F: Fn(&WeatherObservation) -> bool,
    {
        let guard = self.observations.lock().expect("weather mutex poisoned");
        guard
            .iter()
            .filter(|observation| observation.city_name == city_name && filter(observation))
            .max_by_key(|observation| (observation.observed_at, observation.id))
            .cloned()
    }
}

impl WeatherRepository for MemoryWeather {
    fn latest_observation(
        &self,
        city_name: &str,
    ) -> Result<Option<WeatherObservation>, RepositoryError> {
        Ok(self.newest(city_name, |_| true))
    }

    fn observation_at_or_before(
        &self,
        city_name: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>, RepositoryError> {
        Ok(self.newest(city_name, |observation| observation.observed_at <= at))
    }

    fn record_observation(
        &self,
        observation: NewObservation,
    ) -> Result<WeatherObservation, RepositoryError> {
        let mut guard = self.observations.lock().expect("weather mutex poisoned");
        let stored = observation.with_id(guard.len() as u64 + 1);
        guard.push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub(super) struct MemoryTariffs {
    pub(super) base_fees: Vec<BaseFeeEntry>,
    pub(super) rules: Vec<ConditionRule>,
    lookups: AtomicUsize,
}

impl MemoryTariffs {
    pub(super) fn new(base_fees: Vec<BaseFeeEntry>, rules: Vec<ConditionRule>) -> Self {
        Self {
            base_fees,
            rules,
            lookups: AtomicUsize::new(0),
        }
    }

    pub(super) fn rule_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl TariffRepository for MemoryTariffs {
    fn base_fee(
        &self,
        city_name: &str,
        vehicle_type: VehicleType,
    ) -> Result<Option<BaseFeeEntry>, RepositoryError> {
        Ok(self
            .base_fees
            .iter()
            .find(|entry| entry.city_name == city_name && entry.vehicle_type == vehicle_type)
            .cloned())
    }

    fn condition_rules(
        &self,
        vehicle_type: VehicleType,
        category: ConditionCategory,
        matcher: &RuleMatcher,
    ) -> Result<Vec<ConditionRule>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.vehicle_type == vehicle_type && rule.matches(category, matcher))
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableTariffs;

impl TariffRepository for UnavailableTariffs {
    fn base_fee(
        &self,
        _city_name: &str,
        _vehicle_type: VehicleType,
    ) -> Result<Option<BaseFeeEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("tariff store offline".to_string()))
    }

    fn condition_rules(
        &self,
        _vehicle_type: VehicleType,
        _category: ConditionCategory,
        _matcher: &RuleMatcher,
    ) -> Result<Vec<ConditionRule>, RepositoryError> {
        Err(RepositoryError::Unavailable("tariff store offline".to_string()))
    }
}

/// Tallinn tariffs with one non-forbidding rule per category for bikes.
pub(super) fn tallinn_tariffs() -> MemoryTariffs {
    MemoryTariffs::new(
        vec![
            base_fee(1, "Tallinn", VehicleType::Car, 4.0),
            base_fee(2, "Tallinn", VehicleType::Scooter, 3.5),
            base_fee(3, "Tallinn", VehicleType::Bike, 3.0),
        ],
        vec![
            temperature_rule(10, VehicleType::Bike, -10.0, 0.0, 0.5),
            temperature_rule(11, VehicleType::Scooter, -10.0, 0.0, 0.5),
            wind_rule(20, VehicleType::Bike, 10.0, 20.0, 0.5, false),
            wind_rule(21, VehicleType::Bike, 20.1, 100.0, 0.0, true),
            phenomenon_rule(30, VehicleType::Bike, "Light rain", 0.5, false),
            phenomenon_rule(31, VehicleType::Bike, "Thunder", 0.0, true),
            phenomenon_rule(32, VehicleType::Scooter, "Thunder", 0.0, true),
        ],
    )
}

pub(super) type MemoryCalculator = DeliveryFeeCalculator<MemoryWeather, MemoryTariffs>;

pub(super) fn calculator_with(
    observations: Vec<WeatherObservation>,
    tariffs: MemoryTariffs,
) -> (MemoryCalculator, Arc<MemoryTariffs>) {
    let tariffs = Arc::new(tariffs);
    let calculator =
        DeliveryFeeCalculator::new(Arc::new(MemoryWeather::with(observations)), tariffs.clone());
    (calculator, tariffs)
}

pub(super) async fn response_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}
