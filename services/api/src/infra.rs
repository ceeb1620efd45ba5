use chrono::{DateTime, Utc};
use delivery_fee::fees::{
    BaseFeeEntry, City, CityRepository, ConditionCategory, ConditionRule, NewObservation,
    RepositoryError, RuleMatcher, TariffRepository, VehicleType, WeatherObservation,
    WeatherRepository,
};
use delivery_fee::tariffs::TariffCatalog;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Newest observations kept per city; a month of hourly feeds.
pub(crate) const DEFAULT_OBSERVATION_RETENTION: usize = 24 * 31;

/// Process-local storage for tariffs and observations. Tariffs are fixed at startup;
/// observations grow as feeds are ingested, capped per city.
pub(crate) struct InMemoryStore {
    cities: Vec<City>,
    base_fees: Vec<BaseFeeEntry>,
    rules: Vec<ConditionRule>,
    observations: Mutex<ObservationLog>,
}

#[derive(Default)]
struct ObservationLog {
    last_id: u64,
    retention: usize,
    by_city: HashMap<String, Vec<WeatherObservation>>,
}

impl ObservationLog {
    fn push(&mut self, observation: NewObservation) -> WeatherObservation {
        self.last_id += 1;
        let stored = observation.with_id(self.last_id);
        let readings = self.by_city.entry(stored.city_name.clone()).or_default();
        readings.push(stored.clone());

        if readings.len() > self.retention {
            if let Some(oldest) = readings
                .iter()
                .enumerate()
                .min_by_key(|(_, observation)| (observation.observed_at, observation.id))
                .map(|(index, _)| index)
            {
                readings.remove(oldest);
            }
        }
        stored
    }
}

impl InMemoryStore {
    pub(crate) fn new(catalog: TariffCatalog) -> Self {
        Self::with_retention(catalog, DEFAULT_OBSERVATION_RETENTION)
    }

    pub(crate) fn with_retention(catalog: TariffCatalog, retention: usize) -> Self {
        Self {
            cities: catalog.cities,
            base_fees: catalog.base_fees,
            rules: catalog.rules,
            observations: Mutex::new(ObservationLog {
                retention: retention.max(1),
                ..ObservationLog::default()
            }),
        }
    }

    pub(crate) fn cities(&self) -> &[City] {
        &self.cities
    }

    pub(crate) fn base_fees(&self) -> &[BaseFeeEntry] {
        &self.base_fees
    }

    pub(crate) fn rules(&self) -> &[ConditionRule] {
        &self.rules
    }

    /// Stored observations ordered by time then id, optionally for one city.
    pub(crate) fn observations(
        &self,
        city_name: Option<&str>,
    ) -> Result<Vec<WeatherObservation>, RepositoryError> {
        let guard = self.log()?;
        let mut listed: Vec<WeatherObservation> = guard
            .by_city
            .iter()
            .filter(|(city, _)| city_name.map_or(true, |wanted| wanted == city.as_str()))
            .flat_map(|(_, readings)| readings.iter().cloned())
            .collect();
        listed.sort_by_key(|observation| (observation.observed_at, observation.id));
        Ok(listed)
    }

    fn log(&self) -> Result<MutexGuard<'_, ObservationLog>, RepositoryError> {
        self.observations
            .lock()
            .map_err(|_| RepositoryError::Unavailable("observation store poisoned".to_string()))
    }

    /// Newest matching observation; equal timestamps resolve to the highest id.
    fn newest<F>(
        &self,
        city_name: &str,
        filter: F,
    ) -> Result<Option<WeatherObservation>, RepositoryError>
    where
        F: Fn(&WeatherObservation) -> bool,
    {
        let guard = self.log()?;
        Ok(guard.by_city.get(city_name).and_then(|readings| {
            readings
                .iter()
                .filter(|observation| filter(observation))
                .max_by_key(|observation| (observation.observed_at, observation.id))
                .cloned()
        }))
    }
}

impl WeatherRepository for InMemoryStore {
    fn latest_observation(
        &self,
        city_name: &str,
    ) -> Result<Option<WeatherObservation>, RepositoryError> {
        self.newest(city_name, |_| true)
    }

    fn observation_at_or_before(
        &self,
        city_name: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>, RepositoryError> {
        self.newest(city_name, |observation| observation.observed_at <= at)
    }

    fn record_observation(
        &self,
        observation: NewObservation,
    ) -> Result<WeatherObservation, RepositoryError> {
        Ok(self.log()?.push(observation))
    }
}

impl TariffRepository for InMemoryStore {
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
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.vehicle_type == vehicle_type && rule.matches(category, matcher))
            .cloned()
            .collect())
    }
}

impl CityRepository for InMemoryStore {
    fn city_by_wmo_code(&self, wmo_code: &str) -> Result<Option<City>, RepositoryError> {
        Ok(self
            .cities
            .iter()
            .find(|city| city.wmo_code == wmo_code)
            .cloned())
    }

    fn station_codes(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.cities.iter().map(|city| city.wmo_code.clone()).collect())
    }
}
