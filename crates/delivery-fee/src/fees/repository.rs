use chrono::{DateTime, Utc};

use super::domain::{
    BaseFeeEntry, City, ConditionCategory, ConditionRule, NewObservation, RuleMatcher,
    VehicleType, WeatherObservation,
};

/// Weather observation storage. Implementations must pick deterministically among
/// observations sharing the qualifying timestamp; the bundled adapters prefer the highest id.
pub trait WeatherRepository: Send + Sync {
    fn latest_observation(
        &self,
        city_name: &str,
    ) -> Result<Option<WeatherObservation>, RepositoryError>;

    fn observation_at_or_before(
        &self,
        city_name: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>, RepositoryError>;

    fn record_observation(
        &self,
        observation: NewObservation,
    ) -> Result<WeatherObservation, RepositoryError>;
}

/// Base fee table and condition rule table lookups.
pub trait TariffRepository: Send + Sync {
    fn base_fee(
        &self,
        city_name: &str,
        vehicle_type: VehicleType,
    ) -> Result<Option<BaseFeeEntry>, RepositoryError>;

    /// Every rule for `vehicle_type` in `category` that fires for `matcher`.
    fn condition_rules(
        &self,
        vehicle_type: VehicleType,
        category: ConditionCategory,
        matcher: &RuleMatcher,
    ) -> Result<Vec<ConditionRule>, RepositoryError>;
}

/// City lookups used by feed ingestion to map stations onto cities.
pub trait CityRepository: Send + Sync {
    fn city_by_wmo_code(&self, wmo_code: &str) -> Result<Option<City>, RepositoryError>;
    fn station_codes(&self) -> Result<Vec<String>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
