use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::domain::WeatherObservation;
use super::repository::WeatherRepository;
use super::service::FeeError;

/// Picks the single observation a fee calculation runs against.
pub struct WeatherSnapshotResolver<W> {
    repository: Arc<W>,
}

impl<W> WeatherSnapshotResolver<W>
where
    W: WeatherRepository,
{
    pub fn new(repository: Arc<W>) -> Self {
        Self { repository }
    }

    /// Latest observation for the city, or the latest one not after `reference_time`.
    pub fn resolve(
        &self,
        city_name: &str,
        reference_time: Option<DateTime<Utc>>,
    ) -> Result<WeatherObservation, FeeError> {
        let observation = match reference_time {
            Some(at) => self.repository.observation_at_or_before(city_name, at)?,
            None => self.repository.latest_observation(city_name)?,
        };

        let observation = observation.ok_or_else(|| FeeError::WeatherNotFound {
            city: city_name.to_string(),
            reference_time,
        })?;

        debug!(
            city = city_name,
            observation_id = observation.id,
            observed_at = %observation.observed_at,
            "resolved weather snapshot"
        );

        Ok(observation)
    }
}
