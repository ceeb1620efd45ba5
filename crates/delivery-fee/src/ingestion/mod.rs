//! Weather observation ingestion.
//!
//! Turns the station observations feed into stored [`WeatherObservation`]s for the cities
//! the platform serves. Stations without a matching city are skipped.

mod client;
mod feed;

pub use client::{FeedClient, DEFAULT_FEED_URL};
pub use feed::{ObservationFeed, StationReading};

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::fees::domain::{NewObservation, WeatherObservation};
use crate::fees::repository::{CityRepository, RepositoryError, WeatherRepository};

/// Stores feed readings for known stations.
pub struct WeatherIngestor<C, W> {
    cities: Arc<C>,
    weather: Arc<W>,
}

impl<C, W> WeatherIngestor<C, W>
where
    C: CityRepository,
    W: WeatherRepository,
{
    pub fn new(cities: Arc<C>, weather: Arc<W>) -> Self {
        Self { cities, weather }
    }

    /// Downloads the current feed and records it.
    pub async fn refresh(&self, client: &FeedClient) -> Result<IngestionReport, IngestionError> {
        let xml = client.fetch().await?;
        self.ingest_xml(&xml)
    }

    pub fn ingest_xml(&self, xml: &str) -> Result<IngestionReport, IngestionError> {
        let feed = ObservationFeed::parse(xml)?;
        self.ingest(&feed)
    }

    /// Records one observation per station whose WMO code belongs to a city, all stamped
    /// with the feed timestamp.
    pub fn ingest(&self, feed: &ObservationFeed) -> Result<IngestionReport, IngestionError> {
        let observed_at = feed.observed_at()?;
        let known: HashSet<String> = self.cities.station_codes()?.into_iter().collect();

        let mut recorded = Vec::new();
        let mut skipped = 0;

        for station in &feed.stations {
            let Some(code) = station.wmo_code().filter(|code| known.contains(*code)) else {
                skipped += 1;
                continue;
            };

            let city = self
                .cities
                .city_by_wmo_code(code)?
                .ok_or_else(|| IngestionError::UnknownStation(code.to_string()))?;

            let observation = self.weather.record_observation(NewObservation {
                city_name: city.name.clone(),
                air_temperature: station.air_temperature(),
                wind_speed: station.wind_speed(),
                phenomenon: station.phenomenon(),
                observed_at,
            })?;

            debug!(
                city = %city.name,
                wmo_code = code,
                observation_id = observation.id,
                "recorded station observation"
            );
            recorded.push(observation);
        }

        info!(
            %observed_at,
            recorded = recorded.len(),
            skipped,
            "weather observations ingested"
        );

        Ok(IngestionReport {
            observed_at,
            recorded,
            skipped,
        })
    }
}

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub observed_at: DateTime<Utc>,
    pub recorded: Vec<WeatherObservation>,
    pub skipped: usize,
}

/// Error raised while fetching, parsing or storing feed data.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("failed to fetch observation feed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid observation feed: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("invalid feed timestamp: {0}")]
    Timestamp(String),
    #[error("station with WMO code {0} has no city")]
    UnknownStation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::domain::City;
    use std::sync::Mutex;

    struct Cities(Vec<City>);

    impl CityRepository for Cities {
        fn city_by_wmo_code(&self, wmo_code: &str) -> Result<Option<City>, RepositoryError> {
            Ok(self.0.iter().find(|city| city.wmo_code == wmo_code).cloned())
        }

        fn station_codes(&self) -> Result<Vec<String>, RepositoryError> {
            Ok(self.0.iter().map(|city| city.wmo_code.clone()).collect())
        }
    }

    #[derive(Default)]
    struct Recorded(Mutex<Vec<WeatherObservation>>);

    impl WeatherRepository for Recorded {
        fn latest_observation(
            &self,
            _city_name: &str,
        ) -> Result<Option<WeatherObservation>, RepositoryError> {
            Ok(None)
        }

        fn observation_at_or_before(
            &self,
            _city_name: &str,
            _at: DateTime<Utc>,
        ) -> Result<Option<WeatherObservation>, RepositoryError> {
            Ok(None)
        }

        fn record_observation(
            &self,
            observation: NewObservation,
        ) -> Result<WeatherObservation, RepositoryError> {
            let mut guard = self.0.lock().expect("mutex poisoned");
            let stored = observation.with_id(guard.len() as u64 + 1);
            guard.push(stored.clone());
            Ok(stored)
        }
    }

    fn cities() -> Cities {
        Cities(vec![
            City {
                id: 1,
                name: "Tallinn".to_string(),
                station_name: "Tallinn-Harku".to_string(),
                wmo_code: "26038".to_string(),
            },
            City {
                id: 2,
                name: "Pärnu".to_string(),
                station_name: "Pärnu".to_string(),
                wmo_code: "41803".to_string(),
            },
        ])
    }

    const FEED: &str = r#"<observations timestamp="1742317497">
        <station><name>Tallinn-Harku</name><wmocode>26038</wmocode><phenomenon>Light snow shower</phenomenon><airtemperature>-2.1</airtemperature><windspeed>4.7</windspeed></station>
        <station><name>Tartu-Tõravere</name><wmocode>26242</wmocode><phenomenon>Clear</phenomenon><airtemperature>1.0</airtemperature><windspeed>2.0</windspeed></station>
        <station><name>Pärnu</name><wmocode>41803</wmocode><phenomenon></phenomenon><airtemperature>0.4</airtemperature><windspeed>6.1</windspeed></station>
        <station><name>Virtsu</name><wmocode></wmocode><airtemperature>0.2</airtemperature></station>
    </observations>"#;

    #[test]
    fn records_only_stations_of_known_cities() {
        let weather = Arc::new(Recorded::default());
        let ingestor = WeatherIngestor::new(Arc::new(cities()), weather.clone());

        let report = ingestor.ingest_xml(FEED).expect("ingestion succeeds");

        assert_eq!(report.recorded.len(), 2);
        assert_eq!(report.skipped, 2);

        let stored = weather.0.lock().expect("mutex poisoned");
        assert_eq!(stored[0].city_name, "Tallinn");
        assert_eq!(stored[0].air_temperature, Some(-2.1));
        assert_eq!(stored[0].phenomenon.as_deref(), Some("Light snow shower"));
        assert_eq!(stored[1].city_name, "Pärnu");
        assert_eq!(stored[1].phenomenon, None);
        assert!(stored
            .iter()
            .all(|observation| observation.observed_at == report.observed_at));
    }

    #[test]
    fn feed_without_timestamp_records_nothing() {
        let weather = Arc::new(Recorded::default());
        let ingestor = WeatherIngestor::new(Arc::new(cities()), weather.clone());

        let result = ingestor.ingest_xml(
            "<observations><station><wmocode>26038</wmocode></station></observations>",
        );

        assert!(matches!(result, Err(IngestionError::Timestamp(_))));
        assert!(weather.0.lock().expect("mutex poisoned").is_empty());
    }

    #[test]
    fn malformed_document_is_an_xml_error() {
        let ingestor = WeatherIngestor::new(Arc::new(cities()), Arc::new(Recorded::default()));
        assert!(matches!(
            ingestor.ingest_xml("<observations timestamp=\"1\"><station>"),
            Err(IngestionError::Xml(_))
        ));
    }
}
