use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::warn;

use super::IngestionError;

/// Root `<observations timestamp="...">` element of the station observations feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationFeed {
    #[serde(rename = "@timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "station", default)]
    pub stations: Vec<StationReading>,
}

/// One `<station>` element. Values stay textual until read so blank elements do not fail
/// the whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationReading {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "wmocode", default)]
    pub wmo_code: Option<String>,
    #[serde(default)]
    pub phenomenon: Option<String>,
    #[serde(rename = "airtemperature", default)]
    pub air_temperature: Option<String>,
    #[serde(rename = "windspeed", default)]
    pub wind_speed: Option<String>,
}

impl ObservationFeed {
    pub fn parse(xml: &str) -> Result<Self, IngestionError> {
        Ok(from_str(xml)?)
    }

    /// Feed timestamp, given in epoch seconds.
    pub fn observed_at(&self) -> Result<DateTime<Utc>, IngestionError> {
        let raw = non_blank(self.timestamp.as_deref())
            .ok_or_else(|| IngestionError::Timestamp("timestamp attribute missing".to_string()))?;

        let seconds: i64 = raw
            .parse()
            .map_err(|_| IngestionError::Timestamp(format!("'{raw}' is not epoch seconds")))?;

        DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| IngestionError::Timestamp(format!("'{raw}' is out of range")))
    }
}

impl StationReading {
    pub fn wmo_code(&self) -> Option<&str> {
        non_blank(self.wmo_code.as_deref())
    }

    pub fn phenomenon(&self) -> Option<String> {
        non_blank(self.phenomenon.as_deref()).map(str::to_string)
    }

    pub fn air_temperature(&self) -> Option<f64> {
        self.numeric("airtemperature", self.air_temperature.as_deref())
    }

    pub fn wind_speed(&self) -> Option<f64> {
        self.numeric("windspeed", self.wind_speed.as_deref())
    }

    fn numeric(&self, field: &str, raw: Option<&str>) -> Option<f64> {
        let raw = non_blank(raw)?;
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                warn!(
                    station = self.name.as_deref().unwrap_or("unknown"),
                    field,
                    value = raw,
                    "ignoring unreadable station value"
                );
                None
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
