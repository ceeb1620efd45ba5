use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// City served by the delivery platform. The name is the lookup key for fee queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: u64,
    pub name: String,
    pub station_name: String,
    pub wmo_code: String,
}

/// Closed set of courier vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Car,
    Scooter,
    Bike,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] = [VehicleType::Car, VehicleType::Scooter, VehicleType::Bike];

    pub fn label(&self) -> &'static str {
        match self {
            VehicleType::Car => "CAR",
            VehicleType::Scooter => "SCOOTER",
            VehicleType::Bike => "BIKE",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VehicleType {
    type Err = InvalidVehicleType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        VehicleType::ALL
            .into_iter()
            .find(|vehicle| vehicle.label().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| InvalidVehicleType(value.to_string()))
    }
}

/// Raised when a vehicle string does not name a known vehicle type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vehicle type '{0}', expected one of CAR, SCOOTER, BIKE")]
pub struct InvalidVehicleType(pub String);

/// Weather metric a condition rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionCategory {
    Phenomenon,
    Temperature,
    Wind,
}

impl ConditionCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ConditionCategory::Phenomenon => "PHENOMENON",
            ConditionCategory::Temperature => "TEMPERATURE",
            ConditionCategory::Wind => "WIND",
        }
    }
}

impl FromStr for ConditionCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PHENOMENON" => Ok(Self::Phenomenon),
            "TEMPERATURE" => Ok(Self::Temperature),
            "WIND" => Ok(Self::Wind),
            other => Err(format!("unknown condition category '{other}'")),
        }
    }
}

/// Fixed fee for a (city, vehicle type) pair. A missing amount is charged as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFeeEntry {
    pub id: u64,
    pub city_name: String,
    pub vehicle_type: VehicleType,
    pub amount: Option<f64>,
}

/// One reading of a city's weather station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub id: u64,
    pub city_name: String,
    pub air_temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub phenomenon: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl WeatherObservation {
    /// Metrics present on this observation, in evaluation order: temperature, wind, phenomenon.
    pub fn readings(&self) -> Vec<MetricReading> {
        let mut readings = Vec::with_capacity(3);
        if let Some(temperature) = self.air_temperature {
            readings.push(MetricReading::Temperature(temperature));
        }
        if let Some(wind) = self.wind_speed {
            readings.push(MetricReading::Wind(wind));
        }
        if let Some(phenomenon) = &self.phenomenon {
            readings.push(MetricReading::Phenomenon(phenomenon.clone()));
        }
        readings
    }
}

/// Observation payload prior to storage assigning an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObservation {
    pub city_name: String,
    pub air_temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub phenomenon: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl NewObservation {
    pub fn with_id(self, id: u64) -> WeatherObservation {
        WeatherObservation {
            id,
            city_name: self.city_name,
            air_temperature: self.air_temperature,
            wind_speed: self.wind_speed,
            phenomenon: self.phenomenon,
            observed_at: self.observed_at,
        }
    }
}

/// What a condition rule matches on. Ranges are inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleTrigger {
    Phenomenon { phenomenon: String },
    Temperature { min: f64, max: f64 },
    Wind { min: f64, max: f64 },
}

impl RuleTrigger {
    pub fn category(&self) -> ConditionCategory {
        match self {
            RuleTrigger::Phenomenon { .. } => ConditionCategory::Phenomenon,
            RuleTrigger::Temperature { .. } => ConditionCategory::Temperature,
            RuleTrigger::Wind { .. } => ConditionCategory::Wind,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RuleTrigger::Phenomenon { phenomenon } => format!("phenomenon '{phenomenon}'"),
            RuleTrigger::Temperature { min, max } => {
                format!("air temperature between {min:.1} and {max:.1}")
            }
            RuleTrigger::Wind { min, max } => format!("wind speed between {min:.1} and {max:.1}"),
        }
    }
}

/// Weather-triggered surcharge or prohibition for one vehicle type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub id: u64,
    pub vehicle_type: VehicleType,
    pub trigger: RuleTrigger,
    pub surcharge_fee: Option<f64>,
    pub usage_forbidden: bool,
}

impl ConditionRule {
    pub fn category(&self) -> ConditionCategory {
        self.trigger.category()
    }

    /// Whether the rule fires for the given category and matcher.
    pub fn matches(&self, category: ConditionCategory, matcher: &RuleMatcher) -> bool {
        if self.category() != category {
            return false;
        }

        match (&self.trigger, matcher) {
            (RuleTrigger::Phenomenon { phenomenon }, RuleMatcher::Exact(value)) => {
                phenomenon == value
            }
            (RuleTrigger::Temperature { min, max }, RuleMatcher::Within(value))
            | (RuleTrigger::Wind { min, max }, RuleMatcher::Within(value)) => {
                *min <= *value && *value <= *max
            }
            _ => false,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidRule> {
        match &self.trigger {
            RuleTrigger::Phenomenon { phenomenon } if phenomenon.trim().is_empty() => {
                return Err(InvalidRule::EmptyPhenomenon { rule_id: self.id });
            }
            RuleTrigger::Temperature { min, max } | RuleTrigger::Wind { min, max } => {
                if min.is_nan() || max.is_nan() || min > max {
                    return Err(InvalidRule::InvertedRange {
                        rule_id: self.id,
                        min: *min,
                        max: *max,
                    });
                }
            }
            RuleTrigger::Phenomenon { .. } => {}
        }

        match self.surcharge_fee {
            Some(fee) if fee.is_nan() || fee < 0.0 => Err(InvalidRule::NegativeSurcharge {
                rule_id: self.id,
                fee,
            }),
            _ => Ok(()),
        }
    }
}

/// Rule records that would break the category invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidRule {
    #[error("rule {rule_id}: phenomenon must not be blank")]
    EmptyPhenomenon { rule_id: u64 },
    #[error("rule {rule_id}: range minimum {min} exceeds maximum {max}")]
    InvertedRange { rule_id: u64, min: f64, max: f64 },
    #[error("rule {rule_id}: surcharge {fee} must be zero or positive")]
    NegativeSurcharge { rule_id: u64, fee: f64 },
}

/// Lookup criterion handed to storage: exact phenomenon text or a value that must fall
/// inside the rule's inclusive range.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleMatcher {
    Exact(String),
    Within(f64),
}

/// A single metric taken from a weather snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricReading {
    Temperature(f64),
    Wind(f64),
    Phenomenon(String),
}

impl MetricReading {
    pub fn category(&self) -> ConditionCategory {
        match self {
            MetricReading::Temperature(_) => ConditionCategory::Temperature,
            MetricReading::Wind(_) => ConditionCategory::Wind,
            MetricReading::Phenomenon(_) => ConditionCategory::Phenomenon,
        }
    }

    pub fn matcher(&self) -> RuleMatcher {
        match self {
            MetricReading::Temperature(value) | MetricReading::Wind(value) => {
                RuleMatcher::Within(*value)
            }
            MetricReading::Phenomenon(value) => RuleMatcher::Exact(value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature_rule(min: f64, max: f64) -> ConditionRule {
        ConditionRule {
            id: 1,
            vehicle_type: VehicleType::Bike,
            trigger: RuleTrigger::Temperature { min, max },
            surcharge_fee: Some(0.5),
            usage_forbidden: false,
        }
    }

    #[test]
    fn vehicle_type_parses_case_insensitively() {
        assert_eq!("bike".parse::<VehicleType>(), Ok(VehicleType::Bike));
        assert_eq!(" Scooter ".parse::<VehicleType>(), Ok(VehicleType::Scooter));
        assert_eq!("CAR".parse::<VehicleType>(), Ok(VehicleType::Car));
        assert_eq!(
            "truck".parse::<VehicleType>(),
            Err(InvalidVehicleType("truck".to_string()))
        );
    }

    #[test]
    fn range_rules_match_inclusive_bounds() {
        let rule = temperature_rule(-10.0, 0.0);
        let category = ConditionCategory::Temperature;

        assert!(rule.matches(category, &RuleMatcher::Within(-10.0)));
        assert!(rule.matches(category, &RuleMatcher::Within(0.0)));
        assert!(rule.matches(category, &RuleMatcher::Within(-5.5)));
        assert!(!rule.matches(category, &RuleMatcher::Within(0.1)));
        assert!(!rule.matches(category, &RuleMatcher::Within(-10.1)));
        assert!(!rule.matches(ConditionCategory::Wind, &RuleMatcher::Within(-5.0)));
    }

    #[test]
    fn phenomenon_rules_require_exact_text() {
        let rule = ConditionRule {
            id: 2,
            vehicle_type: VehicleType::Scooter,
            trigger: RuleTrigger::Phenomenon {
                phenomenon: "Light rain".to_string(),
            },
            surcharge_fee: Some(0.5),
            usage_forbidden: false,
        };
        let category = ConditionCategory::Phenomenon;

        assert!(rule.matches(category, &RuleMatcher::Exact("Light rain".to_string())));
        assert!(!rule.matches(category, &RuleMatcher::Exact("light rain".to_string())));
        assert!(!rule.matches(category, &RuleMatcher::Within(1.0)));
    }

    #[test]
    fn validate_rejects_broken_rules() {
        assert!(temperature_rule(-10.0, 0.0).validate().is_ok());
        assert!(matches!(
            temperature_rule(5.0, 0.0).validate(),
            Err(InvalidRule::InvertedRange { .. })
        ));

        let mut negative = temperature_rule(0.0, 1.0);
        negative.surcharge_fee = Some(-1.0);
        assert!(matches!(
            negative.validate(),
            Err(InvalidRule::NegativeSurcharge { .. })
        ));

        let blank = ConditionRule {
            trigger: RuleTrigger::Phenomenon {
                phenomenon: "  ".to_string(),
            },
            ..temperature_rule(0.0, 1.0)
        };
        assert!(matches!(
            blank.validate(),
            Err(InvalidRule::EmptyPhenomenon { .. })
        ));
    }

    #[test]
    fn readings_follow_evaluation_order_and_skip_missing_metrics() {
        let observation = WeatherObservation {
            id: 1,
            city_name: "Tartu".to_string(),
            air_temperature: Some(-3.0),
            wind_speed: None,
            phenomenon: Some("Light snowfall".to_string()),
            observed_at: Utc::now(),
        };

        assert_eq!(
            observation.readings(),
            vec![
                MetricReading::Temperature(-3.0),
                MetricReading::Phenomenon("Light snowfall".to_string()),
            ]
        );
    }
}
