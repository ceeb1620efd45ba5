//! Tariff tables: cities, base fees and condition rules loaded from CSV.
//!
//! The built-in tables cover Tallinn, Tartu and Pärnu with the standard weather surcharges
//! and prohibitions for scooters and bikes.

mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::fees::domain::{
    BaseFeeEntry, City, ConditionCategory, ConditionRule, InvalidRule, InvalidVehicleType,
    RuleTrigger, VehicleType,
};
use parser::{BaseFeeRow, CityRow, ConditionRuleRow};

const BUILTIN_CITIES: &str = include_str!("../../data/cities.csv");
const BUILTIN_BASE_FEES: &str = include_str!("../../data/base_fees.csv");
const BUILTIN_CONDITION_RULES: &str = include_str!("../../data/condition_rules.csv");

/// Validated tariff records ready to be handed to a storage adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffCatalog {
    pub cities: Vec<City>,
    pub base_fees: Vec<BaseFeeEntry>,
    pub rules: Vec<ConditionRule>,
}

impl TariffCatalog {
    pub fn builtin() -> Result<Self, TariffImportError> {
        Self::from_readers(
            BUILTIN_CITIES.as_bytes(),
            BUILTIN_BASE_FEES.as_bytes(),
            BUILTIN_CONDITION_RULES.as_bytes(),
        )
    }

    pub fn from_paths<P: AsRef<Path>>(
        cities: P,
        base_fees: P,
        rules: P,
    ) -> Result<Self, TariffImportError> {
        Self::from_readers(
            std::fs::File::open(cities)?,
            std::fs::File::open(base_fees)?,
            std::fs::File::open(rules)?,
        )
    }

    /// Parses and validates the three tables. Ids are assigned in row order starting at 1.
    pub fn from_readers<A: Read, B: Read, C: Read>(
        cities: A,
        base_fees: B,
        rules: C,
    ) -> Result<Self, TariffImportError> {
        let cities = parser::parse_rows::<_, CityRow>(cities)?
            .into_iter()
            .zip(1..)
            .map(|(row, id)| City {
                id,
                name: row.name,
                station_name: row.station_name,
                wmo_code: row.wmo_code,
            })
            .collect::<Vec<_>>();

        let known: HashSet<&str> = cities.iter().map(|city| city.name.as_str()).collect();
        let mut seen = HashSet::new();
        let mut fee_entries = Vec::new();
        for (row, id) in parser::parse_rows::<_, BaseFeeRow>(base_fees)?
            .into_iter()
            .zip(1..)
        {
            let entry = base_fee_from_row(id, row)?;
            if !known.contains(entry.city_name.as_str()) {
                return Err(TariffImportError::UnknownCity(entry.city_name));
            }
            if !seen.insert((entry.city_name.clone(), entry.vehicle_type)) {
                return Err(TariffImportError::DuplicateBaseFee {
                    city: entry.city_name,
                    vehicle_type: entry.vehicle_type,
                });
            }
            fee_entries.push(entry);
        }

        let rules = parser::parse_rows::<_, ConditionRuleRow>(rules)?
            .into_iter()
            .zip(1..)
            .map(|(row, id)| rule_from_row(id, row))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            cities = cities.len(),
            base_fees = fee_entries.len(),
            rules = rules.len(),
            "tariff tables loaded"
        );

        Ok(Self {
            cities,
            base_fees: fee_entries,
            rules,
        })
    }
}

fn base_fee_from_row(id: u64, row: BaseFeeRow) -> Result<BaseFeeEntry, TariffImportError> {
    let vehicle_type: VehicleType = row.vehicle_type.parse()?;
    let amount = row
        .fee
        .as_deref()
        .map(|raw| parse_number(id, "fee", raw))
        .transpose()?;

    if let Some(amount) = amount {
        if amount < 0.0 {
            return Err(TariffImportError::NegativeBaseFee { row: id, amount });
        }
    }

    Ok(BaseFeeEntry {
        id,
        city_name: row.city,
        vehicle_type,
        amount,
    })
}

fn rule_from_row(id: u64, row: ConditionRuleRow) -> Result<ConditionRule, TariffImportError> {
    let vehicle_type: VehicleType = row.vehicle_type.parse()?;
    let category: ConditionCategory = row
        .category
        .parse()
        .map_err(|message| TariffImportError::Category { row: id, message })?;

    let min = row
        .min
        .as_deref()
        .map(|raw| parse_number(id, "min", raw))
        .transpose()?;
    let max = row
        .max
        .as_deref()
        .map(|raw| parse_number(id, "max", raw))
        .transpose()?;

    let trigger = match (category, row.phenomenon, min, max) {
        (ConditionCategory::Phenomenon, Some(phenomenon), None, None) => {
            RuleTrigger::Phenomenon { phenomenon }
        }
        (ConditionCategory::Temperature, None, Some(min), Some(max)) => {
            RuleTrigger::Temperature { min, max }
        }
        (ConditionCategory::Wind, None, Some(min), Some(max)) => RuleTrigger::Wind { min, max },
        (category, ..) => {
            return Err(TariffImportError::Shape {
                row: id,
                category: category.label(),
            })
        }
    };

    let surcharge_fee = row
        .fee
        .as_deref()
        .map(|raw| parse_number(id, "fee", raw))
        .transpose()?;

    let rule = ConditionRule {
        id,
        vehicle_type,
        trigger,
        surcharge_fee,
        usage_forbidden: row.usage_forbidden,
    };
    rule.validate()?;
    Ok(rule)
}

fn parse_number(row: u64, column: &'static str, raw: &str) -> Result<f64, TariffImportError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| TariffImportError::Number {
            row,
            column,
            value: raw.to_string(),
        })
}

/// Error raised while reading tariff tables.
#[derive(Debug, thiserror::Error)]
pub enum TariffImportError {
    #[error("failed to read tariff table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tariff CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Vehicle(#[from] InvalidVehicleType),
    #[error("row {row}: {message}")]
    Category { row: u64, message: String },
    #[error("row {row}: {column} value '{value}' is not a number")]
    Number {
        row: u64,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: {category} rules need a phenomenon or a min/max range, not both")]
    Shape { row: u64, category: &'static str },
    #[error("row {row}: base fee {amount} must be zero or positive")]
    NegativeBaseFee { row: u64, amount: f64 },
    #[error("base fee references unknown city '{0}'")]
    UnknownCity(String),
    #[error("duplicate base fee for city '{city}' and vehicle {vehicle_type}")]
    DuplicateBaseFee {
        city: String,
        vehicle_type: VehicleType,
    },
    #[error(transparent)]
    Rule(#[from] InvalidRule),
}
