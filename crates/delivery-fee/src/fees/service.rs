use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::base_fee::BaseFeeResolver;
use super::domain::{InvalidVehicleType, VehicleType};
use super::evaluation::{ConditionRuleEvaluator, Prohibition, SurchargeComponent};
use super::repository::{RepositoryError, TariffRepository, WeatherRepository};
use super::snapshot::WeatherSnapshotResolver;

/// Computes delivery fees from the weather snapshot, base fee table and condition rules.
///
/// Holds no state between calls; every calculation reads storage afresh.
pub struct DeliveryFeeCalculator<W, T> {
    snapshots: WeatherSnapshotResolver<W>,
    base_fees: BaseFeeResolver<T>,
    evaluator: ConditionRuleEvaluator<T>,
}

impl<W, T> DeliveryFeeCalculator<W, T>
where
    W: WeatherRepository + 'static,
    T: TariffRepository + 'static,
{
    pub fn new(weather: Arc<W>, tariffs: Arc<T>) -> Self {
        Self {
            snapshots: WeatherSnapshotResolver::new(weather),
            base_fees: BaseFeeResolver::new(tariffs.clone()),
            evaluator: ConditionRuleEvaluator::new(tariffs),
        }
    }

    /// Total fee for the request.
    pub fn calculate(
        &self,
        city_name: &str,
        vehicle_type: &str,
        reference_time: Option<DateTime<Utc>>,
    ) -> Result<f64, FeeError> {
        self.quote(city_name, vehicle_type, reference_time)
            .map(|quote| quote.total_fee)
    }

    /// Fee with its breakdown. Metrics are evaluated temperature, wind, phenomenon; the
    /// first prohibition stops the calculation.
    pub fn quote(
        &self,
        city_name: &str,
        vehicle_type: &str,
        reference_time: Option<DateTime<Utc>>,
    ) -> Result<FeeQuote, FeeError> {
        let snapshot = self.snapshots.resolve(city_name, reference_time)?;
        let vehicle_type: VehicleType = vehicle_type.parse()?;
        let base_fee = self.base_fees.resolve(city_name, vehicle_type)?;

        let mut extra_fee = 0.0;
        let mut surcharges = Vec::new();

        for reading in snapshot.readings() {
            match self.evaluator.evaluate(vehicle_type, &reading) {
                Ok(surcharge) => {
                    extra_fee += surcharge.amount;
                    surcharges.extend(surcharge.components);
                }
                Err(FeeError::UsageForbidden(prohibition)) => {
                    warn!(
                        city = city_name,
                        vehicle = %vehicle_type,
                        rule_id = prohibition.rule_id,
                        category = prohibition.category.label(),
                        "vehicle usage forbidden by weather"
                    );
                    return Err(FeeError::UsageForbidden(prohibition));
                }
                Err(other) => return Err(other),
            }
        }

        let total_fee = base_fee + extra_fee;
        info!(
            city = city_name,
            vehicle = %vehicle_type,
            base_fee,
            extra_fee,
            total_fee,
            "delivery fee calculated"
        );

        Ok(FeeQuote {
            city: city_name.to_string(),
            vehicle_type,
            base_fee,
            extra_fee,
            total_fee,
            observed_at: snapshot.observed_at,
            surcharges,
        })
    }
}

/// Calculated fee together with the snapshot time and rules that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub city: String,
    pub vehicle_type: VehicleType,
    pub base_fee: f64,
    pub extra_fee: f64,
    pub total_fee: f64,
    pub observed_at: DateTime<Utc>,
    pub surcharges: Vec<SurchargeComponent>,
}

/// Error raised by the fee engine.
#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    #[error(
        "no weather data found for city '{city}'{}",
        .reference_time.map(|at| format!(" at or before {at}")).unwrap_or_default()
    )]
    WeatherNotFound {
        city: String,
        reference_time: Option<DateTime<Utc>>,
    },
    #[error("no base fee found for city '{city}' and vehicle {vehicle_type}")]
    BaseFeeNotFound {
        city: String,
        vehicle_type: VehicleType,
    },
    #[error(transparent)]
    InvalidVehicleType(#[from] InvalidVehicleType),
    #[error("{}", .0.summary())]
    UsageForbidden(Prohibition),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
