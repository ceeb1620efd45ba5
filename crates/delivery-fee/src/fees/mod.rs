//! Delivery fee engine.
//!
//! A calculation resolves one weather snapshot for the city, looks up the base fee for the
//! (city, vehicle type) pair, then runs the condition rules for each metric on the snapshot.
//! Matching surcharges are summed; a rule that forbids usage aborts the whole calculation.

pub mod base_fee;
pub mod domain;
pub(crate) mod evaluation;
pub mod repository;
pub mod router;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use base_fee::BaseFeeResolver;
pub use domain::{
    BaseFeeEntry, City, ConditionCategory, ConditionRule, InvalidRule, InvalidVehicleType,
    MetricReading, NewObservation, RuleMatcher, RuleTrigger, VehicleType, WeatherObservation,
};
pub use evaluation::{CategorySurcharge, ConditionRuleEvaluator, Prohibition, SurchargeComponent};
pub use repository::{CityRepository, RepositoryError, TariffRepository, WeatherRepository};
pub use router::{delivery_fee_router, DeliveryFeeQuery};
pub use service::{DeliveryFeeCalculator, FeeError, FeeQuote};
pub use snapshot::WeatherSnapshotResolver;
