mod policy;
mod rules;

pub use policy::Prohibition;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{ConditionCategory, MetricReading, VehicleType};
use super::repository::TariffRepository;
use super::service::FeeError;

/// Looks up the rules matching one weather metric and reduces them to a surcharge.
pub struct ConditionRuleEvaluator<T> {
    repository: Arc<T>,
}

impl<T> ConditionRuleEvaluator<T>
where
    T: TariffRepository,
{
    pub fn new(repository: Arc<T>) -> Self {
        Self { repository }
    }

    pub fn evaluate(
        &self,
        vehicle_type: VehicleType,
        reading: &MetricReading,
    ) -> Result<CategorySurcharge, FeeError> {
        let category = reading.category();
        let matched = self
            .repository
            .condition_rules(vehicle_type, category, &reading.matcher())?;

        debug!(
            vehicle = %vehicle_type,
            category = category.label(),
            matched = matched.len(),
            "evaluated condition rules"
        );

        rules::process_conditions(category, &matched).map_err(FeeError::UsageForbidden)
    }
}

/// Single summed rule, kept so quotes can explain their extra fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurchargeComponent {
    pub rule_id: u64,
    pub category: ConditionCategory,
    pub amount: f64,
}

/// Surcharge contributed by one metric category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySurcharge {
    pub category: ConditionCategory,
    pub amount: f64,
    pub components: Vec<SurchargeComponent>,
}
