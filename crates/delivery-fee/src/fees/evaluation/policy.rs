use serde::{Deserialize, Serialize};

use super::super::domain::{ConditionCategory, ConditionRule, RuleTrigger, VehicleType};

/// A matched rule that bans the vehicle type under the current weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prohibition {
    pub rule_id: u64,
    pub vehicle_type: VehicleType,
    pub category: ConditionCategory,
    pub trigger: RuleTrigger,
}

impl Prohibition {
    pub(crate) fn from_rule(rule: &ConditionRule) -> Self {
        Self {
            rule_id: rule.id,
            vehicle_type: rule.vehicle_type,
            category: rule.category(),
            trigger: rule.trigger.clone(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Usage of selected vehicle type is forbidden: {} not allowed with {}",
            self.vehicle_type,
            self.trigger.describe()
        )
    }
}
