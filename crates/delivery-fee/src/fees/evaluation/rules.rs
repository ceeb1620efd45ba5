use super::super::domain::{ConditionCategory, ConditionRule};
use super::policy::Prohibition;
use super::{CategorySurcharge, SurchargeComponent};

/// Reduces the matched rules of one category to a surcharge.
///
/// Rules are visited by ascending id. The first forbidding rule aborts the reduction and
/// whatever was summed before it is dropped.
pub(crate) fn process_conditions(
    category: ConditionCategory,
    rules: &[ConditionRule],
) -> Result<CategorySurcharge, Prohibition> {
    let mut ordered: Vec<&ConditionRule> = rules.iter().collect();
    ordered.sort_by_key(|rule| rule.id);

    let mut amount = 0.0;
    let mut components = Vec::with_capacity(ordered.len());

    for rule in ordered {
        if rule.usage_forbidden {
            return Err(Prohibition::from_rule(rule));
        }

        let fee = rule.surcharge_fee.unwrap_or(0.0);
        amount += fee;
        components.push(SurchargeComponent {
            rule_id: rule.id,
            category,
            amount: fee,
        });
    }

    Ok(CategorySurcharge {
        category,
        amount,
        components,
    })
}
