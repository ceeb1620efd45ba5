use super::common::*;
use crate::fees::{
    BaseFeeResolver, ConditionCategory, ConditionRuleEvaluator, FeeError, MetricReading,
    VehicleType,
};
use std::sync::Arc;

fn evaluator() -> ConditionRuleEvaluator<MemoryTariffs> {
    ConditionRuleEvaluator::new(Arc::new(tallinn_tariffs()))
}

#[test]
fn temperature_range_is_inclusive_at_both_ends() {
    let evaluator = evaluator();

    for value in [-10.0, -4.2, 0.0] {
        let surcharge = evaluator
            .evaluate(VehicleType::Bike, &MetricReading::Temperature(value))
            .expect("no prohibition");
        assert_eq!(surcharge.amount, 0.5, "temperature {value}");
        assert_eq!(surcharge.category, ConditionCategory::Temperature);
    }

    let outside = evaluator
        .evaluate(VehicleType::Bike, &MetricReading::Temperature(0.1))
        .expect("no prohibition");
    assert_eq!(outside.amount, 0.0);
    assert!(outside.components.is_empty());
}

#[test]
fn rules_are_scoped_to_vehicle_type() {
    let surcharge = evaluator()
        .evaluate(VehicleType::Car, &MetricReading::Wind(15.0))
        .expect("cars have no wind rules");
    assert_eq!(surcharge.amount, 0.0);
}

#[test]
fn overlapping_rules_in_one_category_are_all_summed() {
    let mut tariffs = tallinn_tariffs();
    tariffs
        .rules
        .push(temperature_rule(12, VehicleType::Bike, -5.0, 5.0, 0.25));
    let evaluator = ConditionRuleEvaluator::new(Arc::new(tariffs));

    let surcharge = evaluator
        .evaluate(VehicleType::Bike, &MetricReading::Temperature(-1.0))
        .expect("no prohibition");
    assert_eq!(surcharge.amount, 0.75);
    assert_eq!(surcharge.components.len(), 2);
}

#[test]
fn forbidding_phenomenon_signals_usage_forbidden() {
    match evaluator().evaluate(
        VehicleType::Scooter,
        &MetricReading::Phenomenon("Thunder".to_string()),
    ) {
        Err(FeeError::UsageForbidden(prohibition)) => {
            assert_eq!(prohibition.rule_id, 32);
            assert_eq!(prohibition.vehicle_type, VehicleType::Scooter);
            assert_eq!(prohibition.category, ConditionCategory::Phenomenon);
        }
        other => panic!("expected usage forbidden, got {other:?}"),
    }
}

#[test]
fn phenomenon_match_is_exact() {
    let surcharge = evaluator()
        .evaluate(
            VehicleType::Bike,
            &MetricReading::Phenomenon("Light rain shower".to_string()),
        )
        .expect("no prohibition");
    assert_eq!(surcharge.amount, 0.0);
}

#[test]
fn base_fee_without_amount_defaults_to_zero() {
    let mut tariffs = tallinn_tariffs();
    tariffs.base_fees[2].amount = None;
    let resolver = BaseFeeResolver::new(Arc::new(tariffs));

    let fee = resolver
        .resolve("Tallinn", VehicleType::Bike)
        .expect("entry exists");
    assert_eq!(fee, 0.0);
}

#[test]
fn missing_base_fee_entry_is_not_found() {
    let resolver = BaseFeeResolver::new(Arc::new(tallinn_tariffs()));
    match resolver.resolve("Pärnu", VehicleType::Car) {
        Err(FeeError::BaseFeeNotFound { city, vehicle_type }) => {
            assert_eq!(city, "Pärnu");
            assert_eq!(vehicle_type, VehicleType::Car);
        }
        other => panic!("expected base fee not found, got {other:?}"),
    }
}
