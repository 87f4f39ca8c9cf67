use core_types::{
    CompositeDefinition, CompositeNullPolicy, CoreError, EntityRecord, MetricDefinition,
    TrendIndicator,
};
use rust_decimal::Decimal;

/// Adds one trend column per trend-enabled metric, in catalog order.
pub fn apply_trends(
    records: Vec<EntityRecord>,
    metrics: &[MetricDefinition],
) -> Result<Vec<EntityRecord>, CoreError> {
    let trend_keys: Vec<&str> = metrics
        .iter()
        .filter(|m| m.has_trend_reference)
        .map(|m| m.key.as_str())
        .collect();

    records
        .into_iter()
        .map(|mut record| {
            for key in &trend_keys {
                let indicator = TrendIndicator::compare(record.metric(key), record.reference(key));
                record.push_trend(key, indicator)?;
            }
            Ok(record)
        })
        .collect()
}

/// Adds one column per composite, in declaration order.
pub fn apply_composites(
    records: Vec<EntityRecord>,
    composites: &[CompositeDefinition],
    policy: CompositeNullPolicy,
) -> Result<Vec<EntityRecord>, CoreError> {
    records
        .into_iter()
        .map(|mut record| {
            for composite in composites {
                let inputs: Vec<Option<Decimal>> =
                    composite.inputs.iter().map(|k| record.metric(k)).collect();
                record.push_composite(&composite.key, composite_mean(&inputs, policy))?;
            }
            Ok(record)
        })
        .collect()
}

/// Arithmetic mean of the inputs under the given null policy. Never returns zero
/// for missing data: no usable input means `None`, and so does a sum that
/// overflows `Decimal`.
pub fn composite_mean(inputs: &[Option<Decimal>], policy: CompositeNullPolicy) -> Option<Decimal> {
    if policy == CompositeNullPolicy::NullIfAnyNull && inputs.iter().any(Option::is_none) {
        return None;
    }

    let present: Vec<Decimal> = inputs.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let sum = present
        .iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(*value))?;
    sum.checked_div(Decimal::from(present.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Category, Direction, Entity};
    use rust_decimal_macros::dec;

    #[test]
    fn mean_of_complete_inputs() {
        let inputs = [Some(dec!(0.5)), Some(dec!(-0.3)), Some(dec!(1.1)), Some(dec!(0.7))];
        for policy in [CompositeNullPolicy::SkipNull, CompositeNullPolicy::NullIfAnyNull] {
            assert_eq!(composite_mean(&inputs, policy), Some(dec!(0.5)));
        }
    }

    #[test]
    fn skip_null_averages_the_present_inputs() {
        let inputs = [Some(dec!(0.5)), None, Some(dec!(1.1)), Some(dec!(0.7))];
        let mean = composite_mean(&inputs, CompositeNullPolicy::SkipNull).unwrap();
        assert_eq!(mean.round_dp(6), dec!(0.766667));
    }

    #[test]
    fn null_if_any_null_propagates_missing_inputs() {
        let inputs = [Some(dec!(0.5)), None, Some(dec!(1.1)), Some(dec!(0.7))];
        assert_eq!(composite_mean(&inputs, CompositeNullPolicy::NullIfAnyNull), None);
    }

    #[test]
    fn all_null_is_null_not_zero() {
        let inputs = [None, None, None];
        assert_eq!(composite_mean(&inputs, CompositeNullPolicy::SkipNull), None);
        assert_eq!(composite_mean(&inputs, CompositeNullPolicy::NullIfAnyNull), None);
        assert_eq!(composite_mean(&[], CompositeNullPolicy::SkipNull), None);
    }

    #[test]
    fn overflowing_inputs_yield_null() {
        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let inputs = [Some(huge), Some(huge)];
        assert_eq!(composite_mean(&inputs, CompositeNullPolicy::SkipNull), None);
        assert_eq!(composite_mean(&inputs, CompositeNullPolicy::NullIfAnyNull), None);
        assert_eq!(
            composite_mean(&[Some(Decimal::MAX), Some(Decimal::MIN)], CompositeNullPolicy::SkipNull),
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn trends_compare_current_with_reference() {
        let metrics = vec![
            MetricDefinition::new("up", "Up", Category::Technicals, "U").with_trend(),
            MetricDefinition::new("flat", "Flat", Category::Technicals, "F").with_trend(),
            MetricDefinition::new("gap", "Gap", Category::Technicals, "G").with_trend(),
            MetricDefinition::new("plain", "Plain", Category::Technicals, "P"),
        ];
        let mut record = EntityRecord::new(Entity::new("Energy", "ENEGYWD", None));
        record.push_metric("up", Some(dec!(2))).unwrap();
        record.push_reference("up", Some(dec!(1))).unwrap();
        record.push_metric("flat", Some(dec!(1))).unwrap();
        record.push_reference("flat", Some(dec!(1))).unwrap();
        record.push_metric("gap", Some(dec!(1))).unwrap();
        record.push_reference("gap", None).unwrap();
        record.push_metric("plain", Some(dec!(3))).unwrap();

        let records = apply_trends(vec![record], &metrics).unwrap();
        let record = &records[0];
        assert_eq!(record.trend("up").unwrap().direction, Direction::Up);
        assert_eq!(record.trend("flat").unwrap().direction, Direction::Down);
        assert_eq!(record.trend("gap"), None);
        assert_eq!(record.trend_keys().collect::<Vec<_>>(), vec!["up", "flat", "gap"]);
    }

    #[test]
    fn composites_are_appended_per_record() {
        let composites = vec![CompositeDefinition::new(
            "valuation_z",
            "Valuation Z-Score",
            Category::Valuation,
            &["a_z", "b_z"],
        )];
        let mut record = EntityRecord::new(Entity::new("Healthcare", "HLTHCWD", None));
        record.push_metric("a_z", Some(dec!(1))).unwrap();
        record.push_metric("b_z", Some(dec!(2))).unwrap();

        let records =
            apply_composites(vec![record], &composites, CompositeNullPolicy::SkipNull).unwrap();
        assert_eq!(records[0].composite("valuation_z"), Some(dec!(1.5)));
    }
}
