use crate::enums::{Category, Direction, Frequency, TickerVariant};
use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Prefix the provider uses to address the level series of an index.
const LEVEL_PREFIX: &str = "G#L";

/// Derives the level-variant ticker from a primary ticker.
pub fn level_ticker(primary: &str) -> String {
    format!("{LEVEL_PREFIX}{primary}")
}

/// A tracked sector and the identifiers used to query it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub primary_ticker: String,
    pub level_ticker: String,
    pub estimate_ticker: Option<String>,
}

impl Entity {
    pub fn new(name: &str, primary_ticker: &str, estimate_ticker: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            primary_ticker: primary_ticker.to_string(),
            level_ticker: level_ticker(primary_ticker),
            estimate_ticker: estimate_ticker.map(str::to_string),
        }
    }

    /// Returns the ticker for the requested variant, if the entity has one.
    pub fn ticker(&self, variant: TickerVariant) -> Option<&str> {
        match variant {
            TickerVariant::Primary => Some(&self.primary_ticker),
            TickerVariant::Level => Some(&self.level_ticker),
            TickerVariant::Estimate => self.estimate_ticker.as_deref(),
        }
    }
}

/// A single named query in the metric catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub key: String,
    pub label: String,
    pub category: Category,
    /// Opaque expression handed to the time-series provider as-is.
    pub query_expression: String,
    pub frequency: Frequency,
    pub ticker_variant: TickerVariant,
    /// When set, the metric is also fetched at the reference window for a trend indicator.
    pub has_trend_reference: bool,
}

impl MetricDefinition {
    /// A daily metric on the primary ticker without a trend reference.
    pub fn new(key: &str, label: &str, category: Category, query_expression: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            category,
            query_expression: query_expression.to_string(),
            frequency: Frequency::Daily,
            ticker_variant: TickerVariant::Primary,
            has_trend_reference: false,
        }
    }

    pub fn monthly(mut self) -> Self {
        self.frequency = Frequency::Monthly;
        self
    }

    pub fn on(mut self, variant: TickerVariant) -> Self {
        self.ticker_variant = variant;
        self
    }

    pub fn with_trend(mut self) -> Self {
        self.has_trend_reference = true;
        self
    }
}

/// A derived metric averaging several z-score metrics of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeDefinition {
    pub key: String,
    pub label: String,
    pub category: Category,
    pub inputs: Vec<String>,
}

impl CompositeDefinition {
    pub fn new(key: &str, label: &str, category: Category, inputs: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            category,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A query window as signed day offsets relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start_offset_days: i32,
    pub end_offset_days: i32,
}

impl Window {
    /// Today's single-day window.
    pub fn current() -> Self {
        Self::days_ago(0)
    }

    /// A single-day window `days` calendar days before today.
    pub fn days_ago(days: u32) -> Self {
        let offset = -(days as i32);
        Self {
            start_offset_days: offset,
            end_offset_days: offset,
        }
    }

    pub fn start_param(&self) -> String {
        format_offset(self.start_offset_days)
    }

    pub fn end_param(&self) -> String {
        format_offset(self.end_offset_days)
    }
}

fn format_offset(days: i32) -> String {
    format!("{days}D")
}

/// Values returned by one query, keyed by instrument ticker in provider order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub values: Vec<(String, Option<Decimal>)>,
}

impl Observation {
    pub fn new(values: Vec<(String, Option<Decimal>)>) -> Self {
        Self { values }
    }

    /// Looks up a ticker. The outer `None` means the ticker is absent from the result;
    /// if the provider repeats a ticker the first occurrence wins.
    pub fn value_for(&self, ticker: &str) -> Option<Option<Decimal>> {
        self.values
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// A metric's current value compared with its reference-window value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendIndicator {
    pub value: Decimal,
    pub reference: Decimal,
    pub direction: Direction,
}

impl TrendIndicator {
    /// Null when either side is missing; never defaults to a direction.
    pub fn compare(current: Option<Decimal>, reference: Option<Decimal>) -> Option<Self> {
        let (value, reference) = (current?, reference?);
        Some(Self {
            value,
            reference,
            direction: Direction::between(&value, &reference),
        })
    }
}

/// The per-entity row of a snapshot. Columns are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity: Entity,
    metrics: Vec<(String, Option<Decimal>)>,
    references: Vec<(String, Option<Decimal>)>,
    trends: Vec<(String, Option<TrendIndicator>)>,
    composites: Vec<(String, Option<Decimal>)>,
}

impl EntityRecord {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            metrics: Vec::new(),
            references: Vec::new(),
            trends: Vec::new(),
            composites: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }

    pub fn push_metric(&mut self, key: &str, value: Option<Decimal>) -> Result<(), CoreError> {
        push_column(&mut self.metrics, &self.entity.name, key, value)
    }

    pub fn push_reference(&mut self, key: &str, value: Option<Decimal>) -> Result<(), CoreError> {
        push_column(&mut self.references, &self.entity.name, key, value)
    }

    pub fn push_trend(
        &mut self,
        key: &str,
        value: Option<TrendIndicator>,
    ) -> Result<(), CoreError> {
        push_column(&mut self.trends, &self.entity.name, key, value)
    }

    pub fn push_composite(&mut self, key: &str, value: Option<Decimal>) -> Result<(), CoreError> {
        push_column(&mut self.composites, &self.entity.name, key, value)
    }

    /// The current value of a metric; `None` for a null cell or an unknown key.
    pub fn metric(&self, key: &str) -> Option<Decimal> {
        lookup(&self.metrics, key).flatten()
    }

    pub fn has_metric(&self, key: &str) -> bool {
        lookup(&self.metrics, key).is_some()
    }

    pub fn reference(&self, key: &str) -> Option<Decimal> {
        lookup(&self.references, key).flatten()
    }

    pub fn trend(&self, key: &str) -> Option<TrendIndicator> {
        lookup(&self.trends, key).flatten()
    }

    pub fn composite(&self, key: &str) -> Option<Decimal> {
        lookup(&self.composites, key).flatten()
    }

    pub fn has_composite(&self, key: &str) -> bool {
        lookup(&self.composites, key).is_some()
    }

    /// Metric column keys in insertion order.
    pub fn metric_keys(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|(k, _)| k.as_str())
    }

    pub fn trend_keys(&self) -> impl Iterator<Item = &str> {
        self.trends.iter().map(|(k, _)| k.as_str())
    }
}

fn push_column<T>(
    columns: &mut Vec<(String, T)>,
    entity: &str,
    key: &str,
    value: T,
) -> Result<(), CoreError> {
    if columns.iter().any(|(k, _)| k == key) {
        return Err(CoreError::DuplicateColumn {
            entity: entity.to_string(),
            column: key.to_string(),
        });
    }
    columns.push((key.to_string(), value));
    Ok(())
}

fn lookup<T: Copy>(columns: &[(String, T)], key: &str) -> Option<T> {
    columns.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn level_ticker_applies_prefix() {
        assert_eq!(level_ticker("TECNOWD"), "G#LTECNOWD");
        let entity = Entity::new("Technology", "TECNOWD", None);
        assert_eq!(entity.ticker(TickerVariant::Level), Some("G#LTECNOWD"));
        assert_eq!(entity.ticker(TickerVariant::Estimate), None);
    }

    #[test]
    fn window_offsets_render_as_day_counts() {
        assert_eq!(Window::current().start_param(), "0D");
        let reference = Window::days_ago(90);
        assert_eq!(reference.start_param(), "-90D");
        assert_eq!(reference.end_param(), "-90D");
    }

    #[test]
    fn trend_is_null_when_either_side_is_missing() {
        assert_eq!(TrendIndicator::compare(None, Some(dec!(1))), None);
        assert_eq!(TrendIndicator::compare(Some(dec!(1)), None), None);

        let flat = TrendIndicator::compare(Some(dec!(1.5)), Some(dec!(1.5))).unwrap();
        assert_eq!(flat.direction, Direction::Down);
        let rising = TrendIndicator::compare(Some(dec!(1.6)), Some(dec!(1.5))).unwrap();
        assert_eq!(rising.direction, Direction::Up);
    }

    #[test]
    fn record_columns_are_append_only() {
        let mut record = EntityRecord::new(Entity::new("Energy", "ENEGYWD", None));
        record.push_metric("rsi_14", Some(dec!(55))).unwrap();
        record.push_metric("beta_5y", None).unwrap();

        let err = record.push_metric("rsi_14", Some(dec!(60))).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateColumn { .. }));
        assert_eq!(record.metric("rsi_14"), Some(dec!(55)));

        assert!(record.has_metric("beta_5y"));
        assert_eq!(record.metric("beta_5y"), None);
        assert!(!record.has_metric("unknown"));
        assert_eq!(record.metric_keys().collect::<Vec<_>>(), vec!["rsi_14", "beta_5y"]);
    }

    #[test]
    fn observation_keeps_first_duplicate() {
        let obs = Observation::new(vec![
            ("A".to_string(), Some(dec!(1))),
            ("A".to_string(), Some(dec!(2))),
            ("B".to_string(), None),
        ]);
        assert_eq!(obs.value_for("A"), Some(Some(dec!(1))));
        assert_eq!(obs.value_for("B"), Some(None));
        assert_eq!(obs.value_for("C"), None);
    }
}
