use crate::plan::WindowRole;
use core_types::{CoreError, Entity, EntityRecord, MetricDefinition, Observation, TickerVariant};

/// The immutable result of one query, ready to be joined onto the records.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFrame {
    pub key: String,
    pub role: WindowRole,
    pub variant: TickerVariant,
    pub observation: Observation,
}

impl MetricFrame {
    /// A frame carrying no values; joining it leaves the column null everywhere.
    pub fn null(key: &str, role: WindowRole, variant: TickerVariant) -> Self {
        Self {
            key: key.to_string(),
            role,
            variant,
            observation: Observation::default(),
        }
    }

    /// Left-join lookup: the value for `entity`, or null when the entity lacks the
    /// variant or the ticker is not in the result.
    pub fn value_for(&self, entity: &Entity) -> Option<rust_decimal::Decimal> {
        entity
            .ticker(self.variant)
            .and_then(|ticker| self.observation.value_for(ticker))
            .flatten()
    }

    /// How many entities this frame has a row for, null or not.
    pub fn matched(&self, entities: &[Entity]) -> usize {
        entities
            .iter()
            .filter(|e| {
                e.ticker(self.variant)
                    .is_some_and(|t| self.observation.value_for(t).is_some())
            })
            .count()
    }
}

/// Joins one frame onto every record, returning the extended records.
pub fn merge_frame(
    records: Vec<EntityRecord>,
    frame: &MetricFrame,
) -> Result<Vec<EntityRecord>, CoreError> {
    records
        .into_iter()
        .map(|mut record| {
            let value = frame.value_for(&record.entity);
            match frame.role {
                WindowRole::Current => record.push_metric(&frame.key, value)?,
                WindowRole::Reference => record.push_reference(&frame.key, value)?,
            }
            Ok(record)
        })
        .collect()
}

/// Folds all frames onto fresh records, one per entity in entity order. Any
/// catalog metric without a frame still receives a null column.
pub fn fold_frames(
    entities: &[Entity],
    metrics: &[MetricDefinition],
    frames: &[MetricFrame],
) -> Result<Vec<EntityRecord>, CoreError> {
    let seed: Vec<EntityRecord> = entities.iter().cloned().map(EntityRecord::new).collect();
    let records = frames.iter().try_fold(seed, merge_frame)?;
    fill_missing(records, metrics)
}

fn fill_missing(
    records: Vec<EntityRecord>,
    metrics: &[MetricDefinition],
) -> Result<Vec<EntityRecord>, CoreError> {
    records
        .into_iter()
        .map(|mut record| {
            for metric in metrics {
                if !record.has_metric(&metric.key) {
                    record.push_metric(&metric.key, None)?;
                }
            }
            Ok(record)
        })
        .collect()
}
