use crate::plan::WindowRole;
use chrono::{DateTime, Utc};
use core_types::EntityRecord;
use serde::Serialize;
use uuid::Uuid;

/// A metric query that failed without aborting the snapshot. The affected
/// column is null for every entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricWarning {
    pub metric: String,
    pub window: WindowRole,
    pub reason: String,
}

/// One complete run of the aggregation pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub as_of: DateTime<Utc>,
    /// One record per entity, in entity order.
    pub records: Vec<EntityRecord>,
    pub warnings: Vec<MetricWarning>,
}

impl Snapshot {
    pub fn new(records: Vec<EntityRecord>, warnings: Vec<MetricWarning>) -> Self {
        Self {
            id: Uuid::new_v4(),
            as_of: Utc::now(),
            records,
            warnings,
        }
    }

    pub fn record(&self, entity: &str) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.name() == entity)
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
