use crate::derived::{apply_composites, apply_trends};
use crate::error::AggregationError;
use crate::frame::{fold_frames, MetricFrame};
use crate::plan::{plan_queries, PlannedQuery};
use crate::snapshot::{MetricWarning, Snapshot};
use api_client::error::ApiError;
use api_client::TimeSeriesClient;
use catalog::MetricCatalog;
use configuration::SnapshotConfig;
use core_types::{CompositeNullPolicy, Entity, Window};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The knobs of one snapshot build. Usually derived from [`SnapshotConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub max_concurrency: usize,
    pub query_timeout: Duration,
    pub reference_offset_days: u32,
    pub null_policy: CompositeNullPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 6,
            query_timeout: Duration::from_secs(20),
            reference_offset_days: 90,
            null_policy: CompositeNullPolicy::default(),
        }
    }
}

impl From<&SnapshotConfig> for EngineSettings {
    fn from(config: &SnapshotConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            query_timeout: config.query_timeout,
            reference_offset_days: config.reference_offset_days,
            null_policy: config.composite_null_policy,
        }
    }
}

impl EngineSettings {
    fn validate(&self) -> Result<(), AggregationError> {
        if self.max_concurrency == 0 {
            return Err(AggregationError::InvalidSettings(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.query_timeout.is_zero() {
            return Err(AggregationError::InvalidSettings(
                "query_timeout must be greater than zero".to_string(),
            ));
        }
        if self.reference_offset_days == 0 {
            return Err(AggregationError::InvalidSettings(
                "reference_offset_days must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a single planned query: the frame to merge, plus a warning when
/// the frame had to be nulled.
type QueryOutcome = (MetricFrame, Option<MetricWarning>);

/// Builds snapshots by fanning the catalog out over a `TimeSeriesClient`,
/// joining the results onto one record per entity and deriving trends and
/// composites.
///
/// The engine holds no per-snapshot state; every call to
/// [`AggregationEngine::build_snapshot`] is independent.
pub struct AggregationEngine {
    client: Arc<dyn TimeSeriesClient>,
    settings: EngineSettings,
}

impl AggregationEngine {
    pub fn new(client: Arc<dyn TimeSeriesClient>, settings: EngineSettings) -> Self {
        Self { client, settings }
    }

    /// Runs every catalog query for `entities` and assembles the snapshot.
    ///
    /// Metric-level failures (timeouts, provider faults, empty results) null the
    /// affected column and are reported in `Snapshot::warnings`. A systemic
    /// failure aborts the whole build with `AggregationError::Transport`.
    pub async fn build_snapshot(
        &self,
        entities: &[Entity],
        catalog: &MetricCatalog,
    ) -> Result<Snapshot, AggregationError> {
        if entities.is_empty() {
            return Err(AggregationError::NoEntities);
        }
        self.settings.validate()?;

        self.client.connect().await.map_err(|e| {
            error!(error = %e, "Could not establish a session with the time-series service");
            AggregationError::Transport(e)
        })?;

        let metrics = catalog.list_metrics();
        let reference = Window::days_ago(self.settings.reference_offset_days);
        let planned = plan_queries(entities, metrics, reference);
        info!(
            entities = entities.len(),
            queries = planned.len(),
            concurrency = self.settings.max_concurrency,
            "Building snapshot"
        );

        // `buffered` yields in submission order, so the fold below is deterministic
        // regardless of which query finishes first.
        let outcomes: Vec<QueryOutcome> = stream::iter(planned.iter().map(|q| self.run_query(q, entities)))
            .buffered(self.settings.max_concurrency)
            .try_collect()
            .await?;

        let (frames, warnings): (Vec<MetricFrame>, Vec<Option<MetricWarning>>) =
            outcomes.into_iter().unzip();
        let warnings: Vec<MetricWarning> = warnings.into_iter().flatten().collect();

        let records = fold_frames(entities, metrics, &frames)?;
        let records = apply_trends(records, metrics)?;
        let records = apply_composites(records, catalog.composites(), self.settings.null_policy)?;

        let snapshot = Snapshot::new(records, warnings);
        info!(
            snapshot_id = %snapshot.id,
            records = snapshot.records.len(),
            warnings = snapshot.warnings.len(),
            "Snapshot complete"
        );
        Ok(snapshot)
    }

    async fn run_query(
        &self,
        query: &PlannedQuery,
        entities: &[Entity],
    ) -> Result<QueryOutcome, AggregationError> {
        if query.request.tickers.is_empty() {
            return Ok(degraded(
                query,
                format!("no entity has a {} ticker", query.variant),
            ));
        }

        let result = tokio::time::timeout(self.settings.query_timeout, self.client.query(&query.request)).await;

        match result {
            Err(_) => {
                let err = ApiError::Timeout(format!("no response within {:?}", self.settings.query_timeout));
                Ok(degraded(query, err.to_string()))
            }
            Ok(Err(err)) if err.is_systemic() => {
                error!(metric = %query.key, error = %err, "Systemic failure, aborting snapshot");
                Err(AggregationError::Transport(err))
            }
            Ok(Err(err)) => Ok(degraded(query, err.to_string())),
            Ok(Ok(observation)) if observation.is_empty() => {
                Ok(degraded(query, ApiError::EmptyResult.to_string()))
            }
            Ok(Ok(observation)) => {
                let frame = MetricFrame {
                    key: query.key.clone(),
                    role: query.role,
                    variant: query.variant,
                    observation,
                };
                debug!(
                    metric = %frame.key,
                    window = ?frame.role,
                    matched = frame.matched(entities),
                    "Query complete"
                );
                Ok((frame, None))
            }
        }
    }
}

fn degraded(query: &PlannedQuery, reason: String) -> QueryOutcome {
    warn!(metric = %query.key, window = ?query.role, %reason, "Metric degraded to null");
    let warning = MetricWarning {
        metric: query.key.clone(),
        window: query.role,
        reason,
    };
    (MetricFrame::null(&query.key, query.role, query.variant), Some(warning))
}
