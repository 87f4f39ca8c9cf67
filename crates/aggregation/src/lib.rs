//! # Sector Monitor Aggregation Engine
//!
//! This crate turns a metric catalog and a list of entities into a `Snapshot`: one
//! record per entity holding every metric, trend indicator and composite score.
//!
//! ## Architectural Principles
//!
//! - **Client Agnostic:** All data access goes through the `TimeSeriesClient` trait
//!   from `api-client`. The engine never knows whether it talks to Datastream or a mock.
//! - **Immutable Fold:** Each query produces an independent `MetricFrame`. Frames are
//!   folded onto the records in catalog order, so results never depend on which
//!   query finished first.
//! - **Degrade, Don't Fail:** A metric that times out or errors becomes a null column
//!   plus a `MetricWarning`. Only systemic failures (service unreachable, bad
//!   credentials) abort a snapshot.
//!
//! ## Public API
//!
//! - `AggregationEngine`: Plans, executes and folds the queries.
//! - `Snapshot`: The assembled records and any warnings.
//! - `AggregationError`: The specific error types that can be returned from this crate.

pub mod derived;
pub mod engine;
pub mod error;
pub mod frame;
pub mod plan;
pub mod snapshot;

pub use derived::composite_mean;
pub use engine::{AggregationEngine, EngineSettings};
pub use error::AggregationError;
pub use frame::MetricFrame;
pub use plan::{PlannedQuery, WindowRole};
pub use snapshot::{MetricWarning, Snapshot};
