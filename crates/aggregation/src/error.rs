use api_client::error::ApiError;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregationError {
    /// The time-series service cannot be used at all; no snapshot is produced.
    #[error("Transport failure, snapshot aborted: {0}")]
    Transport(#[from] ApiError),

    #[error("Failed to assemble entity records: {0}")]
    Record(#[from] CoreError),

    #[error("Cannot build a snapshot without entities")]
    NoEntities,

    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),
}
