use thiserror::Error;

/// Inconsistencies in the static registry or catalog. All of them are fatal and
/// are raised before any query is issued.
#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("Duplicate entity name: {0}")]
    DuplicateEntity(String),

    #[error("Ticker '{ticker}' is used by both '{first}' and '{second}'")]
    DuplicateTicker {
        ticker: String,
        first: String,
        second: String,
    },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Duplicate metric key: {0}")]
    DuplicateMetric(String),

    #[error("Malformed catalog entry '{key}': {reason}")]
    Malformed { key: String, reason: String },

    #[error("Metric '{0}' is declared outside its category's block")]
    CategoryOutOfOrder(String),

    #[error("Composite '{composite}' refers to unknown metric '{input}'")]
    UnknownCompositeInput { composite: String, input: String },

    #[error("Report layout refers to unknown field '{0}'")]
    UnknownLayoutField(String),
}
