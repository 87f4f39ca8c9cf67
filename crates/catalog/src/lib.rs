//! # Sector Catalog
//!
//! The static inputs of a snapshot: which sectors are tracked (`EntityRegistry`),
//! which metrics are queried for them (`MetricCatalog`) and how the resulting
//! fields are laid out in the final report (`ReportColumn`).
//!
//! Both tables are validated on construction. A failure here is a configuration
//! error and must stop the process before any query is sent.

pub mod entities;
pub mod error;
pub mod layout;
pub mod metrics;

pub use entities::EntityRegistry;
pub use error::CatalogError;
pub use layout::{ReportColumn, ReportField};
pub use metrics::MetricCatalog;
