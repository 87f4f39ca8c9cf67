pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Category, CompositeNullPolicy, Direction, Frequency, TickerVariant};
pub use error::CoreError;
pub use structs::{
    level_ticker, CompositeDefinition, Entity, EntityRecord, MetricDefinition, Observation,
    TrendIndicator, Window,
};
