//! # Sector Monitor Report
//!
//! Turns the entity-major records of a snapshot into the metric-major table that
//! is shown to the user: one row per layout column, one column per entity.
//!
//! This is a pure projection. Cells carry structured values (`Empty`, `Number`,
//! `Trend`); number formatting, arrows and colors belong to whoever renders the
//! table.

pub mod assembler;
pub mod error;

pub use assembler::{assemble, Cell, ReportRow, ReportTable};
pub use error::ReportError;
