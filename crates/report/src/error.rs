use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    /// The layout names a field the records were never given. This means the
    /// records were built from a different catalog than the layout.
    #[error("Record '{entity}' has no {kind} field '{key}'")]
    MissingField {
        entity: String,
        kind: &'static str,
        key: String,
    },
}
