use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Column '{column}' already exists on the record for '{entity}'")]
    DuplicateColumn { entity: String, column: String },
}
