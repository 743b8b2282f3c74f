use crate::document::ElementId;
use crate::registry::DatasetKind;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum ClimvizError {
    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),
    #[error("Dataset '{0}' is already registered")]
    DuplicateDataset(String),
    #[error("Dataset '{id}' holds {actual} data, expected {expected}")]
    DatasetKind {
        id: String,
        expected: DatasetKind,
        actual: DatasetKind,
    },
    #[error("Failed to parse dataset '{id}': {source}")]
    Json {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    /// The display text doubles as the notice shown to the user.
    #[error("Please select at least {minimum} items (got {attempted})")]
    SelectionTooSmall { minimum: usize, attempted: usize },
    #[error("'{value}' is not an available {control} option")]
    UnknownOption { control: String, value: String },
    #[error("{chart} does not accept {input} input")]
    InvalidInput { chart: String, input: String },
    #[error("No element {0} in the document")]
    UnknownElement(ElementId),
    #[error("No render root {0} in the document")]
    UnknownRoot(u64),
    #[error("Chart '{0}' has not been mounted")]
    NotMounted(String),
}

/// Convenience type for `Result<T, ClimvizError>`.
pub type ClimvizResult<T> = Result<T, ClimvizError>;
