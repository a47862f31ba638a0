use thiserror::Error;

// Failures of the flight/passenger inventory. None of them leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InventoryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No seats available: {0}")]
    Capacity(String),

    #[error("Flight is locked: {0}")]
    Locked(String),

    #[error("Nothing to do: {0}")]
    NoOp(String),

    // Reference tables are missing an entry the catalog relies on
    #[error("Configuration error: {0}")]
    Configuration(String),
}
