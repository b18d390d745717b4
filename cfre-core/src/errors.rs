use crate::storage::StorageError;
use thiserror::Error;

/// Error type for invalid calculations.
///
/// Unresolved factors and baselines are deliberately not errors: they are
/// soft failures recorded as warnings on the result so a partially-resolved
/// calculation still returns a total.
#[derive(Error, Debug)]
pub enum CfreError {
    #[error("ingredient '{name}' has invalid weight {weight} g")]
    InvalidWeight { name: String, weight: f64 },
    #[error("ingredient '{name}' has waste rate {rate}, expected a value in [0, 1)")]
    InvalidWasteRate { name: String, rate: f64 },
    #[error("{0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Convenience type for `Result<T, CfreError>`.
pub type CfreResult<T> = Result<T, CfreError>;
