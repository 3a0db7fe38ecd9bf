//! Convenience result type alias for DANI.

use crate::error::AppError;

/// A specialized `Result` type for DANI operations.
pub type AppResult<T> = Result<T, AppError>;
