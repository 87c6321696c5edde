//! Convenience result type alias for CmsDash.

use crate::error::AppError;

/// A specialized `Result` type for CmsDash operations.
pub type AppResult<T> = Result<T, AppError>;
