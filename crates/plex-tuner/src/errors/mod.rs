//! Centralized error handling for the tuner core.
//!
//! Mirrors the project's existing split between error *types* (`types.rs`) and the
//! convenience aliases re-exported here, so call sites only need `crate::errors::{AppError,
//! AppResult}`.

pub mod types;

pub use types::AppError;

/// Convenience type alias for Results using `AppError`.
pub type AppResult<T> = Result<T, AppError>;
