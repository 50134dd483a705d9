//! Common types, errors, and utilities shared by the Olympus judge services.

pub mod error;
pub mod types;

pub use error::{AppError, AppResult};
pub use types::*;
