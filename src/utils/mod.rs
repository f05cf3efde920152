//! Shared utilities and error types

pub mod error;

pub use error::{Result, StrixError};
