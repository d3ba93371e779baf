//! # Legacy Work Import Common Library
//!
//! Shared code for the import tools including:
//! - Error types
//! - Configuration loading and path resolution
//! - Log level handling and tracing setup
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
pub use logging::LogLevel;
