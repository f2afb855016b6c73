//! Shared infrastructure: error types and logging.

pub mod error;
pub mod logging;
