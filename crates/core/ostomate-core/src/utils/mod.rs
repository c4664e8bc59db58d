//! Utility functions and helpers

pub mod logger;
pub mod serde_helpers;

pub use self::logger::{init_logging, Logger};
pub use self::serde_helpers::null_as_default;
