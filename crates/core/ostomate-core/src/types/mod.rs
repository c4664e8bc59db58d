//! Core type definitions for ostomate

pub mod annotation;
pub mod entry;
pub mod food;

// Re-export commonly used types
pub use annotation::*;
pub use entry::*;
pub use food::*;
