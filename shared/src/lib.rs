//! Shared types for devsel
//!
//! This crate contains the device data model and the selector parser used by
//! the Vulkan layer and by the offline `devsel` tool.

pub mod selector;
pub mod types;

// Re-export commonly used types
pub use selector::{ConfigParseError, SelectionPolicy};
pub use types::device::*;
