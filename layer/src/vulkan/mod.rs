//! Vulkan loader integration

pub mod bindings;
pub mod entry;
pub mod layer;
pub mod source;

pub use layer::DeviceSelectLayer;
pub use source::VulkanSource;
