//! Vulkan device selection layer
//!
//! Intercepts physical device enumeration and hides or reorders devices
//! according to a selector string read from the environment.

pub mod config;
pub mod dispatch;
pub mod filter;
pub mod inventory;
pub mod process;
pub mod registry;
pub mod vulkan;

pub use config::{EnvSelector, FixedSelector, LayerConfig, SelectorSource};
pub use filter::{enumerate, EnumerationError, EnumerationOutcome};
pub use registry::{ContextKey, ContextRecord, ContextRegistry, RegistryError};

use devsel_shared::{DeviceHandle, DeviceProperties};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Failure reported by the underlying device source, carried as its raw
/// `VkResult` code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("device enumeration failed with VkResult {0}")]
pub struct SourceError(pub i32);

/// Underlying device source
pub trait DeviceSource {
    /// Two-phase enumeration. With `None`, return the number of devices.
    /// With a buffer, fill at most `buffer.len()` handles and return how many
    /// were written.
    fn enumerate_devices(&self, buffer: Option<&mut [DeviceHandle]>) -> Result<u32, SourceError>;

    /// Query the properties of one device
    fn device_properties(&self, device: DeviceHandle) -> DeviceProperties;
}

/// Install a stderr subscriber unless the host already has one.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
