//! Device type definitions
//!
//! These types describe physical devices as reported by the underlying
//! enumeration source. Handles are opaque and copied through verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor identifier (PCI vendor ID for most drivers)
pub type VendorId = u32;

/// Device identifier within a vendor
pub type DeviceId = u32;

/// Opaque identifier for one physical device.
///
/// Layout-compatible with a dispatchable Vulkan handle so caller buffers can
/// be viewed as `[DeviceHandle]` without copying.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceHandle(pub usize);

impl DeviceHandle {
    /// The null handle
    pub const NULL: DeviceHandle = DeviceHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Device classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    #[default]
    Other,
    IntegratedGpu,
    DiscreteGpu,
    VirtualGpu,
    Cpu,
}

impl DeviceType {
    /// Map a raw `VkPhysicalDeviceType` value. Values outside the core range
    /// are reported as `Other`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => DeviceType::IntegratedGpu,
            2 => DeviceType::DiscreteGpu,
            3 => DeviceType::VirtualGpu,
            4 => DeviceType::Cpu,
            _ => DeviceType::Other,
        }
    }

    /// Human-readable label used in device listings
    pub fn label(self) -> &'static str {
        match self {
            DeviceType::Other => "other",
            DeviceType::IntegratedGpu => "integrated GPU",
            DeviceType::DiscreteGpu => "discrete GPU",
            DeviceType::VirtualGpu => "virtual GPU",
            DeviceType::Cpu => "CPU",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the properties this layer cares about.
///
/// Never cached: queried again for every candidate on every enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceProperties {
    #[serde(default)]
    pub device_type: DeviceType,

    pub vendor_id: VendorId,

    pub device_id: DeviceId,

    /// Display name reported by the driver
    #[serde(default)]
    pub name: String,
}

impl DeviceProperties {
    /// Whether this device carries exactly the given identifier pair
    pub fn matches(&self, vendor_id: VendorId, device_id: DeviceId) -> bool {
        self.vendor_id == vendor_id && self.device_id == device_id
    }
}

/// One line of a device listing (index is 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceListing {
    pub index: usize,
    pub properties: DeviceProperties,
}

impl fmt::Display for DeviceListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  GPU {}: {:x}:{:x} \"{}\" {}",
            self.index,
            self.properties.vendor_id,
            self.properties.device_id,
            self.properties.name,
            self.properties.device_type
        )
    }
}
