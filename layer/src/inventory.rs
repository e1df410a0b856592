//! In-memory device source
//!
//! Backs the enumeration filter with a fixed list of device properties,
//! for example one saved to JSON from a real machine.

use crate::{DeviceSource, SourceError};
use anyhow::{Context, Result};
use devsel_shared::{DeviceHandle, DeviceProperties};
use std::path::Path;

/// Fixed device list. Handle `n` refers to the `n`-th device, counting from 1.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    devices: Vec<DeviceProperties>,
}

impl Inventory {
    pub fn new(devices: Vec<DeviceProperties>) -> Self {
        Self { devices }
    }

    /// Parse a JSON array of device properties
    pub fn from_json(json: &str) -> Result<Self> {
        let devices: Vec<DeviceProperties> =
            serde_json::from_str(json).context("Invalid device inventory JSON")?;
        Ok(Self::new(devices))
    }

    /// Load a JSON inventory file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl DeviceSource for Inventory {
    fn enumerate_devices(&self, buffer: Option<&mut [DeviceHandle]>) -> Result<u32, SourceError> {
        let handles = (1..=self.devices.len()).map(DeviceHandle);

        match buffer {
            None => Ok(self.devices.len() as u32),
            Some(buffer) => {
                let mut written = 0;
                for (slot, handle) in buffer.iter_mut().zip(handles) {
                    *slot = handle;
                    written += 1;
                }
                Ok(written)
            }
        }
    }

    fn device_properties(&self, device: DeviceHandle) -> DeviceProperties {
        device
            .0
            .checked_sub(1)
            .and_then(|i| self.devices.get(i))
            .cloned()
            .unwrap_or_default()
    }
}
