//! Per-instance record of the next layer's entry points

use crate::vulkan::bindings::{
    PFN_GetPhysicalDeviceProcAddr, PFN_vkDestroyInstance, PFN_vkEnumeratePhysicalDevices,
    PFN_vkGetInstanceProcAddr, PFN_vkGetPhysicalDeviceProperties, VkInstance,
};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

/// Identity of a context handle. Never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextKey(usize);

impl ContextKey {
    pub fn from_instance(instance: VkInstance) -> Self {
        Self(instance as usize)
    }
}

impl std::fmt::Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Forwarding entry points captured when an instance was created
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextRecord {
    pub destroy_instance: PFN_vkDestroyInstance,
    pub enumerate_physical_devices: PFN_vkEnumeratePhysicalDevices,
    pub get_instance_proc_addr: PFN_vkGetInstanceProcAddr,
    pub get_physical_device_proc_addr: PFN_GetPhysicalDeviceProcAddr,
    pub get_physical_device_properties: PFN_vkGetPhysicalDeviceProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The handle was never created through this layer, or was already destroyed
    #[error("context {0} is not registered with this layer")]
    UnknownContext(ContextKey),
}

/// Registry of live contexts. Thread-safe.
///
/// The lock is never held while calling into the next layer, so nested calls
/// made by the driver during creation or destruction cannot deadlock.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    records: RwLock<HashMap<ContextKey, ContextRecord>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the record for a handle
    pub fn register(&self, key: ContextKey, record: ContextRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.insert(key, record).is_some() {
            debug!("Replaced existing record for context {}", key);
        }
    }

    /// Look up the record for a handle
    pub fn lookup(&self, key: ContextKey) -> Result<ContextRecord, RegistryError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&key)
            .copied()
            .ok_or(RegistryError::UnknownContext(key))
    }

    /// Remove the record for a handle, returning it
    pub fn remove(&self, key: ContextKey) -> Result<ContextRecord, RegistryError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records
            .remove(&key)
            .ok_or(RegistryError::UnknownContext(key))
    }

    /// Number of live contexts
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
