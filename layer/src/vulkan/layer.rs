//! The device selection layer
//!
//! Owns the context registry and the injectable hooks, and implements the
//! intercepted Vulkan commands on top of raw loader pointers.

use super::bindings::*;
use super::source::VulkanSource;
use crate::config::{EnvSelector, LayerConfig, SelectorSource};
use crate::dispatch::{InterceptedCall, ProcAddr};
use crate::filter::{self, EnumerationError, EnumerationOutcome};
use crate::process::{ProcessControl, StdProcess};
use crate::registry::{ContextKey, ContextRecord, ContextRegistry, RegistryError};
use crate::SourceError;
use devsel_shared::DeviceHandle;
use libc::c_char;
use std::ffi::CStr;
use std::mem::transmute;
use std::ptr;
use tracing::{debug, error, info};

pub struct DeviceSelectLayer {
    registry: ContextRegistry,
    selector_var: String,
    selector: Box<dyn SelectorSource>,
    process: Box<dyn ProcessControl>,
}

impl DeviceSelectLayer {
    /// Build a layer with explicit hooks
    pub fn new(
        config: &LayerConfig,
        selector: Box<dyn SelectorSource>,
        process: Box<dyn ProcessControl>,
    ) -> Self {
        Self {
            registry: ContextRegistry::new(),
            selector_var: config.selector_var.clone(),
            selector,
            process,
        }
    }

    /// Build the layer the loader talks to: configuration and selector from
    /// the environment, real process exit.
    pub fn from_env() -> Self {
        let mut config = LayerConfig::default();
        crate::init_tracing(&config.log_filter);

        if let Err(e) = config.validate() {
            error!("{:#}; falling back to defaults", e);
            config.selector_var = crate::config::DEFAULT_SELECTOR_VAR.to_string();
        }
        info!(
            "devsel layer loaded: {}",
            serde_json::to_string(&config).unwrap_or_default()
        );

        let selector = Box::new(EnvSelector::new(config.selector_var.clone()));
        Self::new(&config, selector, Box::new(StdProcess))
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// `vkCreateInstance`
    ///
    /// # Safety
    /// Arguments must satisfy the `vkCreateInstance` contract as seen by a
    /// layer, including a loader link-info element in the `pNext` chain.
    pub unsafe fn create_instance(
        &self,
        create_info: *const VkInstanceCreateInfo,
        allocator: *const VkAllocationCallbacks,
        instance_out: *mut VkInstance,
    ) -> VkResult {
        let Some(chain_info) = find_link_info(create_info) else {
            error!("vkCreateInstance called without loader link info");
            return VK_ERROR_INITIALIZATION_FAILED;
        };

        let link = (*chain_info).pLayerInfo;
        if link.is_null() {
            error!("Loader link info has no next layer");
            return VK_ERROR_INITIALIZATION_FAILED;
        }

        let Some(next_gipa) = (*link).pfnNextGetInstanceProcAddr else {
            return VK_ERROR_INITIALIZATION_FAILED;
        };
        let next_gpdpa = (*link).pfnNextGetPhysicalDeviceProcAddr;

        let create = transmute::<PFN_vkVoidFunction, PFN_vkCreateInstance>(next_gipa(
            ptr::null_mut(),
            InterceptedCall::CreateInstance.name().as_ptr(),
        ));
        let Some(create) = create else {
            error!("Next layer does not provide vkCreateInstance");
            return VK_ERROR_INITIALIZATION_FAILED;
        };

        // Advance the chain for the next layer before delegating
        (*chain_info).pLayerInfo = (*link).pNext;

        let result = create(create_info, allocator, instance_out);
        if result != VK_SUCCESS {
            debug!("Next vkCreateInstance failed: {}", result);
            return result;
        }

        let instance = *instance_out;
        let resolve = |name: &CStr| next_gipa(instance, name.as_ptr());
        let record = ContextRecord {
            destroy_instance: transmute::<PFN_vkVoidFunction, PFN_vkDestroyInstance>(resolve(
                c"vkDestroyInstance",
            )),
            enumerate_physical_devices: transmute::<
                PFN_vkVoidFunction,
                PFN_vkEnumeratePhysicalDevices,
            >(resolve(c"vkEnumeratePhysicalDevices")),
            get_instance_proc_addr: Some(next_gipa),
            get_physical_device_proc_addr: next_gpdpa,
            get_physical_device_properties: transmute::<
                PFN_vkVoidFunction,
                PFN_vkGetPhysicalDeviceProperties,
            >(resolve(c"vkGetPhysicalDeviceProperties")),
        };

        let key = ContextKey::from_instance(instance);
        self.registry.register(key, record);
        debug!("Registered instance {}", key);

        VK_SUCCESS
    }

    /// `vkDestroyInstance`
    ///
    /// # Safety
    /// `instance` must be null or an instance created through this layer.
    pub unsafe fn destroy_instance(
        &self,
        instance: VkInstance,
        allocator: *const VkAllocationCallbacks,
    ) {
        if instance.is_null() {
            return;
        }

        // The registry lock is released before calling down
        let record = self
            .registry
            .remove(ContextKey::from_instance(instance))
            .unwrap_or_else(|e| fatal(&e));

        if let Some(destroy) = record.destroy_instance {
            destroy(instance, allocator);
        }
    }

    /// `vkEnumeratePhysicalDevices`
    ///
    /// # Safety
    /// `instance` must have been created through this layer, `count` must be
    /// valid, and `devices` must be null or valid for `*count` writes.
    pub unsafe fn enumerate_physical_devices(
        &self,
        instance: VkInstance,
        count: *mut u32,
        devices: *mut VkPhysicalDevice,
    ) -> VkResult {
        if count.is_null() {
            error!("vkEnumeratePhysicalDevices called with a null count pointer");
            return VK_ERROR_INITIALIZATION_FAILED;
        }

        let record = self
            .registry
            .lookup(ContextKey::from_instance(instance))
            .unwrap_or_else(|e| fatal(&e));

        let Some(source) = VulkanSource::new(instance, &record) else {
            error!("Next layer is missing physical device entry points");
            return VK_ERROR_INITIALIZATION_FAILED;
        };

        let output: Option<&mut [DeviceHandle]> = if devices.is_null() {
            None
        } else {
            Some(std::slice::from_raw_parts_mut(devices, *count as usize))
        };

        let selector = self.selector.read();
        let (result, reported) =
            self.conclude(filter::enumerate(&source, selector.as_deref(), output));

        if let Some(n) = reported {
            *count = n;
        }
        result
    }

    /// Translate a filter result into a `VkResult` and the count to report,
    /// acting on listing and parse-failure signals.
    pub fn conclude(
        &self,
        result: Result<EnumerationOutcome, EnumerationError>,
    ) -> (VkResult, Option<u32>) {
        match result {
            Ok(EnumerationOutcome::Complete(n)) => (VK_SUCCESS, Some(n)),
            Ok(EnumerationOutcome::Incomplete(n)) => (VK_INCOMPLETE, Some(n)),
            Ok(EnumerationOutcome::ListRequested(listing)) => {
                self.process.diagnostic("selectable devices:");
                for entry in &listing {
                    self.process.diagnostic(&entry.to_string());
                }
                self.process.exit(0);
                // Only reached when the exit hook declines to terminate
                (VK_SUCCESS, Some(0))
            }
            Err(EnumerationError::Config(e)) => {
                self.process.diagnostic(&format!(
                    "failed to parse {}: \"{}\"",
                    self.selector_var, e.raw
                ));
                self.process.exit(1);
                (VK_ERROR_INITIALIZATION_FAILED, None)
            }
            Err(EnumerationError::Source(SourceError(code))) => (code, None),
            Err(EnumerationError::OutOfMemory) => (VK_ERROR_OUT_OF_HOST_MEMORY, None),
        }
    }

    /// Resolve an instance-level command name
    ///
    /// # Safety
    /// `name` must be null or a valid NUL-terminated string.
    pub unsafe fn get_instance_proc_addr(
        &self,
        instance: VkInstance,
        name: *const c_char,
    ) -> ProcAddr {
        if name.is_null() {
            return ProcAddr::Forwarded(None);
        }
        let name = CStr::from_ptr(name);

        if let Some(call) = InterceptedCall::from_name(name) {
            return ProcAddr::Intercepted(call);
        }

        match self.registry.lookup(ContextKey::from_instance(instance)) {
            Ok(record) => ProcAddr::Forwarded(
                record
                    .get_instance_proc_addr
                    .and_then(|next| next(instance, name.as_ptr())),
            ),
            Err(e) => {
                debug!("Cannot forward {:?}: {}", name, e);
                ProcAddr::Forwarded(None)
            }
        }
    }

    /// Resolve a physical-device-level command name; always forwarded
    ///
    /// # Safety
    /// `name` must be null or a valid NUL-terminated string.
    pub unsafe fn get_physical_device_proc_addr(
        &self,
        instance: VkInstance,
        name: *const c_char,
    ) -> PFN_vkVoidFunction {
        if name.is_null() {
            return None;
        }

        match self.registry.lookup(ContextKey::from_instance(instance)) {
            Ok(record) => record
                .get_physical_device_proc_addr
                .and_then(|next| next(instance, name)),
            Err(e) => {
                debug!("Cannot forward physical device command: {}", e);
                None
            }
        }
    }
}

/// Find the loader's link-info element in an instance create-info chain
unsafe fn find_link_info(
    create_info: *const VkInstanceCreateInfo,
) -> Option<*mut VkLayerInstanceCreateInfo> {
    if create_info.is_null() {
        return None;
    }

    let mut next = (*create_info).pNext as *const VkBaseInStructure;
    while !next.is_null() {
        if (*next).sType == VK_STRUCTURE_TYPE_LOADER_INSTANCE_CREATE_INFO {
            let info = next as *mut VkLayerInstanceCreateInfo;
            if (*info).function == VK_LAYER_LINK_INFO {
                return Some(info);
            }
        }
        next = (*next).pNext;
    }

    None
}

/// Calls on a context this layer never registered break the loader protocol.
fn fatal(err: &RegistryError) -> ! {
    error!("{}", err);
    std::process::abort()
}
