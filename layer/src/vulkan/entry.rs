//! Exported C ABI entry points
//!
//! The loader only knows function pointers, so these thin wrappers route every
//! call to one process-wide [`DeviceSelectLayer`], created on first use.

use super::bindings::*;
use super::layer::DeviceSelectLayer;
use crate::dispatch::{InterceptedCall, ProcAddr};
use libc::c_char;
use std::mem::transmute;
use std::sync::OnceLock;
use tracing::{debug, error};

static LAYER: OnceLock<DeviceSelectLayer> = OnceLock::new();

fn layer() -> &'static DeviceSelectLayer {
    LAYER.get_or_init(DeviceSelectLayer::from_env)
}

/// Loader/layer interface negotiation
///
/// # Safety
/// `version` must be null or point to a valid negotiation struct.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn vkNegotiateLoaderLayerInterfaceVersion(
    version: *mut VkNegotiateLayerInterface,
) -> VkResult {
    if version.is_null() {
        return VK_ERROR_INITIALIZATION_FAILED;
    }

    let requested = (*version).loaderLayerInterfaceVersion;
    if requested < LAYER_INTERFACE_VERSION {
        error!(
            "Loader offers layer interface version {}, need at least {}",
            requested, LAYER_INTERFACE_VERSION
        );
        return VK_ERROR_INITIALIZATION_FAILED;
    }

    (*version).loaderLayerInterfaceVersion = LAYER_INTERFACE_VERSION;
    (*version).pfnGetInstanceProcAddr = Some(get_instance_proc_addr);
    (*version).pfnGetPhysicalDeviceProcAddr = Some(get_physical_device_proc_addr);

    // Make sure logging and configuration are set up before the first call
    let _ = layer();
    debug!("Negotiated layer interface version {}", LAYER_INTERFACE_VERSION);

    VK_SUCCESS
}

/// # Safety
/// Called by the loader with a valid (possibly null) instance and name.
pub unsafe extern "system" fn get_instance_proc_addr(
    instance: VkInstance,
    name: *const c_char,
) -> PFN_vkVoidFunction {
    match layer().get_instance_proc_addr(instance, name) {
        ProcAddr::Intercepted(call) => entry_point(call),
        ProcAddr::Forwarded(function) => function,
    }
}

/// # Safety
/// Called by the loader with a valid instance and name.
pub unsafe extern "system" fn get_physical_device_proc_addr(
    instance: VkInstance,
    name: *const c_char,
) -> PFN_vkVoidFunction {
    layer().get_physical_device_proc_addr(instance, name)
}

unsafe extern "system" fn create_instance(
    create_info: *const VkInstanceCreateInfo,
    allocator: *const VkAllocationCallbacks,
    instance: *mut VkInstance,
) -> VkResult {
    layer().create_instance(create_info, allocator, instance)
}

unsafe extern "system" fn destroy_instance(
    instance: VkInstance,
    allocator: *const VkAllocationCallbacks,
) {
    layer().destroy_instance(instance, allocator)
}

unsafe extern "system" fn enumerate_physical_devices(
    instance: VkInstance,
    count: *mut u32,
    devices: *mut VkPhysicalDevice,
) -> VkResult {
    layer().enumerate_physical_devices(instance, count, devices)
}

/// This layer's implementation of an intercepted command
pub fn entry_point(call: InterceptedCall) -> PFN_vkVoidFunction {
    type CreateInstanceFn = unsafe extern "system" fn(
        *const VkInstanceCreateInfo,
        *const VkAllocationCallbacks,
        *mut VkInstance,
    ) -> VkResult;
    type DestroyInstanceFn = unsafe extern "system" fn(VkInstance, *const VkAllocationCallbacks);
    type EnumerateFn =
        unsafe extern "system" fn(VkInstance, *mut u32, *mut VkPhysicalDevice) -> VkResult;
    type VoidFn = unsafe extern "system" fn();

    // SAFETY: the loader casts these back to their real signatures by name
    unsafe {
        Some(match call {
            InterceptedCall::CreateInstance => {
                transmute::<CreateInstanceFn, VoidFn>(create_instance)
            }
            InterceptedCall::DestroyInstance => {
                transmute::<DestroyInstanceFn, VoidFn>(destroy_instance)
            }
            InterceptedCall::EnumeratePhysicalDevices => {
                transmute::<EnumerateFn, VoidFn>(enumerate_physical_devices)
            }
        })
    }
}
