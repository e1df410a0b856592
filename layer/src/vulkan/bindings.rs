//! Vulkan loader/layer ABI bindings
//!
//! Manual bindings for the small slice of `vulkan_core.h` and
//! `vk_layer.h` this layer touches. Only the fields the layer reads or
//! writes are modelled precisely; everything else is kept opaque.

#![allow(non_camel_case_types, non_snake_case)]

use devsel_shared::DeviceHandle;
use libc::{c_char, c_void};

pub type VkResult = i32;
pub type VkStructureType = i32;
pub type VkFlags = u32;

pub const VK_SUCCESS: VkResult = 0;
pub const VK_INCOMPLETE: VkResult = 5;
pub const VK_ERROR_OUT_OF_HOST_MEMORY: VkResult = -1;
pub const VK_ERROR_INITIALIZATION_FAILED: VkResult = -3;

pub const VK_STRUCTURE_TYPE_LOADER_INSTANCE_CREATE_INFO: VkStructureType = 47;

pub const VK_MAX_PHYSICAL_DEVICE_NAME_SIZE: usize = 256;
pub const VK_UUID_SIZE: usize = 16;

/// Dispatchable instance handle
pub type VkInstance = *mut c_void;

/// Dispatchable physical device handle, viewed as the shared opaque handle
pub type VkPhysicalDevice = DeviceHandle;

/// Opaque to this layer, only forwarded
#[repr(C)]
pub struct VkAllocationCallbacks {
    _private: [u8; 0],
}

/// Header shared by every extensible Vulkan structure
#[repr(C)]
pub struct VkBaseInStructure {
    pub sType: VkStructureType,
    pub pNext: *const VkBaseInStructure,
}

/// Only the chain header is read; the rest is forwarded untouched.
#[repr(C)]
pub struct VkInstanceCreateInfo {
    pub sType: VkStructureType,
    pub pNext: *const c_void,
    pub flags: VkFlags,
}

/// `VkPhysicalDeviceProperties` with `limits` and `sparseProperties` kept as
/// opaque storage. Total size matches the C definition (824 bytes on LP64).
#[repr(C)]
pub struct VkPhysicalDeviceProperties {
    pub apiVersion: u32,
    pub driverVersion: u32,
    pub vendorID: u32,
    pub deviceID: u32,
    pub deviceType: i32,
    pub deviceName: [c_char; VK_MAX_PHYSICAL_DEVICE_NAME_SIZE],
    pub pipelineCacheUUID: [u8; VK_UUID_SIZE],
    pub limits_and_sparse_properties: [u64; 66],
}

pub type PFN_vkVoidFunction = Option<unsafe extern "system" fn()>;

pub type PFN_vkGetInstanceProcAddr =
    Option<unsafe extern "system" fn(VkInstance, *const c_char) -> PFN_vkVoidFunction>;

pub type PFN_GetPhysicalDeviceProcAddr =
    Option<unsafe extern "system" fn(VkInstance, *const c_char) -> PFN_vkVoidFunction>;

pub type PFN_vkGetDeviceProcAddr =
    Option<unsafe extern "system" fn(*mut c_void, *const c_char) -> PFN_vkVoidFunction>;

pub type PFN_vkCreateInstance = Option<
    unsafe extern "system" fn(
        *const VkInstanceCreateInfo,
        *const VkAllocationCallbacks,
        *mut VkInstance,
    ) -> VkResult,
>;

pub type PFN_vkDestroyInstance =
    Option<unsafe extern "system" fn(VkInstance, *const VkAllocationCallbacks)>;

pub type PFN_vkEnumeratePhysicalDevices =
    Option<unsafe extern "system" fn(VkInstance, *mut u32, *mut VkPhysicalDevice) -> VkResult>;

pub type PFN_vkGetPhysicalDeviceProperties =
    Option<unsafe extern "system" fn(VkPhysicalDevice, *mut VkPhysicalDeviceProperties)>;

// vk_layer.h

pub type VkLayerFunction = i32;
pub const VK_LAYER_LINK_INFO: VkLayerFunction = 0;

pub type VkNegotiateLayerStructType = i32;
pub const LAYER_NEGOTIATE_INTERFACE_STRUCT: VkNegotiateLayerStructType = 1;

/// Minimum loader/layer interface version this layer speaks
pub const LAYER_INTERFACE_VERSION: u32 = 2;

#[repr(C)]
pub struct VkLayerInstanceLink {
    pub pNext: *mut VkLayerInstanceLink,
    pub pfnNextGetInstanceProcAddr: PFN_vkGetInstanceProcAddr,
    pub pfnNextGetPhysicalDeviceProcAddr: PFN_GetPhysicalDeviceProcAddr,
}

/// `VkLayerInstanceCreateInfo`. The `u` union is accessed only through its
/// `pLayerInfo` member.
#[repr(C)]
pub struct VkLayerInstanceCreateInfo {
    pub sType: VkStructureType,
    pub pNext: *const c_void,
    pub function: VkLayerFunction,
    pub pLayerInfo: *mut VkLayerInstanceLink,
}

#[repr(C)]
pub struct VkNegotiateLayerInterface {
    pub sType: VkNegotiateLayerStructType,
    pub pNext: *mut c_void,
    pub loaderLayerInterfaceVersion: u32,
    pub pfnGetInstanceProcAddr: PFN_vkGetInstanceProcAddr,
    pub pfnGetDeviceProcAddr: PFN_vkGetDeviceProcAddr,
    pub pfnGetPhysicalDeviceProcAddr: PFN_GetPhysicalDeviceProcAddr,
}
