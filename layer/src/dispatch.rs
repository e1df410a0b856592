//! Entry points this layer intercepts
//!
//! Everything not named here is forwarded to the next layer unchanged.

use crate::vulkan::bindings::PFN_vkVoidFunction;
use std::ffi::CStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterceptedCall {
    CreateInstance,
    DestroyInstance,
    EnumeratePhysicalDevices,
}

impl InterceptedCall {
    pub const ALL: [InterceptedCall; 3] = [
        InterceptedCall::CreateInstance,
        InterceptedCall::DestroyInstance,
        InterceptedCall::EnumeratePhysicalDevices,
    ];

    /// Vulkan command name
    pub fn name(self) -> &'static CStr {
        match self {
            InterceptedCall::CreateInstance => c"vkCreateInstance",
            InterceptedCall::DestroyInstance => c"vkDestroyInstance",
            InterceptedCall::EnumeratePhysicalDevices => c"vkEnumeratePhysicalDevices",
        }
    }

    pub fn from_name(name: &CStr) -> Option<Self> {
        Self::ALL.into_iter().find(|call| call.name() == name)
    }
}

/// Result of resolving a command name
#[derive(Debug, Clone, Copy)]
pub enum ProcAddr {
    /// Served by this layer
    Intercepted(InterceptedCall),
    /// Whatever the next layer returned (possibly null)
    Forwarded(PFN_vkVoidFunction),
}
