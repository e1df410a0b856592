//! Device source backed by the next layer in the Vulkan chain

use super::bindings::{
    VkInstance, VkPhysicalDevice, VkPhysicalDeviceProperties, VkResult, VK_SUCCESS,
};
use crate::registry::ContextRecord;
use crate::{DeviceSource, SourceError};
use devsel_shared::{DeviceHandle, DeviceProperties, DeviceType};
use std::mem::MaybeUninit;
use std::ptr;

type EnumerateFn =
    unsafe extern "system" fn(VkInstance, *mut u32, *mut VkPhysicalDevice) -> VkResult;
type PropertiesFn = unsafe extern "system" fn(VkPhysicalDevice, *mut VkPhysicalDeviceProperties);

/// Enumerates devices of one instance through the next layer's entry points
pub struct VulkanSource {
    instance: VkInstance,
    enumerate: EnumerateFn,
    properties: PropertiesFn,
}

impl VulkanSource {
    /// Returns `None` if the next layer did not provide both entry points.
    ///
    /// # Safety
    /// `record` must hold entry points resolved for `instance`, and
    /// `instance` must stay alive while the source is used.
    pub unsafe fn new(instance: VkInstance, record: &ContextRecord) -> Option<Self> {
        Some(Self {
            instance,
            enumerate: record.enumerate_physical_devices?,
            properties: record.get_physical_device_properties?,
        })
    }
}

impl DeviceSource for VulkanSource {
    fn enumerate_devices(&self, buffer: Option<&mut [DeviceHandle]>) -> Result<u32, SourceError> {
        let mut count = buffer.as_ref().map_or(0, |b| b.len() as u32);
        let devices = buffer.map_or(ptr::null_mut(), |b| b.as_mut_ptr());

        // SAFETY: guaranteed by `VulkanSource::new`; `devices` is either null
        // or valid for `count` writes.
        let result = unsafe { (self.enumerate)(self.instance, &mut count, devices) };
        if result != VK_SUCCESS {
            return Err(SourceError(result));
        }

        Ok(count)
    }

    fn device_properties(&self, device: DeviceHandle) -> DeviceProperties {
        let mut raw = MaybeUninit::<VkPhysicalDeviceProperties>::zeroed();

        // SAFETY: the struct is plain data, so the zeroed value is valid even
        // if the driver leaves fields untouched.
        let raw = unsafe {
            (self.properties)(device, raw.as_mut_ptr());
            raw.assume_init()
        };

        DeviceProperties {
            device_type: DeviceType::from_raw(raw.deviceType),
            vendor_id: raw.vendorID,
            device_id: raw.deviceID,
            name: device_name(&raw),
        }
    }
}

/// Decode the fixed-size, NUL-terminated name field
fn device_name(raw: &VkPhysicalDeviceProperties) -> String {
    let bytes: Vec<u8> = raw
        .deviceName
        .iter()
        .map(|&c| c as u8)
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: [usize; 3] = [0xa0, 0xb0, 0xc0];

    unsafe extern "system" fn fake_enumerate(
        _instance: VkInstance,
        count: *mut u32,
        devices: *mut VkPhysicalDevice,
    ) -> VkResult {
        if devices.is_null() {
            *count = DEVICES.len() as u32;
            return VK_SUCCESS;
        }
        let n = (*count as usize).min(DEVICES.len());
        for (i, &raw) in DEVICES.iter().take(n).enumerate() {
            *devices.add(i) = DeviceHandle(raw);
        }
        *count = n as u32;
        VK_SUCCESS
    }

    unsafe extern "system" fn fake_properties(
        device: VkPhysicalDevice,
        props: *mut VkPhysicalDeviceProperties,
    ) {
        (*props).vendorID = 0x1002;
        (*props).deviceID = device.0 as u32;
        (*props).deviceType = 1;
        for (i, b) in b"Radeon".iter().enumerate() {
            (*props).deviceName[i] = *b as libc::c_char;
        }
    }

    unsafe extern "system" fn failing_enumerate(
        _instance: VkInstance,
        _count: *mut u32,
        _devices: *mut VkPhysicalDevice,
    ) -> VkResult {
        -1
    }

    fn record(enumerate: EnumerateFn) -> ContextRecord {
        ContextRecord {
            enumerate_physical_devices: Some(enumerate),
            get_physical_device_properties: Some(fake_properties),
            ..Default::default()
        }
    }

    #[test]
    fn test_enumerate_through_next_layer() {
        let source = unsafe { VulkanSource::new(ptr::null_mut(), &record(fake_enumerate)) }.unwrap();

        assert_eq!(source.enumerate_devices(None), Ok(3));

        let mut buffer = [DeviceHandle::NULL; 3];
        assert_eq!(source.enumerate_devices(Some(&mut buffer)), Ok(3));
        assert_eq!(buffer, [DeviceHandle(0xa0), DeviceHandle(0xb0), DeviceHandle(0xc0)]);
    }

    #[test]
    fn test_properties_are_decoded() {
        let source = unsafe { VulkanSource::new(ptr::null_mut(), &record(fake_enumerate)) }.unwrap();

        let props = source.device_properties(DeviceHandle(0xb0));
        assert_eq!(props.vendor_id, 0x1002);
        assert_eq!(props.device_id, 0xb0);
        assert_eq!(props.device_type, DeviceType::IntegratedGpu);
        assert_eq!(props.name, "Radeon");
    }

    #[test]
    fn test_error_codes_are_preserved() {
        let source = unsafe { VulkanSource::new(ptr::null_mut(), &record(failing_enumerate)) }.unwrap();
        assert_eq!(source.enumerate_devices(None), Err(SourceError(-1)));
    }

    #[test]
    fn test_missing_entry_points() {
        let record = ContextRecord::default();
        assert!(unsafe { VulkanSource::new(ptr::null_mut(), &record) }.is_none());
    }
}
