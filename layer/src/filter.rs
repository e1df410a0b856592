//! Enumeration filter
//!
//! Runs the two-phase count/fill protocol against a [`DeviceSource`],
//! applies the selection policy and writes the surviving devices back under
//! the caller's buffer-size contract.

use crate::{DeviceSource, SourceError};
use devsel_shared::{ConfigParseError, DeviceHandle, DeviceListing, SelectionPolicy};
use thiserror::Error;
use tracing::{debug, warn};

/// Successful result of one enumeration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationOutcome {
    /// Every selected device was reported. For a count query this is the
    /// filtered count; for a fill query the number of entries written.
    Complete(u32),
    /// The caller's buffer was smaller than the selection; this many
    /// entries were written.
    Incomplete(u32),
    /// Listing mode: the caller should print these and terminate.
    ListRequested(Vec<DeviceListing>),
}

impl EnumerationOutcome {
    /// Count to report back to the caller
    pub fn count(&self) -> u32 {
        match self {
            EnumerationOutcome::Complete(n) | EnumerationOutcome::Incomplete(n) => *n,
            EnumerationOutcome::ListRequested(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnumerationError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("out of host memory while building device lists")]
    OutOfMemory,

    #[error(transparent)]
    Config(#[from] ConfigParseError),
}

/// Enumerate devices from `source`, filtered by `selector`.
///
/// `output` is `None` for a count query. Otherwise its length is the
/// caller's capacity and at most that many handles are written into it, in
/// the source's order.
pub fn enumerate<S: DeviceSource + ?Sized>(
    source: &S,
    selector: Option<&str>,
    output: Option<&mut [DeviceHandle]>,
) -> Result<EnumerationOutcome, EnumerationError> {
    let devices = fetch_devices(source)?;

    let policy = SelectionPolicy::parse(selector)?;
    debug!("Applying policy '{}' to {} device(s)", policy, devices.len());

    let selected = match policy {
        SelectionPolicy::ListAndTerminate => {
            return Ok(EnumerationOutcome::ListRequested(list_devices(source, &devices)));
        }
        SelectionPolicy::AllDevices => devices,
        SelectionPolicy::MatchExact(vendor_id, device_id) => {
            let mut selected = allocate(devices.len())?;
            selected.extend(
                devices
                    .iter()
                    .copied()
                    .filter(|&device| {
                        source
                            .device_properties(device)
                            .matches(vendor_id, device_id)
                    }),
            );
            selected
        }
    };

    if selected.is_empty() {
        warn!(selector = selector.unwrap_or_default(), "selected no devices");
    }

    Ok(write_selection(&selected, output))
}

/// Query the source for its full device list: count, then fill.
fn fetch_devices<S: DeviceSource + ?Sized>(
    source: &S,
) -> Result<Vec<DeviceHandle>, EnumerationError> {
    let count = source.enumerate_devices(None)?;

    let mut devices = allocate(count as usize)?;
    devices.resize(count as usize, DeviceHandle::NULL);

    let written = source.enumerate_devices(Some(devices.as_mut_slice()))?;
    devices.truncate(written as usize);

    debug!("Source reported {} device(s)", devices.len());
    Ok(devices)
}

fn allocate(capacity: usize) -> Result<Vec<DeviceHandle>, EnumerationError> {
    let mut list = Vec::new();
    list.try_reserve_exact(capacity)
        .map_err(|_| EnumerationError::OutOfMemory)?;
    Ok(list)
}

/// Build the 1-indexed listing for every device
pub fn list_devices<S: DeviceSource + ?Sized>(
    source: &S,
    devices: &[DeviceHandle],
) -> Vec<DeviceListing> {
    devices
        .iter()
        .enumerate()
        .map(|(i, &device)| DeviceListing {
            index: i + 1,
            properties: source.device_properties(device),
        })
        .collect()
}

/// Copy the selection into the caller's buffer and derive the status.
fn write_selection(
    selected: &[DeviceHandle],
    output: Option<&mut [DeviceHandle]>,
) -> EnumerationOutcome {
    let selected_count = selected.len() as u32;

    let Some(output) = output else {
        return EnumerationOutcome::Complete(selected_count);
    };

    let written = selected.len().min(output.len());
    output[..written].copy_from_slice(&selected[..written]);

    if selected.len() > output.len() {
        EnumerationOutcome::Incomplete(written as u32)
    } else {
        EnumerationOutcome::Complete(written as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Inventory;
    use devsel_shared::{DeviceProperties, DeviceType};
    use proptest::prelude::*;
    use std::cell::Cell;

    fn device(vendor_id: u32, device_id: u32, name: &str) -> DeviceProperties {
        DeviceProperties {
            device_type: DeviceType::DiscreteGpu,
            vendor_id,
            device_id,
            name: name.to_string(),
        }
    }

    fn sample_inventory() -> Inventory {
        Inventory::new(vec![
            device(0x10de, 0x1e04, "A"),
            device(0x1002, 0x731f, "B"),
            device(0x10de, 0x1e04, "C"),
        ])
    }

    fn names(inventory: &Inventory, handles: &[DeviceHandle]) -> Vec<String> {
        handles
            .iter()
            .map(|&h| inventory.device_properties(h).name)
            .collect()
    }

    #[test]
    fn test_exact_match_preserves_order() {
        let inventory = sample_inventory();
        let mut out = [DeviceHandle::NULL; 3];

        let outcome = enumerate(&inventory, Some("10de:1e04"), Some(&mut out)).unwrap();

        assert_eq!(outcome, EnumerationOutcome::Complete(2));
        assert_eq!(names(&inventory, &out[..2]), vec!["A", "C"]);
        assert!(out[2].is_null());
    }

    #[test]
    fn test_count_query_returns_filtered_count() {
        let inventory = sample_inventory();

        let outcome = enumerate(&inventory, Some("10de:1e04"), None).unwrap();
        assert_eq!(outcome, EnumerationOutcome::Complete(2));

        let outcome = enumerate(&inventory, None, None).unwrap();
        assert_eq!(outcome, EnumerationOutcome::Complete(3));
    }

    #[test]
    fn test_count_then_fill_is_consistent() {
        let inventory = sample_inventory();

        let count = enumerate(&inventory, Some("1002:731f"), None).unwrap().count();
        let mut out = vec![DeviceHandle::NULL; count as usize];
        let outcome = enumerate(&inventory, Some("1002:731f"), Some(&mut out)).unwrap();

        assert_eq!(outcome, EnumerationOutcome::Complete(count));
        assert_eq!(names(&inventory, &out), vec!["B"]);
    }

    #[test]
    fn test_small_buffer_is_incomplete() {
        let inventory = sample_inventory();
        let mut out = [DeviceHandle::NULL; 1];

        let outcome = enumerate(&inventory, Some("10de:1e04"), Some(&mut out)).unwrap();

        assert_eq!(outcome, EnumerationOutcome::Incomplete(1));
        assert_eq!(names(&inventory, &out), vec!["A"]);
    }

    #[test]
    fn test_large_buffer_reports_true_count() {
        let inventory = sample_inventory();
        let mut out = [DeviceHandle::NULL; 8];

        let outcome = enumerate(&inventory, None, Some(&mut out)).unwrap();

        assert_eq!(outcome, EnumerationOutcome::Complete(3));
        assert_eq!(names(&inventory, &out[..3]), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_selection_is_success() {
        let inventory = sample_inventory();
        let mut out = [DeviceHandle::NULL; 3];

        let outcome = enumerate(&inventory, Some("8086:3e92"), Some(&mut out)).unwrap();

        assert_eq!(outcome, EnumerationOutcome::Complete(0));
        assert!(out.iter().all(|h| h.is_null()));
    }

    #[test]
    fn test_zero_capacity_buffer() {
        let inventory = sample_inventory();
        let mut out: [DeviceHandle; 0] = [];

        let outcome = enumerate(&inventory, None, Some(&mut out)).unwrap();
        assert_eq!(outcome, EnumerationOutcome::Incomplete(0));
    }

    #[test]
    fn test_list_mode_lists_every_device() {
        let inventory = sample_inventory();

        let outcome = enumerate(&inventory, Some("list"), None).unwrap();

        let EnumerationOutcome::ListRequested(listing) = outcome else {
            panic!("expected listing, got {:?}", outcome);
        };
        assert_eq!(listing.len(), 3);
        assert_eq!(listing[0].index, 1);
        assert_eq!(listing[1].properties.name, "B");
        assert_eq!(
            listing[2].to_string(),
            "  GPU 3: 10de:1e04 \"C\" discrete GPU"
        );
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let inventory = sample_inventory();
        let mut out = [DeviceHandle::NULL; 3];

        let err = enumerate(&inventory, Some("bogus"), Some(&mut out)).unwrap_err();

        match err {
            EnumerationError::Config(e) => assert_eq!(e.raw, "bogus"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(out.iter().all(|h| h.is_null()));
    }

    /// Source that fails on the n-th call to `enumerate_devices`
    struct FailingSource {
        inner: Inventory,
        fail_on_call: u32,
        calls: Cell<u32>,
    }

    impl DeviceSource for FailingSource {
        fn enumerate_devices(&self, buffer: Option<&mut [DeviceHandle]>) -> Result<u32, SourceError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call == self.fail_on_call {
                return Err(SourceError(-4));
            }
            self.inner.enumerate_devices(buffer)
        }

        fn device_properties(&self, device: DeviceHandle) -> DeviceProperties {
            self.inner.device_properties(device)
        }
    }

    #[test]
    fn test_source_errors_propagate() {
        for fail_on_call in [1, 2] {
            let source = FailingSource {
                inner: sample_inventory(),
                fail_on_call,
                calls: Cell::new(0),
            };
            let mut out = [DeviceHandle::NULL; 3];

            let err = enumerate(&source, Some("10de:1e04"), Some(&mut out)).unwrap_err();

            assert_eq!(err, EnumerationError::Source(SourceError(-4)));
            assert_eq!(source.calls.get(), fail_on_call);
            assert!(out.iter().all(|h| h.is_null()));
        }
    }

    #[test]
    fn test_source_errors_win_over_parse_errors() {
        let source = FailingSource {
            inner: sample_inventory(),
            fail_on_call: 1,
            calls: Cell::new(0),
        };

        let err = enumerate(&source, Some("bogus"), None).unwrap_err();
        assert_eq!(err, EnumerationError::Source(SourceError(-4)));
    }

    fn arb_devices() -> impl Strategy<Value = Vec<(u32, u32)>> {
        // Small identifier space so matches are common
        prop::collection::vec((0u32..3, 0u32..3), 0..24)
    }

    proptest! {
        #[test]
        fn prop_filter_is_stable(ids in arb_devices(), vendor in 0u32..3, dev in 0u32..3) {
            let inventory = Inventory::new(
                ids.iter()
                    .enumerate()
                    .map(|(i, &(v, d))| device(v, d, &i.to_string()))
                    .collect(),
            );
            let expected: Vec<String> = ids
                .iter()
                .enumerate()
                .filter(|(_, pair)| **pair == (vendor, dev))
                .map(|(i, _)| i.to_string())
                .collect();

            let selector = format!("{:x}:{:x}", vendor, dev);
            let mut out = vec![DeviceHandle::NULL; ids.len()];
            let outcome = enumerate(&inventory, Some(&selector), Some(&mut out)).unwrap();

            prop_assert_eq!(outcome, EnumerationOutcome::Complete(expected.len() as u32));
            prop_assert_eq!(names(&inventory, &out[..expected.len()]), expected);
        }

        #[test]
        fn prop_capacity_contract(ids in arb_devices(), capacity in 0usize..32) {
            let inventory = Inventory::new(
                ids.iter().map(|&(v, d)| device(v, d, "gpu")).collect(),
            );
            let selector = "1:2";
            let filtered = ids.iter().filter(|&&(v, d)| v == 1 && d == 2).count();

            let counted = enumerate(&inventory, Some(selector), None).unwrap();
            prop_assert_eq!(counted, EnumerationOutcome::Complete(filtered as u32));

            let mut out = vec![DeviceHandle::NULL; capacity];
            let outcome = enumerate(&inventory, Some(selector), Some(&mut out)).unwrap();

            if filtered > capacity {
                prop_assert_eq!(outcome, EnumerationOutcome::Incomplete(capacity as u32));
            } else {
                prop_assert_eq!(outcome, EnumerationOutcome::Complete(filtered as u32));
            }
        }
    }
}
