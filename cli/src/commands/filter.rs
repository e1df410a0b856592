//! Filter command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use devsel_layer::inventory::Inventory;
use devsel_layer::{enumerate, DeviceSource, EnumerationOutcome};
use devsel_shared::{DeviceHandle, DeviceListing};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// JSON file with an array of device properties
    #[arg(short, long)]
    pub inventory: PathBuf,

    /// Selector string; defaults to the layer's environment variable
    #[arg(short, long, env = "MESA_VK_DEVICE_SELECT")]
    pub select: Option<String>,

    /// Buffer capacity for the fill query (default: the counted size)
    #[arg(short, long)]
    pub capacity: Option<u32>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// What the layer would report for one count + fill sequence
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FilterReport {
    Selected {
        /// Filtered count from the count query
        counted: u32,
        /// Entries written by the fill query, in order
        devices: Vec<DeviceListing>,
        /// The fill buffer was smaller than the selection
        incomplete: bool,
    },
    Listing {
        devices: Vec<DeviceListing>,
    },
}

pub fn run(args: FilterArgs) -> Result<()> {
    let inventory = Inventory::load(&args.inventory)?;
    debug!("Loaded {} device(s) from {}", inventory.len(), args.inventory.display());

    let report = evaluate(&inventory, args.select.as_deref(), args.capacity)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match report {
        FilterReport::Listing { devices } => {
            println!("selectable devices:");
            for device in devices {
                println!("{}", device);
            }
        }
        FilterReport::Selected {
            counted,
            devices,
            incomplete,
        } => {
            if counted == 0 {
                output::warning("selected no devices");
                return Ok(());
            }
            output::info(&format!("{} device(s) selected", counted));
            for device in &devices {
                println!("{}", device);
            }
            if incomplete {
                output::warning(&format!(
                    "buffer holds {} of {} device(s) (VK_INCOMPLETE)",
                    devices.len(),
                    counted
                ));
            } else {
                output::success("complete");
            }
        }
    }

    Ok(())
}

/// Run a count query followed by a fill query, as an application would.
pub fn evaluate(
    inventory: &Inventory,
    selector: Option<&str>,
    capacity: Option<u32>,
) -> Result<FilterReport> {
    let counted = match enumerate(inventory, selector, None).context("Count query failed")? {
        EnumerationOutcome::ListRequested(devices) => return Ok(FilterReport::Listing { devices }),
        outcome => outcome.count(),
    };

    let mut buffer = vec![DeviceHandle::NULL; capacity.unwrap_or(counted) as usize];
    let outcome = enumerate(inventory, selector, Some(buffer.as_mut_slice()))
        .context("Fill query failed")?;
    buffer.truncate(outcome.count() as usize);

    let devices = buffer
        .iter()
        .enumerate()
        .map(|(i, &handle)| DeviceListing {
            index: i + 1,
            properties: inventory.device_properties(handle),
        })
        .collect();

    Ok(FilterReport::Selected {
        counted,
        devices,
        incomplete: matches!(outcome, EnumerationOutcome::Incomplete(_)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const INVENTORY: &str = r#"[
        {"device_type": "discrete_gpu", "vendor_id": 4318, "device_id": 7684, "name": "A"},
        {"device_type": "integrated_gpu", "vendor_id": 4098, "device_id": 29471, "name": "B"},
        {"device_type": "discrete_gpu", "vendor_id": 4318, "device_id": 7684, "name": "C"}
    ]"#;

    fn load() -> Result<Inventory> {
        let mut file = NamedTempFile::new()?;
        file.write_all(INVENTORY.as_bytes())?;
        Inventory::load(file.path())
    }

    fn names(report: &FilterReport) -> Vec<&str> {
        match report {
            FilterReport::Selected { devices, .. } | FilterReport::Listing { devices } => {
                devices.iter().map(|d| d.properties.name.as_str()).collect()
            }
        }
    }

    #[test]
    fn test_evaluate_exact_match() -> Result<()> {
        let inventory = load()?;

        let report = evaluate(&inventory, Some("10de:1e04"), None)?;

        assert_eq!(names(&report), vec!["A", "C"]);
        assert!(matches!(
            report,
            FilterReport::Selected { counted: 2, incomplete: false, .. }
        ));
        Ok(())
    }

    #[test]
    fn test_evaluate_truncated() -> Result<()> {
        let inventory = load()?;

        let report = evaluate(&inventory, None, Some(2))?;

        assert_eq!(names(&report), vec!["A", "B"]);
        assert!(matches!(
            report,
            FilterReport::Selected { counted: 3, incomplete: true, .. }
        ));
        Ok(())
    }

    #[test]
    fn test_evaluate_listing() -> Result<()> {
        let inventory = load()?;

        let report = evaluate(&inventory, Some("list"), None)?;

        assert!(matches!(report, FilterReport::Listing { .. }));
        assert_eq!(names(&report), vec!["A", "B", "C"]);
        Ok(())
    }

    #[test]
    fn test_evaluate_bad_selector() -> Result<()> {
        let inventory = load()?;
        assert!(evaluate(&inventory, Some("10de:"), None).is_err());
        Ok(())
    }

    #[test]
    fn test_report_json() -> Result<()> {
        let inventory = load()?;
        let report = evaluate(&inventory, Some("1002:731f"), None)?;

        let json: serde_json::Value = serde_json::to_value(&report)?;
        assert_eq!(json["mode"], "selected");
        assert_eq!(json["counted"], 1);
        assert_eq!(json["devices"][0]["properties"]["name"], "B");
        Ok(())
    }
}
