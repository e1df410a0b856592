//! Selector string parsing
//!
//! The selector is an externally supplied string with three forms:
//! absent or empty (keep every device), the literal `list`, or a
//! `VENDOR:DEVICE` pair of hexadecimal identifiers.

use crate::types::device::{DeviceId, VendorId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Token that switches the layer into listing mode
pub const LIST_TOKEN: &str = "list";

/// Policy applied to one enumeration call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Pass every device through unchanged
    AllDevices,
    /// Print the selectable devices and terminate
    ListAndTerminate,
    /// Keep only devices with exactly this (vendor, device) pair
    MatchExact(VendorId, DeviceId),
}

/// Why a selector string was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("expected exactly one ':' separating vendor and device")]
    TokenCount,
    #[error("component is not a hexadecimal number")]
    InvalidHex,
    #[error("component does not fit in 32 bits")]
    Overflow,
}

/// Malformed selector string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse selector \"{raw}\": {reason}")]
pub struct ConfigParseError {
    /// The offending string, verbatim
    pub raw: String,
    pub reason: ParseFailure,
}

impl SelectionPolicy {
    /// Parse an optional selector string.
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigParseError> {
        let raw = match raw {
            None => return Ok(SelectionPolicy::AllDevices),
            Some(raw) => raw,
        };

        if raw == LIST_TOKEN {
            return Ok(SelectionPolicy::ListAndTerminate);
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(SelectionPolicy::AllDevices);
        }

        let fail = |reason| ConfigParseError {
            raw: raw.to_string(),
            reason,
        };

        let mut parts = trimmed.split(':');
        let (vendor, device) = match (parts.next(), parts.next(), parts.next()) {
            (Some(vendor), Some(device), None) => (vendor, device),
            _ => return Err(fail(ParseFailure::TokenCount)),
        };

        let vendor_id = parse_hex_u32(vendor).map_err(fail)?;
        let device_id = parse_hex_u32(device).map_err(fail)?;

        Ok(SelectionPolicy::MatchExact(vendor_id, device_id))
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = ConfigParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SelectionPolicy::parse(Some(s))
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::AllDevices => f.write_str("all devices"),
            SelectionPolicy::ListAndTerminate => f.write_str("list devices and exit"),
            SelectionPolicy::MatchExact(vendor, device) => {
                write!(f, "devices matching {:x}:{:x}", vendor, device)
            }
        }
    }
}

/// Parse one hexadecimal component, with an optional `0x` prefix.
fn parse_hex_u32(s: &str) -> Result<u32, ParseFailure> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseFailure::InvalidHex);
    }

    // Digits are validated above, so the only remaining failure is overflow.
    u32::from_str_radix(digits, 16).map_err(|_| ParseFailure::Overflow)
}
