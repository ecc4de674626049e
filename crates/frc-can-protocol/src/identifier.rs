//! Extended identifier packing and unpacking.
//!
//! The 29-bit identifier is laid out most-significant first as
//! `device_type(5) | manufacturer(8) | api_class(6) | api_index(4) | device_number(6)`.
//! [`split`] and [`assemble`] are exact inverses over all valid inputs.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{Address, ApiSelector};

/// Split a raw identifier into its address and API selector.
///
/// Bits above bit 28 are ignored, so any `u32` is accepted.
pub fn split(raw: u32) -> (Address, ApiSelector) {
    let raw = raw & EXTENDED_ID_MASK;
    let address = Address::from_masked(
        (raw >> DEVICE_TYPE_SHIFT) as u8,
        (raw >> MANUFACTURER_SHIFT) as u8,
        (raw >> DEVICE_NUMBER_SHIFT) as u8,
    );
    let selector = ApiSelector::from_masked((raw >> API_INDEX_SHIFT) as u16);
    (address, selector)
}

/// Compose a raw identifier from an address and API selector.
pub fn assemble(address: Address, selector: ApiSelector) -> u32 {
    ((address.device_type() as u32) << DEVICE_TYPE_SHIFT)
        | ((address.manufacturer() as u32) << MANUFACTURER_SHIFT)
        | ((selector.api_id() as u32) << API_INDEX_SHIFT)
        | ((address.device_number() as u32) << DEVICE_NUMBER_SHIFT)
}

/// Compose a raw identifier from unvalidated field values.
///
/// Fails with [`ProtocolError::OutOfRange`] if any field exceeds its width.
pub fn assemble_fields(
    device_type: u8,
    manufacturer: u8,
    api_class: u8,
    api_index: u8,
    device_number: u8,
) -> ProtocolResult<u32> {
    let address = Address::new(device_type, manufacturer, device_number)?;
    let selector = ApiSelector::new(api_class, api_index)?;
    Ok(assemble(address, selector))
}

/// Acceptance filter value for frames addressed to `address`.
///
/// API fields are zero; pair it with [`TYPE_MFG_NUM_MASK`] so the transceiver
/// ignores them.
pub fn device_filter(address: Address) -> u32 {
    assemble(address, ApiSelector::default())
}

/// A filter/mask pair programmed into the bus transceiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceFilter {
    /// Identifier pattern to match.
    pub filter: u32,
    /// Bits of the pattern that must match.
    pub mask: u32,
}

impl AcceptanceFilter {
    /// Create a filter that must match every bit.
    pub const fn exact(filter: u32) -> Self {
        AcceptanceFilter {
            filter,
            mask: EXACT_MATCH_MASK,
        }
    }

    /// Create a filter with an explicit mask.
    pub const fn masked(filter: u32, mask: u32) -> Self {
        AcceptanceFilter { filter, mask }
    }

    /// Check whether a received identifier passes this filter.
    pub const fn matches(&self, raw: u32) -> bool {
        (raw & self.mask) == (self.filter & self.mask)
    }
}

/// The acceptance filters a device listens with, in programming order.
///
/// 1. Robot controller heartbeat, exact match.
/// 2. Broadcast frames, ignoring API bits.
/// 3. Frames for this device, ignoring API bits.
///
/// The order matters on transceivers whose first mask only has two filter
/// slots.
pub fn acceptance_filters(address: Address) -> [AcceptanceFilter; 3] {
    [
        AcceptanceFilter::exact(HEARTBEAT_FILTER),
        AcceptanceFilter::masked(BROADCAST_FILTER, TYPE_MFG_NUM_MASK),
        AcceptanceFilter::masked(device_filter(address), TYPE_MFG_NUM_MASK),
    ]
}

/// Render an identifier as a 29-digit binary string for diagnostics.
pub fn format_binary(raw: u32) -> String {
    format!("0b{:029b}", raw & EXTENDED_ID_MASK)
}
