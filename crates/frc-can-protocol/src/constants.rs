//! Protocol constants
//!
//! Bit layouts, reserved codes, acceptance masks and timing values of the
//! FRC CAN addressing scheme. See
//! <https://docs.wpilib.org/en/stable/docs/software/can-devices/can-addressing.html>.

use std::time::Duration;

// ============================================================================
// Extended Identifier Layout
// ============================================================================
//
//  28      24 23            16 15        10 9      6 5          0
// +----------+----------------+------------+--------+------------+
// | dev type |  manufacturer  | api class  | api idx| dev number |
// +----------+----------------+------------+--------+------------+

/// Number of significant bits in an extended identifier.
pub const EXTENDED_ID_BITS: u32 = 29;
/// Mask selecting the 29 identifier bits of a wider register value.
pub const EXTENDED_ID_MASK: u32 = (1 << EXTENDED_ID_BITS) - 1;

/// Width of the device type field.
pub const DEVICE_TYPE_BITS: u32 = 5;
/// Width of the manufacturer field.
pub const MANUFACTURER_BITS: u32 = 8;
/// Width of the API class field.
pub const API_CLASS_BITS: u32 = 6;
/// Width of the API index field.
pub const API_INDEX_BITS: u32 = 4;
/// Width of the combined API id (class + index).
pub const API_ID_BITS: u32 = API_CLASS_BITS + API_INDEX_BITS;
/// Width of the device number field.
pub const DEVICE_NUMBER_BITS: u32 = 6;

/// Bit position of the device number field.
pub const DEVICE_NUMBER_SHIFT: u32 = 0;
/// Bit position of the API index field.
pub const API_INDEX_SHIFT: u32 = DEVICE_NUMBER_SHIFT + DEVICE_NUMBER_BITS;
/// Bit position of the API class field.
pub const API_CLASS_SHIFT: u32 = API_INDEX_SHIFT + API_INDEX_BITS;
/// Bit position of the manufacturer field.
pub const MANUFACTURER_SHIFT: u32 = API_CLASS_SHIFT + API_CLASS_BITS;
/// Bit position of the device type field.
pub const DEVICE_TYPE_SHIFT: u32 = MANUFACTURER_SHIFT + MANUFACTURER_BITS;

/// Largest device type value.
pub const DEVICE_TYPE_MAX: u8 = (1 << DEVICE_TYPE_BITS) - 1;
/// Largest manufacturer value.
pub const MANUFACTURER_MAX: u8 = u8::MAX;
/// Largest API class value.
pub const API_CLASS_MAX: u8 = (1 << API_CLASS_BITS) - 1;
/// Largest API index value.
pub const API_INDEX_MAX: u8 = (1 << API_INDEX_BITS) - 1;
/// Largest flat API id value.
pub const API_ID_MAX: u16 = (1 << API_ID_BITS) - 1;
/// Largest device number value.
pub const DEVICE_NUMBER_MAX: u8 = (1 << DEVICE_NUMBER_BITS) - 1;

// ============================================================================
// Reserved Codes
// ============================================================================

/// Manufacturer code reserved for broadcast frames.
pub const BROADCAST_MANUFACTURER: u8 = 0;
/// Manufacturer code of the robot controller that emits heartbeats.
pub const HEARTBEAT_MANUFACTURER: u8 = 1;
/// API id assigned to every classified broadcast message.
pub const BROADCAST_API_ID: u16 = 0x0;
/// API id assigned to every classified heartbeat message.
pub const HEARTBEAT_API_ID: u16 = 0x1;

// ============================================================================
// Acceptance Filters and Masks
// ============================================================================
//
// For a mask bit of 1 the received identifier must match the filter bit,
// for 0 the bit is ignored.

/// Matches everything except API class and API index.
pub const TYPE_MFG_NUM_MASK: u32 = 0b1111111111110000000000111111;
/// Matches only the device number.
pub const NUM_MASK: u32 = 0b0000000000000000000000111111;
/// Matches only the API class.
pub const API_CLASS_MASK: u32 = 0b0000000000001111110000000000;
/// Matches every identifier bit exactly.
pub const EXACT_MATCH_MASK: u32 = EXTENDED_ID_MASK;

/// Periodic robot controller heartbeat.
///
/// Type 1 (robot controller), manufacturer 1 (NI), API class 6, API index 1,
/// device number 0.
pub const HEARTBEAT_FILTER: u32 = 0b0001000000010001100001000000;
/// Broadcast frames: type 0, manufacturer 0, device number 0.
pub const BROADCAST_FILTER: u32 = 0b0000000000000000000000000000;

// ============================================================================
// Payloads and Timing
// ============================================================================

/// Maximum data length of a classic CAN frame.
pub const MAX_PAYLOAD_SIZE: usize = 8;
/// Exact payload length of a heartbeat frame.
pub const HEARTBEAT_PAYLOAD_SIZE: usize = 8;

/// A device without a heartbeat for longer than this is disabled.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_millis(100);

/// Byte order used to assemble the 64-bit heartbeat word from its payload.
pub const HEARTBEAT_BYTE_ORDER: ByteOrder = ByteOrder::BigEndian;

/// Byte order of a multi-byte payload word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Byte 0 carries the most significant bits.
    BigEndian,
    /// Byte 0 carries the least significant bits.
    LittleEndian,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_covers_29_bits() {
        assert_eq!(DEVICE_TYPE_SHIFT + DEVICE_TYPE_BITS, EXTENDED_ID_BITS);
        assert_eq!(EXTENDED_ID_MASK, 0x1FFF_FFFF);
        assert_eq!(API_CLASS_SHIFT, 10);
        assert_eq!(API_INDEX_SHIFT, 6);
        assert_eq!(MANUFACTURER_SHIFT, 16);
        assert_eq!(DEVICE_TYPE_SHIFT, 24);
    }

    #[test]
    fn test_type_mfg_num_mask_ignores_api_bits() {
        let api_bits = (API_ID_MAX as u32) << API_INDEX_SHIFT;
        assert_eq!(TYPE_MFG_NUM_MASK & api_bits, 0);
        assert_eq!(TYPE_MFG_NUM_MASK & NUM_MASK, NUM_MASK);
        assert_eq!(
            TYPE_MFG_NUM_MASK & ((MANUFACTURER_MAX as u32) << MANUFACTURER_SHIFT),
            (MANUFACTURER_MAX as u32) << MANUFACTURER_SHIFT
        );
    }

    #[test]
    fn test_heartbeat_filter_fields() {
        assert_eq!(HEARTBEAT_FILTER >> DEVICE_TYPE_SHIFT, 1);
        assert_eq!((HEARTBEAT_FILTER >> MANUFACTURER_SHIFT) & 0xFF, 1);
        assert_eq!((HEARTBEAT_FILTER >> API_CLASS_SHIFT) & 0x3F, 6);
        assert_eq!((HEARTBEAT_FILTER >> API_INDEX_SHIFT) & 0xF, 1);
        assert_eq!(HEARTBEAT_FILTER & NUM_MASK, 0);
    }
}
