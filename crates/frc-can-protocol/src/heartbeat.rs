//! Robot controller heartbeat payload.
//!
//! The 8-byte payload is read as one 64-bit word (bit 63 is the MSB of
//! byte 0 under [`HEARTBEAT_BYTE_ORDER`]):
//!
//! | field            | bits  | width |
//! |------------------|-------|-------|
//! | match_time       | 63-56 | 8     |
//! | match_number     | 55-46 | 10    |
//! | replay_number    | 45-40 | 6     |
//! | tournament_type  | 39-37 | 3     |
//! | system_watchdog  | 36    | 1     |
//! | test_mode        | 35    | 1     |
//! | auto_mode        | 34    | 1     |
//! | enabled          | 33    | 1     |
//! | red_alliance     | 32    | 1     |
//! | reserved         | 31-0  | 32    |
//!
//! Values are passed through without range checks.

use crate::constants::{ByteOrder, HEARTBEAT_BYTE_ORDER, HEARTBEAT_PAYLOAD_SIZE};
use crate::error::{ProtocolError, ProtocolResult};

const MATCH_TIME_SHIFT: u32 = 56;
const MATCH_TIME_MASK: u64 = 0xFF;
const MATCH_NUMBER_SHIFT: u32 = 46;
const MATCH_NUMBER_MASK: u64 = 0x3FF;
const REPLAY_NUMBER_SHIFT: u32 = 40;
const REPLAY_NUMBER_MASK: u64 = 0x3F;
const TOURNAMENT_TYPE_SHIFT: u32 = 37;
const TOURNAMENT_TYPE_MASK: u64 = 0x7;
const SYSTEM_WATCHDOG_BIT: u32 = 36;
const TEST_MODE_BIT: u32 = 35;
const AUTO_MODE_BIT: u32 = 34;
const ENABLED_BIT: u32 = 33;
const RED_ALLIANCE_BIT: u32 = 32;

/// Match and robot state decoded from a heartbeat frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeartbeatState {
    /// Remaining match time in seconds.
    pub match_time: u8,
    /// Match number (10 bits).
    pub match_number: u16,
    /// Replay number (6 bits).
    pub replay_number: u8,
    /// Tournament type (3 bits).
    pub tournament_type: u8,
    /// System watchdog flag.
    pub system_watchdog: bool,
    /// Robot is in test mode.
    pub test_mode: bool,
    /// Robot is in autonomous mode.
    pub auto_mode: bool,
    /// Robot is enabled.
    pub enabled: bool,
    /// Robot is on the red alliance.
    pub red_alliance: bool,
    reserved: u32,
}

impl HeartbeatState {
    /// Parse a heartbeat payload using [`HEARTBEAT_BYTE_ORDER`].
    pub fn parse(payload: &[u8]) -> ProtocolResult<Self> {
        Self::parse_with_order(payload, HEARTBEAT_BYTE_ORDER)
    }

    /// Parse a heartbeat payload with an explicit byte order.
    ///
    /// Fails with [`ProtocolError::MalformedPayload`] unless exactly 8 bytes
    /// are supplied.
    pub fn parse_with_order(payload: &[u8], order: ByteOrder) -> ProtocolResult<Self> {
        let bytes: [u8; HEARTBEAT_PAYLOAD_SIZE] =
            payload
                .try_into()
                .map_err(|_| ProtocolError::MalformedPayload {
                    expected: HEARTBEAT_PAYLOAD_SIZE,
                    actual: payload.len(),
                })?;
        let word = match order {
            ByteOrder::BigEndian => u64::from_be_bytes(bytes),
            ByteOrder::LittleEndian => u64::from_le_bytes(bytes),
        };
        log::trace!("heartbeat word {:#066b}", word);
        Ok(Self::from_word(word))
    }

    /// Decode from the 64-bit heartbeat word.
    pub fn from_word(word: u64) -> Self {
        let bit = |n: u32| (word >> n) & 1 == 1;
        HeartbeatState {
            match_time: ((word >> MATCH_TIME_SHIFT) & MATCH_TIME_MASK) as u8,
            match_number: ((word >> MATCH_NUMBER_SHIFT) & MATCH_NUMBER_MASK) as u16,
            replay_number: ((word >> REPLAY_NUMBER_SHIFT) & REPLAY_NUMBER_MASK) as u8,
            tournament_type: ((word >> TOURNAMENT_TYPE_SHIFT) & TOURNAMENT_TYPE_MASK) as u8,
            system_watchdog: bit(SYSTEM_WATCHDOG_BIT),
            test_mode: bit(TEST_MODE_BIT),
            auto_mode: bit(AUTO_MODE_BIT),
            enabled: bit(ENABLED_BIT),
            red_alliance: bit(RED_ALLIANCE_BIT),
            reserved: word as u32,
        }
    }

    /// The 64-bit heartbeat word. Fields wider than their slot are truncated.
    pub fn raw(&self) -> u64 {
        let flag = |set: bool, n: u32| (set as u64) << n;
        ((self.match_time as u64 & MATCH_TIME_MASK) << MATCH_TIME_SHIFT)
            | ((self.match_number as u64 & MATCH_NUMBER_MASK) << MATCH_NUMBER_SHIFT)
            | ((self.replay_number as u64 & REPLAY_NUMBER_MASK) << REPLAY_NUMBER_SHIFT)
            | ((self.tournament_type as u64 & TOURNAMENT_TYPE_MASK) << TOURNAMENT_TYPE_SHIFT)
            | flag(self.system_watchdog, SYSTEM_WATCHDOG_BIT)
            | flag(self.test_mode, TEST_MODE_BIT)
            | flag(self.auto_mode, AUTO_MODE_BIT)
            | flag(self.enabled, ENABLED_BIT)
            | flag(self.red_alliance, RED_ALLIANCE_BIT)
            | self.reserved as u64
    }

    /// Encode as an 8-byte payload using [`HEARTBEAT_BYTE_ORDER`].
    pub fn encode(&self) -> [u8; HEARTBEAT_PAYLOAD_SIZE] {
        match HEARTBEAT_BYTE_ORDER {
            ByteOrder::BigEndian => self.raw().to_be_bytes(),
            ByteOrder::LittleEndian => self.raw().to_le_bytes(),
        }
    }

    /// The 32 reserved low bits.
    pub fn reserved(&self) -> u32 {
        self.reserved
    }
}
