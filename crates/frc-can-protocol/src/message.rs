//! Frame classification.
//!
//! A received `(identifier, payload)` pair is split into its address fields
//! and sorted into a [`MessageCategory`] by manufacturer code. Heartbeats get
//! their payload decoded; broadcasts have their routing API id forced to
//! [`BROADCAST_API_ID`].

use bytes::Bytes;

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::heartbeat::HeartbeatState;
use crate::identifier::split;
use crate::types::{Address, ApiSelector, BroadcastCommand, MessageCategory};

/// A frame as delivered by the transceiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Extended identifier.
    pub id: u32,
    /// Frame data (0..=8 bytes on a classic bus).
    pub data: Bytes,
}

impl RawFrame {
    /// Create a new raw frame.
    pub fn new(id: u32, data: impl Into<Bytes>) -> Self {
        RawFrame {
            id,
            data: data.into(),
        }
    }

    /// Classify this frame.
    pub fn classify(&self) -> ProtocolResult<ClassifiedMessage> {
        classify(self.id, self.data.clone())
    }
}

/// A received frame after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedMessage {
    /// Message category.
    pub category: MessageCategory,
    /// API id used as the routing key.
    pub api_id: u16,
    /// API class and index exactly as present on the wire.
    pub selector: ApiSelector,
    /// Address fields of the identifier.
    pub address: Address,
    /// Raw extended identifier.
    pub raw_id: u32,
    /// Frame data.
    pub payload: Bytes,
    /// Decoded heartbeat, present only for [`MessageCategory::Heartbeat`].
    pub heartbeat: Option<HeartbeatState>,
}

impl ClassifiedMessage {
    /// Frame data as a slice.
    pub fn data(&self) -> &[u8] {
        &self.payload
    }

    /// Broadcast command carried by a broadcast frame's API index.
    ///
    /// Returns `None` for other categories and for unknown commands.
    pub fn broadcast_command(&self) -> Option<BroadcastCommand> {
        match self.category {
            MessageCategory::Broadcast => BroadcastCommand::from_u8(self.selector.api_index()),
            _ => None,
        }
    }
}

/// Classify a received frame.
///
/// Fails with [`ProtocolError::MalformedFrame`] only when a heartbeat frame
/// does not carry exactly 8 bytes; every other input classifies.
pub fn classify(raw_id: u32, payload: Bytes) -> ProtocolResult<ClassifiedMessage> {
    let raw_id = raw_id & EXTENDED_ID_MASK;
    let (address, selector) = split(raw_id);
    let category = MessageCategory::from_manufacturer(address.manufacturer());

    let (api_id, heartbeat) = match category {
        MessageCategory::Heartbeat => {
            let state = HeartbeatState::parse(&payload).map_err(|err| match err {
                ProtocolError::MalformedPayload { expected, actual } => {
                    ProtocolError::MalformedFrame {
                        id: raw_id,
                        expected,
                        actual,
                    }
                }
                other => other,
            })?;
            (HEARTBEAT_API_ID, Some(state))
        }
        MessageCategory::Broadcast => (BROADCAST_API_ID, None),
        MessageCategory::Device => (selector.api_id(), None),
    };

    log::trace!(
        "classified 0x{:08X} as {} api 0x{:03X}",
        raw_id,
        category,
        api_id
    );

    Ok(ClassifiedMessage {
        category,
        api_id,
        selector,
        address,
        raw_id,
        payload,
        heartbeat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::assemble_fields;

    #[test]
    fn test_classify_device() {
        let id = assemble_fields(10, 8, 2, 3, 5).unwrap();
        let msg = classify(id, Bytes::from_static(b"\x01\x02")).unwrap();
        assert_eq!(msg.category, MessageCategory::Device);
        assert_eq!(msg.api_id, 0x23);
        assert_eq!(msg.address.device_number(), 5);
        assert_eq!(msg.data(), &[1, 2]);
        assert!(msg.heartbeat.is_none());
        assert_eq!(msg.broadcast_command(), None);
    }

    #[test]
    fn test_classify_broadcast_forces_api_zero() {
        let id = assemble_fields(0, 0, 0x15, 10, 0).unwrap();
        let msg = classify(id, Bytes::new()).unwrap();
        assert_eq!(msg.category, MessageCategory::Broadcast);
        assert_eq!(msg.api_id, BROADCAST_API_ID);
        assert_eq!(msg.selector.api_index(), 10);
        assert_eq!(msg.broadcast_command(), Some(BroadcastCommand::SystemResume));
        assert!(msg.heartbeat.is_none());
    }

    #[test]
    fn test_classify_heartbeat() {
        let payload = Bytes::copy_from_slice(&(1u64 << 33).to_be_bytes());
        let msg = classify(HEARTBEAT_FILTER, payload).unwrap();
        assert_eq!(msg.category, MessageCategory::Heartbeat);
        assert_eq!(msg.api_id, HEARTBEAT_API_ID);
        assert_eq!(msg.selector.api_id(), 0x61);
        assert!(msg.heartbeat.unwrap().enabled);
    }

    #[test]
    fn test_classify_short_heartbeat() {
        let err = classify(HEARTBEAT_FILTER, Bytes::from_static(&[0, 0, 0, 0])).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MalformedFrame {
                id: HEARTBEAT_FILTER,
                expected: 8,
                actual: 4
            }
        );
    }

    #[test]
    fn test_classify_unknown_manufacturer_is_device() {
        let id = assemble_fields(31, 0xEE, 0, 0, 63).unwrap();
        let msg = RawFrame::new(id, Vec::new()).classify().unwrap();
        assert_eq!(msg.category, MessageCategory::Device);
        assert_eq!(msg.api_id, 0);
    }
}
