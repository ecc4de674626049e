//! Boundary with the bus transceiver driver.
//!
//! The device core never touches hardware. A host wraps its transceiver in a
//! [`BusTransport`] and hands it to [`crate::CanDevice::service`] once per tick.

use bytes::Bytes;
use frc_can_protocol::{
    AcceptanceFilter, Address, ApiSelector, OutboundAssembler, OutboundFrame, ProtocolResult,
    RawFrame,
};

use crate::error::TransportError;

/// Error state of the CAN controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// Normal operation.
    ErrorActive,
    /// Error counters above the warning level; still transmitting.
    ErrorWarning,
    /// Error counters high; the controller no longer signals errors.
    ErrorPassive,
    /// Disconnected from the bus.
    BusOff,
}

impl BusState {
    /// Whether frames may be handed to the controller in this state.
    pub const fn can_transmit(&self) -> bool {
        matches!(self, BusState::ErrorActive | BusState::ErrorWarning)
    }

    /// Returns the state as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BusState::ErrorActive => "error-active",
            BusState::ErrorWarning => "error-warning",
            BusState::ErrorPassive => "error-passive",
            BusState::BusOff => "bus-off",
        }
    }
}

impl std::fmt::Display for BusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CAN transceiver as seen by the device core.
pub trait BusTransport {
    /// Set the bit rate and program the acceptance filters, in order.
    fn configure(&mut self, baud_rate: u32, filters: &[AcceptanceFilter]) -> Result<(), TransportError>;

    /// Number of received frames waiting to be read.
    fn pending(&self) -> usize;

    /// Read the next received frame, if any.
    fn receive(&mut self) -> Option<RawFrame>;

    /// Transmit a frame.
    fn send(&mut self, frame: &OutboundFrame) -> Result<(), TransportError>;

    /// Current controller state.
    fn state(&self) -> BusState;
}

/// Frames queued for transmission from this device's address.
///
/// Handlers push replies here; the device flushes the queue to the transport
/// after the receive pass.
#[derive(Debug, Clone)]
pub struct Outbox {
    assembler: OutboundAssembler,
    frames: Vec<OutboundFrame>,
}

impl Outbox {
    /// Create an empty outbox for a device address.
    pub fn new(address: Address) -> Self {
        Outbox {
            assembler: OutboundAssembler::new(address),
            frames: Vec::new(),
        }
    }

    /// Address frames are sent from.
    pub fn address(&self) -> Address {
        self.assembler.address()
    }

    /// Queue a frame keyed by a flat API id.
    pub fn send(&mut self, api_id: u16, data: impl Into<Bytes>) -> ProtocolResult<()> {
        let frame = self.assembler.frame(api_id, data)?;
        self.frames.push(frame);
        Ok(())
    }

    /// Queue a frame keyed by API class and index.
    pub fn send_with_selector(
        &mut self,
        selector: ApiSelector,
        data: impl Into<Bytes>,
    ) -> ProtocolResult<()> {
        let frame = OutboundFrame::new(self.assembler.build(selector), data)?;
        self.frames.push(frame);
        Ok(())
    }

    /// Number of queued frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Take all queued frames, oldest first.
    pub fn drain(&mut self) -> std::vec::Drain<'_, OutboundFrame> {
        self.frames.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frc_can_protocol::split;

    #[test]
    fn test_can_transmit() {
        assert!(BusState::ErrorActive.can_transmit());
        assert!(BusState::ErrorWarning.can_transmit());
        assert!(!BusState::ErrorPassive.can_transmit());
        assert!(!BusState::BusOff.can_transmit());
    }

    #[test]
    fn test_outbox_queues_in_order() {
        let address = Address::new(10, 8, 2).unwrap();
        let mut outbox = Outbox::new(address);
        outbox.send(0x01, &b"Team7491"[..]).unwrap();
        outbox
            .send_with_selector(ApiSelector::new(3, 0).unwrap(), vec![1u8])
            .unwrap();
        assert_eq!(outbox.len(), 2);

        let frames: Vec<_> = outbox.drain().collect();
        assert!(outbox.is_empty());
        assert_eq!(split(frames[0].id), (address, ApiSelector::from_api_id(1).unwrap()));
        assert_eq!(split(frames[1].id).1.api_id(), 0x30);
    }

    #[test]
    fn test_outbox_rejects_long_payload() {
        let mut outbox = Outbox::new(Address::new(10, 8, 2).unwrap());
        assert!(outbox.send(0x01, vec![0u8; 9]).is_err());
        assert!(outbox.is_empty());
    }
}
