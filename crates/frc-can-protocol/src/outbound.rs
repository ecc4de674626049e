//! Outbound identifier assembly.

use bytes::Bytes;

use crate::constants::MAX_PAYLOAD_SIZE;
use crate::error::{ProtocolError, ProtocolResult};
use crate::identifier::assemble;
use crate::types::{Address, ApiSelector};

/// Builds identifiers for frames sent by this device.
///
/// The flat API id form ([`OutboundAssembler::build_reply`]) is canonical; the
/// class/index form is a convenience over the same bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundAssembler {
    address: Address,
}

impl OutboundAssembler {
    /// Create an assembler for a device's own address.
    pub fn new(address: Address) -> Self {
        OutboundAssembler { address }
    }

    /// Address frames are sent from.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Identifier for a reply keyed by a flat 10-bit API id.
    pub fn build_reply(&self, api_id: u16) -> ProtocolResult<u32> {
        build_reply(self.address, api_id)
    }

    /// Identifier for a reply keyed by API class and index.
    pub fn build(&self, selector: ApiSelector) -> u32 {
        assemble(self.address, selector)
    }

    /// Outbound frame keyed by a flat API id.
    pub fn frame(&self, api_id: u16, data: impl Into<Bytes>) -> ProtocolResult<OutboundFrame> {
        OutboundFrame::new(self.build_reply(api_id)?, data)
    }
}

/// Identifier for a frame from `address` keyed by a flat API id.
///
/// Fails with [`ProtocolError::OutOfRange`] if `api_id` is wider than 10 bits.
pub fn build_reply(address: Address, api_id: u16) -> ProtocolResult<u32> {
    let selector = ApiSelector::from_api_id(api_id)?;
    Ok(assemble(address, selector))
}

/// A frame ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Extended identifier.
    pub id: u32,
    /// Frame data, at most 8 bytes.
    pub data: Bytes,
}

impl OutboundFrame {
    /// Create an outbound frame, rejecting payloads longer than 8 bytes.
    pub fn new(id: u32, data: impl Into<Bytes>) -> ProtocolResult<Self> {
        let data = data.into();
        if data.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::MalformedPayload {
                expected: MAX_PAYLOAD_SIZE,
                actual: data.len(),
            });
        }
        Ok(OutboundFrame { id, data })
    }
}
