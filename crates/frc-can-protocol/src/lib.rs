//! FRC CAN Protocol
//!
//! This crate encodes and decodes the 29-bit extended identifiers used on the
//! FIRST Robotics Competition CAN bus, decodes the robot controller heartbeat,
//! and classifies received frames into broadcast, heartbeat and device
//! messages.
//!
//! # Protocol Overview
//!
//! Every frame's identifier carries five fields:
//!
//! ```text
//! device_type(5) | manufacturer(8) | api_class(6) | api_index(4) | device_number(6)
//! ```
//!
//! - **Broadcast** frames use manufacturer `0`; their command is in the API index.
//! - **Heartbeat** frames come from manufacturer `1` and carry 8 bytes of
//!   match/robot state.
//! - **Device** frames are everything else; the API class and index select the
//!   message.
//!
//! # Example
//!
//! ```rust
//! use frc_can_protocol::{classify, Address, MessageCategory, OutboundAssembler};
//!
//! let address = Address::new(10, 8, 1).unwrap();
//! let id = OutboundAssembler::new(address).build_reply(0x20).unwrap();
//!
//! let message = classify(id, bytes::Bytes::new()).unwrap();
//! assert_eq!(message.category, MessageCategory::Device);
//! assert_eq!(message.api_id, 0x20);
//! ```
//!
//! This crate performs no I/O.

mod constants;
mod error;
mod heartbeat;
mod identifier;
mod message;
mod outbound;
mod types;

pub use constants::*;
pub use error::*;
pub use heartbeat::*;
pub use identifier::*;
pub use message::*;
pub use outbound::*;
pub use types::*;
