//! FRC CAN Device
//!
//! Device-side core for an FRC CAN bus participant: a route table keyed by
//! message category and API id, a heartbeat watchdog that gates the enabled
//! state, and [`CanDevice`], which owns both and drives them from a transport.
//!
//! # Example
//!
//! ```rust
//! use frc_can_device::{CanDevice, DeviceConfig, Timestamp};
//! use frc_can_protocol::{api_ids, MessageCategory};
//!
//! let config = DeviceConfig::from_json_str(
//!     r#"{ "frc_device_type": 10, "frc_manufacturer": 8, "device_number": 1 }"#,
//! )
//! .unwrap();
//! let mut device = CanDevice::new(&config).unwrap();
//!
//! device.register(MessageCategory::Device, api_ids::STATUS_REQUEST, |_, ctx| {
//!     let enabled = u8::from(ctx.is_enabled());
//!     ctx.reply(api_ids::STATUS_REPLY, vec![enabled])
//! });
//!
//! assert!(!device.is_enabled());
//! assert!(device.tick(Timestamp::from_millis(500)).is_none());
//! ```
//!
//! The host owns the transport and the scheduling loop; this crate never
//! blocks or spawns. A typical loop calls [`CanDevice::service`] every few
//! milliseconds with a [`SystemClock`]. Tests pass a [`ManualClock`], or a bare
//! [`Timestamp`], which acts as a stopped clock.
//!
//! # Metrics
//!
//! Counters, gauges and histograms go through the `metrics` facade and are
//! declared in `frc_can_metrics::metric_defs`. Install a recorder first, then
//! register descriptions once before creating devices:
//!
//! ```rust
//! // After installing a recorder with `metrics::set_global_recorder`.
//! frc_can_metrics::describe_metrics();
//! ```
//!
//! Without a recorder every metric call is a no-op.

mod config;
mod device;
mod error;
mod router;
mod time;
mod transport;
mod watchdog;

pub use config::{DeviceConfig, DEFAULT_BAUD_RATE};
pub use device::{
    CanDevice, DeviceContext, FlushReport, FrameDisposition, FrameOutcome, ServiceReport,
    StatusListener,
};
pub use error::{ConfigError, DeviceError, DeviceResult, HandlerError, TransportError};
pub use router::{DispatchResult, Handler, RouteKey, Router};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
pub use transport::{BusState, BusTransport, Outbox};
pub use watchdog::{LivenessWatchdog, Status, StatusCause, StatusChanged};
