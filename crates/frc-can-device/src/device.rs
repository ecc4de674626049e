//! The owning device core.
//!
//! [`CanDevice`] owns one device's route table, watchdog and transmit queue.
//! The host drives it cooperatively, either by calling [`CanDevice::service`]
//! periodically with the transport and a clock, or by feeding frames one at a
//! time through [`CanDevice::handle_frame`], then calling [`CanDevice::flush`]
//! and [`CanDevice::tick`] itself.

use bytes::Bytes;
use frc_can_metrics::{metric_defs, MetricLabels};
use frc_can_protocol::{
    acceptance_filters, device_filter, format_binary, AcceptanceFilter, Address, ApiSelector,
    BroadcastCommand, ClassifiedMessage, MessageCategory, ProtocolError, RawFrame,
};
use tracing::{debug, info, warn};

use crate::config::{DeviceConfig, DEFAULT_BAUD_RATE};
use crate::error::{DeviceError, DeviceResult, HandlerError, TransportError};
use crate::router::{DispatchResult, Router};
use crate::time::{Clock, Timestamp};
use crate::transport::{BusTransport, Outbox};
use crate::watchdog::{LivenessWatchdog, Status, StatusCause, StatusChanged};

/// Callback notified of every status transition.
pub type StatusListener = Box<dyn FnMut(&StatusChanged)>;

/// State handed to route handlers.
#[derive(Debug)]
pub struct DeviceContext {
    outbox: Outbox,
    status: Status,
}

impl DeviceContext {
    fn new(address: Address) -> Self {
        DeviceContext {
            outbox: Outbox::new(address),
            status: Status::Disabled,
        }
    }

    /// This device's address.
    pub fn address(&self) -> Address {
        self.outbox.address()
    }

    /// The transmit queue.
    pub fn outbox(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    /// Queue a frame from this device under a flat API id.
    pub fn reply(&mut self, api_id: u16, data: impl Into<Bytes>) -> Result<(), HandlerError> {
        self.outbox.send(api_id, data)?;
        Ok(())
    }

    /// Watchdog status as of the message being handled.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the device is enabled.
    pub fn is_enabled(&self) -> bool {
        self.status == Status::Enabled
    }
}

/// How a single received frame was disposed of.
#[derive(Debug)]
pub enum FrameDisposition {
    /// The frame was classified and offered to the router.
    Dispatched(DispatchResult),
    /// The frame failed classification and was dropped.
    Dropped(ProtocolError),
    /// The route handler returned an error.
    Failed(HandlerError),
}

/// What happened to a single received frame.
#[derive(Debug)]
pub struct FrameOutcome {
    /// Classification and dispatch result.
    pub disposition: FrameDisposition,
    /// Status transition caused by the frame, if any.
    pub status_change: Option<StatusChanged>,
}

impl FrameOutcome {
    /// Whether a handler accepted the frame.
    pub fn is_handled(&self) -> bool {
        matches!(
            self.disposition,
            FrameDisposition::Dispatched(DispatchResult::Handled)
        )
    }
}

/// Result of flushing the transmit queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    /// Frames handed to the transport.
    pub sent: usize,
    /// Frames the transport refused. They are not retried.
    pub failures: usize,
}

/// Summary of one [`CanDevice::service`] pass.
#[derive(Debug, Default)]
pub struct ServiceReport {
    /// Frames read from the transport.
    pub received: usize,
    /// Frames a handler accepted.
    pub handled: usize,
    /// Frames with no registered route.
    pub unhandled: usize,
    /// Malformed frames dropped before dispatch.
    pub dropped: usize,
    /// Frames handed to the transport.
    pub sent: usize,
    /// Frames the transport refused.
    pub send_failures: usize,
    /// Handler failures, in receive order.
    pub handler_errors: Vec<HandlerError>,
    /// Status transitions, in order.
    pub status_changes: Vec<StatusChanged>,
}

/// A device on the bus.
pub struct CanDevice {
    address: Address,
    baud_rate: u32,
    filters: [AcceptanceFilter; 3],
    router: Router<DeviceContext>,
    watchdog: LivenessWatchdog,
    context: DeviceContext,
    listeners: Vec<StatusListener>,
    metric_labels: MetricLabels,
    labels: Vec<(&'static str, String)>,
}

impl CanDevice {
    /// Create a device from its startup configuration.
    pub fn new(config: &DeviceConfig) -> Result<Self, DeviceError> {
        let address = config.address()?;
        Ok(Self::build(address, config.baud_rate))
    }

    /// Create a device at `address` with the default bit rate.
    pub fn from_address(address: Address) -> Self {
        Self::build(address, DEFAULT_BAUD_RATE)
    }

    fn build(address: Address, baud_rate: u32) -> Self {
        info!(
            device_type = address.device_type(),
            manufacturer = address.manufacturer(),
            device_number = address.device_number(),
            baud_rate,
            filter = %format_binary(device_filter(address)),
            "Creating CAN device {}",
            address
        );
        let metric_labels = MetricLabels::new(
            address.device_type(),
            address.manufacturer(),
            address.device_number(),
        );
        let labels = metric_labels.to_labels();
        CanDevice {
            address,
            baud_rate,
            filters: acceptance_filters(address),
            router: Router::new(),
            watchdog: LivenessWatchdog::new(),
            context: DeviceContext::new(address),
            listeners: Vec::new(),
            metric_labels,
            labels,
        }
    }

    /// This device's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Bus bit rate the transport is started with.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Acceptance filters the transport is programmed with.
    pub fn filters(&self) -> &[AcceptanceFilter] {
        &self.filters
    }

    /// The route table.
    pub fn router(&self) -> &Router<DeviceContext> {
        &self.router
    }

    /// Mutable access to the route table.
    pub fn router_mut(&mut self) -> &mut Router<DeviceContext> {
        &mut self.router
    }

    /// Register a route handler. The last registration for a key wins.
    pub fn register<F>(&mut self, category: MessageCategory, api_id: u16, handler: F) -> bool
    where
        F: FnMut(&ClassifiedMessage, &mut DeviceContext) -> Result<(), HandlerError> + 'static,
    {
        self.router.register(category, api_id, handler)
    }

    /// The liveness watchdog.
    pub fn watchdog(&self) -> &LivenessWatchdog {
        &self.watchdog
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.watchdog.status()
    }

    /// Whether the device is enabled.
    pub fn is_enabled(&self) -> bool {
        self.watchdog.is_enabled()
    }

    /// Notify `listener` of every future status transition.
    pub fn subscribe(&mut self, listener: impl FnMut(&StatusChanged) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Number of frames waiting to be sent.
    pub fn pending_sends(&self) -> usize {
        self.context.outbox.len()
    }

    /// Set the transport's bit rate and program its acceptance filters.
    pub fn start<T: BusTransport + ?Sized>(&mut self, transport: &mut T) -> DeviceResult<()> {
        transport.configure(self.baud_rate, &self.filters)?;
        info!(
            baud_rate = self.baud_rate,
            filters = self.filters.len(),
            state = %transport.state(),
            "CAN device {} started",
            self.address
        );
        Ok(())
    }

    /// Classify and dispatch one received frame.
    ///
    /// A malformed frame is dropped without touching the watchdog. A handler
    /// failure is reported in the outcome; the device stays usable. Replies
    /// queued by the handler wait for [`CanDevice::flush`].
    pub fn handle_frame(&mut self, frame: &RawFrame, now: Timestamp) -> FrameOutcome {
        metrics::counter!(metric_defs::FRAMES_RECEIVED.name, self.labels.as_slice()).increment(1);

        let message = match frame.classify() {
            Ok(message) => message,
            Err(err) => {
                warn!(id = %format_binary(frame.id), len = frame.data.len(), "Dropping frame: {}", err);
                metrics::counter!(metric_defs::FRAMES_DROPPED.name, self.labels.as_slice()).increment(1);
                return FrameOutcome {
                    disposition: FrameDisposition::Dropped(err),
                    status_change: None,
                };
            }
        };

        let status_change = if let Some(heartbeat) = &message.heartbeat {
            if let Some(previous) = self.watchdog.last_heartbeat() {
                let interval = now.saturating_duration_since(previous);
                metrics::histogram!(metric_defs::HEARTBEAT_INTERVAL.name, self.labels.as_slice())
                    .record(interval.as_secs_f64() * 1000.0);
            }
            self.watchdog.on_heartbeat(heartbeat, now)
        } else if message.broadcast_command() == Some(BroadcastCommand::Disable) {
            self.watchdog.on_broadcast_disable(now)
        } else {
            None
        };
        if let Some(change) = status_change {
            self.publish(change);
        }
        self.context.status = self.watchdog.status();

        let labels = self
            .metric_labels
            .with(&[("category", message.category.as_str().to_string())]);
        let disposition = match self.router.dispatch(&message, &mut self.context) {
            Ok(DispatchResult::Handled) => {
                metrics::counter!(metric_defs::MESSAGES_HANDLED.name, labels.as_slice()).increment(1);
                FrameDisposition::Dispatched(DispatchResult::Handled)
            }
            Ok(unhandled) => {
                debug!(
                    category = %message.category,
                    api_id = message.api_id,
                    id = %format_binary(message.raw_id),
                    "No route for message"
                );
                metrics::counter!(metric_defs::MESSAGES_UNHANDLED.name, labels.as_slice()).increment(1);
                FrameDisposition::Dispatched(unhandled)
            }
            Err(err) => {
                warn!(
                    category = %message.category,
                    api_id = message.api_id,
                    "Handler failed: {}",
                    err
                );
                metrics::counter!(metric_defs::HANDLER_FAILURES.name, labels.as_slice()).increment(1);
                FrameDisposition::Failed(err)
            }
        };

        FrameOutcome {
            disposition,
            status_change,
        }
    }

    /// Run the staleness check at `now`.
    pub fn tick(&mut self, now: Timestamp) -> Option<StatusChanged> {
        let change = self.watchdog.on_tick(now)?;
        self.publish(change);
        self.context.status = self.watchdog.status();
        Some(change)
    }

    /// Queue a frame from this device under a flat API id.
    pub fn send(&mut self, api_id: u16, data: impl Into<Bytes>) -> DeviceResult<()> {
        self.context.outbox.send(api_id, data)?;
        Ok(())
    }

    /// Queue a frame from this device under an API class and index.
    pub fn send_with_selector(
        &mut self,
        selector: ApiSelector,
        data: impl Into<Bytes>,
    ) -> DeviceResult<()> {
        self.context.outbox.send_with_selector(selector, data)?;
        Ok(())
    }

    /// Hand every queued frame to the transport, oldest first.
    ///
    /// The queue is empty afterwards. Frames are only sent while the bus can
    /// transmit; refused frames are counted and dropped.
    pub fn flush<T: BusTransport + ?Sized>(&mut self, transport: &mut T) -> FlushReport {
        let mut report = FlushReport::default();
        for frame in self.context.outbox.drain() {
            let state = transport.state();
            let result = if state.can_transmit() {
                transport.send(&frame)
            } else {
                Err(TransportError::BusInactive(state))
            };
            match result {
                Ok(()) => {
                    report.sent += 1;
                    metrics::counter!(metric_defs::FRAMES_SENT.name, self.labels.as_slice()).increment(1);
                }
                Err(err) => {
                    report.failures += 1;
                    warn!(id = %format_binary(frame.id), "Failed to send frame: {}", err);
                    metrics::counter!(metric_defs::SEND_FAILURES.name, self.labels.as_slice()).increment(1);
                }
            }
        }
        report
    }

    /// One cooperative pass: read the frames waiting on the transport,
    /// flush queued sends, then run the staleness check.
    ///
    /// The clock is read once; every frame in the pass shares that time.
    /// Frames that arrive during the pass wait for the next one. A failing
    /// frame never stops the frames after it.
    pub fn service<T, C>(&mut self, transport: &mut T, clock: &C) -> ServiceReport
    where
        T: BusTransport + ?Sized,
        C: Clock + ?Sized,
    {
        let now = clock.now();
        let mut report = ServiceReport::default();

        for _ in 0..transport.pending() {
            let frame = match transport.receive() {
                Some(frame) => frame,
                None => break,
            };
            report.received += 1;
            let outcome = self.handle_frame(&frame, now);
            report.status_changes.extend(outcome.status_change);
            match outcome.disposition {
                FrameDisposition::Dispatched(DispatchResult::Handled) => report.handled += 1,
                FrameDisposition::Dispatched(DispatchResult::Unhandled { .. }) => report.unhandled += 1,
                FrameDisposition::Dropped(_) => report.dropped += 1,
                FrameDisposition::Failed(err) => report.handler_errors.push(err),
            }
        }

        let flushed = self.flush(transport);
        report.sent = flushed.sent;
        report.send_failures = flushed.failures;

        report.status_changes.extend(self.tick(now));
        report
    }

    fn publish(&mut self, change: StatusChanged) {
        let labels = self.metric_labels.with(&[("to", change.to.as_str().to_string())]);
        metrics::counter!(metric_defs::STATUS_TRANSITIONS.name, labels.as_slice()).increment(1);
        if change.cause == StatusCause::HeartbeatTimeout {
            metrics::counter!(metric_defs::HEARTBEAT_TIMEOUTS.name, self.labels.as_slice()).increment(1);
        }
        let enabled = if change.to == Status::Enabled { 1.0 } else { 0.0 };
        metrics::gauge!(metric_defs::ENABLED.name, self.labels.as_slice()).set(enabled);

        for listener in &mut self.listeners {
            listener(&change);
        }
    }
}

impl std::fmt::Debug for CanDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanDevice")
            .field("address", &self.address)
            .field("baud_rate", &self.baud_rate)
            .field("router", &self.router)
            .field("watchdog", &self.watchdog)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frc_can_protocol::{api_ids, build_reply, HeartbeatState, HEARTBEAT_FILTER};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn device() -> CanDevice {
        CanDevice::from_address(Address::new(10, 8, 1).unwrap())
    }

    fn heartbeat_frame(enabled: bool) -> RawFrame {
        let mut state = HeartbeatState::default();
        state.enabled = enabled;
        RawFrame::new(HEARTBEAT_FILTER, state.encode().to_vec())
    }

    #[test]
    fn test_new_from_config() {
        let mut config = DeviceConfig::new(10, 8, 3);
        config.baud_rate = 500_000;
        let device = CanDevice::new(&config).unwrap();
        assert_eq!(device.address().device_number(), 3);
        assert_eq!(device.baud_rate(), 500_000);
        assert_eq!(device.filters().len(), 3);
        assert_eq!(device.status(), Status::Disabled);
        assert_eq!(device.watchdog().timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_new_rejects_bad_address() {
        let config = DeviceConfig::new(32, 8, 1);
        let err = CanDevice::new(&config).unwrap_err();
        assert!(matches!(err, DeviceError::Config(_)));
    }

    #[test]
    fn test_heartbeat_enables_and_notifies() {
        let mut device = device();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        device.subscribe(move |change| sink.borrow_mut().push(change.to));

        let outcome = device.handle_frame(&heartbeat_frame(true), Timestamp::from_millis(5));
        assert!(matches!(
            outcome.disposition,
            FrameDisposition::Dispatched(DispatchResult::Unhandled {
                category: MessageCategory::Heartbeat,
                ..
            })
        ));
        assert_eq!(outcome.status_change.map(|c| c.to), Some(Status::Enabled));
        assert!(device.is_enabled());
        assert_eq!(*seen.borrow(), vec![Status::Enabled]);

        let change = device.tick(Timestamp::from_millis(200)).unwrap();
        assert_eq!(change.cause, StatusCause::HeartbeatTimeout);
        assert_eq!(*seen.borrow(), vec![Status::Enabled, Status::Disabled]);
    }

    #[test]
    fn test_handler_sees_current_status_and_replies() {
        let mut device = device();
        device.register(MessageCategory::Device, api_ids::STATUS_REQUEST, |_, ctx| {
            let enabled = u8::from(ctx.is_enabled());
            ctx.reply(api_ids::STATUS_REPLY, vec![enabled])
        });

        device.handle_frame(&heartbeat_frame(true), Timestamp::from_millis(0));
        let request = build_reply(device.address(), api_ids::STATUS_REQUEST).unwrap();
        let outcome = device.handle_frame(&RawFrame::new(request, Vec::new()), Timestamp::from_millis(10));
        assert!(outcome.is_handled());
        assert!(outcome.status_change.is_none());

        assert_eq!(device.pending_sends(), 1);
        let frame = device.context.outbox.drain().next().unwrap();
        assert_eq!(frame.id, build_reply(device.address(), api_ids::STATUS_REPLY).unwrap());
        assert_eq!(frame.data.as_ref(), &[1]);
    }

    #[test]
    fn test_handler_failure_is_reported() {
        let mut device = device();
        device.register(MessageCategory::Device, api_ids::INIT_PIXEL_ARRAY, |_, _| {
            Err(HandlerError::failed("pixel array not ready"))
        });
        let id = build_reply(device.address(), api_ids::INIT_PIXEL_ARRAY).unwrap();
        let outcome = device.handle_frame(&RawFrame::new(id, Vec::new()), Timestamp::ZERO);
        assert!(matches!(outcome.disposition, FrameDisposition::Failed(HandlerError::Failed(_))));
        assert!(!outcome.is_handled());
    }

    #[test]
    fn test_send_rejects_long_payload() {
        let mut device = device();
        let err = device.send(api_ids::STATUS_REPLY, vec![0u8; 9]).unwrap_err();
        assert!(matches!(err, DeviceError::Protocol(ProtocolError::MalformedPayload { .. })));
        assert_eq!(device.pending_sends(), 0);
    }
}
