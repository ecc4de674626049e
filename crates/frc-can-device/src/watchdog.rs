//! Heartbeat liveness watchdog.
//!
//! The watchdog holds the device's enabled state. Only a heartbeat that says
//! `enabled` can move it to [`Status::Enabled`]; a stale heartbeat, a heartbeat
//! that says disabled, or a broadcast disable command move it back.

use std::time::Duration;

use frc_can_protocol::{HeartbeatState, HEARTBEAT_TIMEOUT};
use tracing::{info, warn};

use crate::time::Timestamp;

/// Enabled state of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Outputs may be driven.
    Enabled,
    /// Outputs must be idle.
    #[default]
    Disabled,
}

impl Status {
    /// Returns the status as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::Enabled => "enabled",
            Status::Disabled => "disabled",
        }
    }

    const fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Status::Enabled
        } else {
            Status::Disabled
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCause {
    /// A heartbeat carried a different enabled flag.
    Heartbeat,
    /// No heartbeat arrived within the staleness threshold.
    HeartbeatTimeout,
    /// A broadcast disable command was received.
    BroadcastDisable,
}

impl StatusCause {
    /// Returns the cause as a kebab-case string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StatusCause::Heartbeat => "heartbeat",
            StatusCause::HeartbeatTimeout => "heartbeat-timeout",
            StatusCause::BroadcastDisable => "broadcast-disable",
        }
    }
}

/// Emitted whenever the watchdog's status flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChanged {
    /// New status.
    pub to: Status,
    /// When the transition happened.
    pub at: Timestamp,
    /// What caused it.
    pub cause: StatusCause,
}

/// Tracks heartbeat recency and derives the enabled state.
#[derive(Debug, Clone)]
pub struct LivenessWatchdog {
    timeout: Duration,
    last_heartbeat: Option<Timestamp>,
    status: Status,
}

impl LivenessWatchdog {
    /// Create a disabled watchdog with the standard 100 ms threshold.
    pub fn new() -> Self {
        Self::with_timeout(HEARTBEAT_TIMEOUT)
    }

    pub(crate) fn with_timeout(timeout: Duration) -> Self {
        LivenessWatchdog {
            timeout,
            last_heartbeat: None,
            status: Status::Disabled,
        }
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the device is enabled.
    pub fn is_enabled(&self) -> bool {
        self.status == Status::Enabled
    }

    /// Time the last heartbeat was accepted, if any.
    pub fn last_heartbeat(&self) -> Option<Timestamp> {
        self.last_heartbeat
    }

    /// Staleness threshold.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record a heartbeat received at `now`.
    ///
    /// Every heartbeat refreshes the liveness timestamp. The status follows the
    /// heartbeat's `enabled` flag.
    pub fn on_heartbeat(&mut self, heartbeat: &HeartbeatState, now: Timestamp) -> Option<StatusChanged> {
        self.last_heartbeat = Some(now);
        self.transition(Status::from_enabled(heartbeat.enabled), now, StatusCause::Heartbeat)
    }

    /// Periodic staleness check.
    ///
    /// Disables the device if it is enabled and the last heartbeat is older
    /// than the threshold. Never enables.
    pub fn on_tick(&mut self, now: Timestamp) -> Option<StatusChanged> {
        if self.status != Status::Enabled {
            return None;
        }
        let stale = match self.last_heartbeat {
            Some(last) => now.saturating_duration_since(last) > self.timeout,
            None => true,
        };
        if !stale {
            return None;
        }
        warn!(
            timeout_ms = self.timeout.as_millis() as u64,
            last_heartbeat = ?self.last_heartbeat,
            %now,
            "No heartbeat in more than {}ms, disabling",
            self.timeout.as_millis()
        );
        self.transition(Status::Disabled, now, StatusCause::HeartbeatTimeout)
    }

    /// Apply a broadcast disable command. Does not refresh liveness.
    pub fn on_broadcast_disable(&mut self, now: Timestamp) -> Option<StatusChanged> {
        self.transition(Status::Disabled, now, StatusCause::BroadcastDisable)
    }

    fn transition(&mut self, to: Status, at: Timestamp, cause: StatusCause) -> Option<StatusChanged> {
        if self.status == to {
            return None;
        }
        self.status = to;
        info!(status = %to, cause = cause.as_str(), %at, "Device {}", to);
        Some(StatusChanged { to, at, cause })
    }
}

impl Default for LivenessWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat(enabled: bool) -> HeartbeatState {
        let mut state = HeartbeatState::default();
        state.enabled = enabled;
        state
    }

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    #[test]
    fn test_starts_disabled() {
        let watchdog = LivenessWatchdog::new();
        assert_eq!(watchdog.status(), Status::Disabled);
        assert_eq!(watchdog.last_heartbeat(), None);
        assert_eq!(watchdog.timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_enable_then_timeout() {
        let mut watchdog = LivenessWatchdog::new();

        let change = watchdog.on_heartbeat(&heartbeat(true), at(0));
        assert_eq!(
            change,
            Some(StatusChanged {
                to: Status::Enabled,
                at: at(0),
                cause: StatusCause::Heartbeat
            })
        );

        assert_eq!(watchdog.on_tick(at(50)), None);
        assert!(watchdog.is_enabled());

        let change = watchdog.on_tick(at(150));
        assert_eq!(change.map(|c| c.to), Some(Status::Disabled));
        assert_eq!(change.map(|c| c.cause), Some(StatusCause::HeartbeatTimeout));

        // Exactly one transition.
        assert_eq!(watchdog.on_tick(at(200)), None);
        assert_eq!(watchdog.on_tick(at(1_000)), None);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut watchdog = LivenessWatchdog::new();
        watchdog.on_heartbeat(&heartbeat(true), at(1_000));
        assert_eq!(watchdog.on_tick(at(1_100)), None);
        assert!(watchdog.on_tick(at(1_101)).is_some());
    }

    #[test]
    fn test_ticks_never_promote() {
        let mut watchdog = LivenessWatchdog::new();
        for millis in (0..2_000).step_by(10) {
            assert_eq!(watchdog.on_tick(at(millis)), None);
        }
        assert_eq!(watchdog.status(), Status::Disabled);
    }

    #[test]
    fn test_disabled_heartbeat_refreshes_without_promoting() {
        let mut watchdog = LivenessWatchdog::new();
        assert_eq!(watchdog.on_heartbeat(&heartbeat(false), at(10)), None);
        assert_eq!(watchdog.last_heartbeat(), Some(at(10)));
        assert_eq!(watchdog.status(), Status::Disabled);
    }

    #[test]
    fn test_repeated_heartbeats_keep_enabled() {
        let mut watchdog = LivenessWatchdog::new();
        assert!(watchdog.on_heartbeat(&heartbeat(true), at(0)).is_some());
        for millis in (20..1_000).step_by(20) {
            assert_eq!(watchdog.on_heartbeat(&heartbeat(true), at(millis)), None);
            assert_eq!(watchdog.on_tick(at(millis + 50)), None);
        }
        assert!(watchdog.is_enabled());
    }

    #[test]
    fn test_heartbeat_can_disable() {
        let mut watchdog = LivenessWatchdog::new();
        watchdog.on_heartbeat(&heartbeat(true), at(0));
        let change = watchdog.on_heartbeat(&heartbeat(false), at(20));
        assert_eq!(change.map(|c| c.to), Some(Status::Disabled));
        assert_eq!(change.map(|c| c.cause), Some(StatusCause::Heartbeat));
    }

    #[test]
    fn test_broadcast_disable() {
        let mut watchdog = LivenessWatchdog::new();
        watchdog.on_heartbeat(&heartbeat(true), at(0));

        let change = watchdog.on_broadcast_disable(at(30));
        assert_eq!(change.map(|c| c.cause), Some(StatusCause::BroadcastDisable));
        assert_eq!(watchdog.last_heartbeat(), Some(at(0)));

        // Already disabled.
        assert_eq!(watchdog.on_broadcast_disable(at(40)), None);
    }

    #[test]
    fn test_custom_timeout() {
        let mut watchdog = LivenessWatchdog::with_timeout(Duration::from_millis(500));
        watchdog.on_heartbeat(&heartbeat(true), at(0));
        assert_eq!(watchdog.on_tick(at(400)), None);
        assert!(watchdog.on_tick(at(501)).is_some());
    }

    #[test]
    fn test_backwards_clock_does_not_disable() {
        let mut watchdog = LivenessWatchdog::new();
        watchdog.on_heartbeat(&heartbeat(true), at(1_000));
        assert_eq!(watchdog.on_tick(at(500)), None);
        assert!(watchdog.is_enabled());
    }
}
