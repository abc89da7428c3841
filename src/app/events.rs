//! Outbound application events.
//!
//! The [`ControlLoopDriver`](super::service::ControlLoopDriver) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: log to serial, push to the
//! dashboard, etc.

use crate::config::Bound;
use crate::control::band::Channel;
use crate::error::{ConfigError, SensorError};
use crate::gate::{OverrideMode, SchedulerMode};

use super::ports::CycleEvent;

/// Which controller an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    /// Intake/exhaust fans.
    Fans,
    /// Cooling loop and drain pump.
    Cooling,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The driver has started.
    Started,

    /// A reading changed by at least its minimum step.
    Telemetry { channel: Channel, value: i32 },

    /// A reading could not be used; the subsystem holds its last outputs.
    SensorUnavailable { channel: Channel, error: SensorError },

    /// Emergency actuation is active.  Carries the channel bitmask.
    DangerDetected { subsystem: Subsystem, channels: u8 },

    /// Every channel of the subsystem is back inside its danger limits.
    DangerCleared { subsystem: Subsystem },

    /// A setpoint write was applied.
    ThresholdUpdated {
        channel: Channel,
        bound: Bound,
        value: i32,
    },

    /// A configuration write was rejected; `retained` is still in effect.
    ConfigRejected(ConfigError),

    /// Cycle parameter write was applied.
    CycleConfigUpdated { light_on_hours: u8, fogger_pulse_secs: u16 },

    SchedulerModeChanged(SchedulerMode),

    OverrideModeChanged(OverrideMode),

    /// The duty cycle switched the light or fogger.
    Cycle { event: CycleEvent, at_ms: u64 },
}
