//! Inbound commands to the control loop driver.
//!
//! These represent writes from the outside world (dashboard sync, serial
//! console, local buttons) that the
//! [`ControlLoopDriver`](super::service::ControlLoopDriver) applies.

use crate::config::Bound;
use crate::control::band::Channel;
use crate::gate::{OverrideMode, SchedulerMode};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Change one setpoint of a banded channel.
    SetThreshold {
        channel: Channel,
        bound: Bound,
        value: i32,
    },

    /// Enable or disable the light/fog cycle.
    SetSchedulerMode(SchedulerMode),

    /// Engage or clear the manual drain override.
    SetOverrideMode(OverrideMode),

    /// Change the light duration (scheduler must be disabled).
    SetLightOnHours(u8),

    /// Change the fogger pulse length (scheduler must be disabled).
    SetFoggerPulseSecs(u16),

    /// Fire one fogger pulse now, if the light is on.
    RequestFoggerPulse,

    /// The remote channel reconnected; reapply last known modes.
    ChannelRestored,
}
