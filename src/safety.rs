//! Danger guard.
//!
//! Danger limits are absolute bounds that sit outside every user setpoint.
//! When any reading reaches one, the controllers skip normal banding for
//! that evaluation and return a fixed emergency intent instead.
//!
//! The guard runs in two halves:
//!
//! 1. [`danger_mask`] is a pure check used by the controllers before they
//!    touch their sticky band state.
//! 2. [`DangerGuard`] latches the resulting bitmask per control loop so the
//!    driver can report rising and falling edges.  Multiple simultaneous
//!    channels are tracked; the guard stays active until every one clears.

use log::{error, info};

use crate::config::ThresholdConfig;
use crate::control::band::Channel;

/// Bitmask of channels whose reading is at or past a danger limit.
///
/// Telemetry-only channels have no limits and never contribute.
pub fn danger_mask(thresholds: &ThresholdConfig, readings: &[(Channel, i32)]) -> u8 {
    readings
        .iter()
        .filter(|(channel, value)| {
            thresholds
                .limits(*channel)
                .is_some_and(|limits| limits.is_dangerous(*value))
        })
        .fold(0, |mask, (channel, _)| mask | channel.mask())
}

/// What changed since the previous evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerEdge {
    /// At least one new channel entered danger.  Carries the full mask.
    Raised(u8),
    /// The last dangerous channel returned inside its limits.
    Cleared,
    /// No change in the set of dangerous channels.
    Unchanged,
}

/// Latching danger supervisor for one controller.
pub struct DangerGuard {
    label: &'static str,
    /// Latched danger bitmask.
    flags: u8,
}

impl DangerGuard {
    pub fn new(label: &'static str) -> Self {
        Self { label, flags: 0 }
    }

    /// Record this cycle's danger mask and report the edge.
    pub fn observe(&mut self, mask: u8) -> DangerEdge {
        let prev = self.flags;
        for channel in Channel::ALL {
            let bit = channel.mask();
            if mask & bit != 0 && prev & bit == 0 {
                error!("DANGER SET ({}): {channel}", self.label);
            } else if mask & bit == 0 && prev & bit != 0 {
                info!("DANGER CLEARED ({}): {channel}", self.label);
            }
        }
        self.flags = mask;

        if mask & !prev != 0 {
            DangerEdge::Raised(mask)
        } else if mask == 0 && prev != 0 {
            DangerEdge::Cleared
        } else {
            DangerEdge::Unchanged
        }
    }

    /// Current danger bitmask.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// True if **any** channel is in danger.
    pub fn is_active(&self) -> bool {
        self.flags != 0
    }

    /// Check if a specific channel is in danger.
    pub fn has(&self, channel: Channel) -> bool {
        self.flags & channel.mask() != 0
    }
}
