//! Override gates.
//!
//! A gate is a binary mode switch that, when engaged, fully supersedes a
//! controller's computed output for the actuators it governs.  Two gates
//! exist per enclosure:
//!
//! * [`SchedulerMode`] governs the light/fog duty cycle.
//! * [`OverrideMode`] governs the cooling loop and drain pump.
//!
//! The gate only records the mode.  What engaging or clearing it means is
//! up to the driver: the scheduler restarts its cycle on `Enabled`, the
//! cooling controller re-evaluates from its retained state once the drain
//! override is cleared.  The mode set last is also the mode reapplied when
//! the remote channel comes back after a drop-out.

use core::fmt::Debug;

use log::info;
use serde::{Deserialize, Serialize};

/// A mode a [`ModeGate`] can hold.
pub trait GateMode: Copy + PartialEq + Debug {
    /// True if the mode supersedes the governed controller.
    fn supersedes(self) -> bool;
}

/// Whether the light/fog duty cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchedulerMode {
    Enabled,
    #[default]
    Disabled,
}

impl GateMode for SchedulerMode {
    fn supersedes(self) -> bool {
        self == Self::Disabled
    }
}

impl From<bool> for SchedulerMode {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }
}

/// Cooling loop mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverrideMode {
    /// The cooling thermostat drives the outputs.
    #[default]
    Normal,
    /// Drain pump on, cooling off, thermostat ignored.
    ManualDrain,
}

impl GateMode for OverrideMode {
    fn supersedes(self) -> bool {
        self == Self::ManualDrain
    }
}

/// Holds the last known mode of one gate.
#[derive(Debug)]
pub struct ModeGate<M: GateMode> {
    label: &'static str,
    mode: M,
}

impl<M: GateMode> ModeGate<M> {
    pub fn new(label: &'static str, initial: M) -> Self {
        Self {
            label,
            mode: initial,
        }
    }

    /// Switch mode.  Always takes effect; returns `true` if it changed.
    pub fn set(&mut self, mode: M) -> bool {
        let changed = self.mode != mode;
        if changed {
            info!("Gate {}: {:?} -> {:?}", self.label, self.mode, mode);
        }
        self.mode = mode;
        changed
    }

    /// Current (last known) mode.
    pub fn mode(&self) -> M {
        self.mode
    }

    /// True while the governed controller is superseded.
    pub fn is_engaged(&self) -> bool {
        self.mode.supersedes()
    }

    /// Mode to reapply after the remote channel is restored.
    pub fn restore(&self) -> M {
        info!("Gate {}: reapplying {:?}", self.label, self.mode);
        self.mode
    }
}
