//! Cooling-loop thermostat for the coolant channel.
//!
//! Unlike the fan controller, which recomputes its outputs from scratch
//! every cycle, this one is a sticky thermostat: the cooling output itself
//! is the memory.
//!
//! * reading `>= max_setpoint` → cooling on
//! * reading `<= max_setpoint - margin` → cooling off (boundary inclusive)
//! * anything in between → previous output held

use serde::{Deserialize, Serialize};

use crate::config::ChannelLimits;
use crate::control::band::{BandState, Channel};

/// Desired outputs of the cooling/water subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoolingOutputs {
    pub cooling: bool,
    pub drain: bool,
}

impl CoolingOutputs {
    /// Forced cooling while the coolant is at a danger limit.
    ///
    /// Applied at both limits, `danger_low` included: the pattern is a
    /// fixed fail-safe, not a direction-aware correction.  A freezing loop
    /// keeps cooling until the reading climbs back above `danger_low` or
    /// an operator engages the drain override.
    pub const EMERGENCY: Self = Self {
        cooling: true,
        drain: false,
    };

    /// Pattern applied while the manual drain override is engaged.
    pub const MANUAL_DRAIN: Self = Self {
        cooling: false,
        drain: true,
    };

    pub const OFF: Self = Self {
        cooling: false,
        drain: false,
    };
}

/// Where one reading sits relative to the thermostat edges.
///
/// `High` switches cooling on, `Low` switches it off and `Normal` is the
/// dead zone in which the last output holds.
pub fn classify(value: i32, limits: &ChannelLimits) -> BandState {
    if value >= limits.max_setpoint {
        BandState::High
    } else if value <= limits.max_setpoint.saturating_sub(limits.hysteresis_margin) {
        BandState::Low
    } else {
        BandState::Normal
    }
}

/// Result of one cooling evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoolingDecision {
    pub band: BandState,
    /// Sticky thermostat output after this evaluation.
    pub cooling: bool,
    /// What to write to the hardware this cycle.
    pub outputs: CoolingOutputs,
    /// Set when the coolant is at a danger limit.
    pub danger: u8,
}

/// Pure evaluation of one coolant reading.
pub fn evaluate(value: i32, limits: &ChannelLimits, prior_cooling: bool) -> CoolingDecision {
    if limits.is_dangerous(value) {
        return CoolingDecision {
            band: BandState::Normal,
            cooling: prior_cooling,
            outputs: CoolingOutputs::EMERGENCY,
            danger: Channel::CoolantTemperature.mask(),
        };
    }

    let band = classify(value, limits);
    let cooling = match band {
        BandState::High => true,
        BandState::Low => false,
        BandState::Normal => prior_cooling,
    };

    CoolingDecision {
        band,
        cooling,
        outputs: CoolingOutputs {
            cooling,
            drain: false,
        },
        danger: 0,
    }
}

/// Owns the sticky cooling output.
#[derive(Debug, Default)]
pub struct CoolingController {
    cooling: bool,
}

impl CoolingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, value: i32, limits: &ChannelLimits) -> CoolingDecision {
        let decision = evaluate(value, limits, self.cooling);
        self.cooling = decision.cooling;
        decision
    }

    pub fn is_cooling(&self) -> bool {
        self.cooling
    }

    /// Outputs implied by the sticky state alone, drain off.
    pub fn outputs(&self) -> CoolingOutputs {
        CoolingOutputs {
            cooling: self.cooling,
            drain: false,
        }
    }
}
