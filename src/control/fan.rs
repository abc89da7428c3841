//! Intake/exhaust fan decision from temperature, humidity and CO2.
//!
//! Each channel keeps its own sticky [`BandState`].  The per-channel rules
//! only ever switch an output **on**; outputs are the OR of every rule, so
//! the order the rules run in has no effect on the result.  A cycle with
//! no band active leaves both fans off.

use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::control::band::{BandState, Channel, FanBands};
use crate::safety::danger_mask;

/// One sensor snapshot for the fan channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanReadings {
    pub temperature: i32,
    pub humidity: i32,
    pub gas: i32,
}

impl FanReadings {
    fn as_pairs(&self) -> [(Channel, i32); 3] {
        [
            (Channel::Temperature, self.temperature),
            (Channel::Humidity, self.humidity),
            (Channel::GasConcentration, self.gas),
        ]
    }
}

/// Desired fan outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FanIntent {
    pub intake: bool,
    pub exhaust: bool,
}

impl FanIntent {
    /// Full venting: exhaust on, intake off.
    pub const EMERGENCY: Self = Self {
        intake: false,
        exhaust: true,
    };

    pub const OFF: Self = Self {
        intake: false,
        exhaust: false,
    };
}

/// Result of one fan evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanDecision {
    pub bands: FanBands,
    pub intent: FanIntent,
    /// Channels at a danger limit this cycle (0 = normal evaluation).
    pub danger: u8,
}

/// Pure evaluation: readings + thresholds + prior bands → new bands + intent.
///
/// A danger reading on any channel returns [`FanIntent::EMERGENCY`] and
/// hands back `prior` untouched, so hysteresis memory survives the
/// emergency.
pub fn evaluate(readings: &FanReadings, thresholds: &ThresholdConfig, prior: FanBands) -> FanDecision {
    let danger = danger_mask(thresholds, &readings.as_pairs());
    if danger != 0 {
        return FanDecision {
            bands: prior,
            intent: FanIntent::EMERGENCY,
            danger,
        };
    }

    let bands = FanBands {
        temperature: prior
            .temperature
            .next(readings.temperature, &thresholds.temperature),
        humidity: prior.humidity.next(readings.humidity, &thresholds.humidity),
        gas: prior.gas.next(readings.gas, &thresholds.gas),
    };

    FanDecision {
        bands,
        intent: combine(&bands),
        danger: 0,
    }
}

/// OR-combine the per-channel contributions.
fn combine(bands: &FanBands) -> FanIntent {
    let mut intent = FanIntent::OFF;

    match bands.temperature {
        BandState::High => {
            intent.intake = true;
            intent.exhaust = true;
        }
        BandState::Low => intent.intake = true,
        BandState::Normal => {}
    }

    // Humidity low leaves the exhaust as the other channels set it.
    if bands.humidity == BandState::High {
        intent.exhaust = true;
    }

    match bands.gas {
        BandState::High => intent.exhaust = true,
        BandState::Low => intent.intake = true,
        BandState::Normal => {}
    }

    intent
}

/// Owns the sticky band state of the fan channels.
#[derive(Debug, Default)]
pub struct FanController {
    bands: FanBands,
    intent: FanIntent,
}

impl FanController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate and commit the new band state.
    pub fn step(&mut self, readings: &FanReadings, thresholds: &ThresholdConfig) -> FanDecision {
        let decision = evaluate(readings, thresholds, self.bands);
        self.bands = decision.bands;
        self.intent = decision.intent;
        decision
    }

    pub fn bands(&self) -> FanBands {
        self.bands
    }

    /// Intent from the most recent evaluation.
    pub fn last_intent(&self) -> FanIntent {
        self.intent
    }
}
