//! System configuration parameters
//!
//! All tunable parameters for the enclosure controller.  Setpoints can be
//! changed at runtime by the remote control channel; danger limits and
//! hysteresis margins are fixed per deployment and only change through a
//! config file.

use serde::{Deserialize, Serialize};

use crate::control::band::Channel;
use crate::error::ConfigError;

/// Which setpoint of a channel a threshold write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    Min,
    Max,
}

/// Setpoints, hysteresis and danger limits for one banded channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLimits {
    /// Enter the Low band at or below this value.
    pub min_setpoint: i32,
    /// Enter the High band at or above this value.
    pub max_setpoint: i32,
    /// Width of the dead zone on either setpoint.
    pub hysteresis_margin: i32,
    /// Emergency at or below this value.  Not user-settable.
    pub danger_low: i32,
    /// Emergency at or above this value.  Not user-settable.
    pub danger_high: i32,
}

impl ChannelLimits {
    /// `value <= danger_low || value >= danger_high`.
    pub fn is_dangerous(&self, value: i32) -> bool {
        value <= self.danger_low || value >= self.danger_high
    }

    /// Check internal consistency.  Used for whole-file validation.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.hysteresis_margin < 0 {
            return Err("hysteresis margin must not be negative");
        }
        if self.min_setpoint >= self.max_setpoint {
            return Err("min setpoint must be below max setpoint");
        }
        // Both dead zones must fit between the setpoints.
        if self.max_setpoint - self.min_setpoint <= self.hysteresis_margin {
            return Err("setpoints must be more than one margin apart");
        }
        if self.danger_low >= self.min_setpoint || self.danger_high <= self.max_setpoint {
            return Err("setpoints must lie strictly inside the danger limits");
        }
        Ok(())
    }
}

/// Per-channel thresholds for every banded channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub temperature: ChannelLimits,
    pub humidity: ChannelLimits,
    pub gas: ChannelLimits,
    pub coolant: ChannelLimits,
}

impl ThresholdConfig {
    /// Limits for `channel`, or `None` for telemetry-only channels.
    pub fn limits(&self, channel: Channel) -> Option<&ChannelLimits> {
        match channel {
            Channel::Temperature => Some(&self.temperature),
            Channel::Humidity => Some(&self.humidity),
            Channel::GasConcentration => Some(&self.gas),
            Channel::CoolantTemperature => Some(&self.coolant),
            Channel::Turbidity | Channel::WaterLevel => None,
        }
    }

    fn limits_mut(&mut self, channel: Channel) -> Option<&mut ChannelLimits> {
        match channel {
            Channel::Temperature => Some(&mut self.temperature),
            Channel::Humidity => Some(&mut self.humidity),
            Channel::GasConcentration => Some(&mut self.gas),
            Channel::CoolantTemperature => Some(&mut self.coolant),
            Channel::Turbidity | Channel::WaterLevel => None,
        }
    }

    /// Apply an external setpoint write.
    ///
    /// The new setpoint must stay strictly inside the danger limits and
    /// keep `min < max`.  On rejection nothing changes and the error
    /// carries the value still in effect.
    pub fn set_threshold(
        &mut self,
        channel: Channel,
        bound: Bound,
        value: i32,
    ) -> Result<(), ConfigError> {
        let field = threshold_field(channel, bound);
        let Some(limits) = self.limits_mut(channel) else {
            return Err(ConfigError::InvalidConfiguration { field, retained: 0 });
        };

        let mut candidate = *limits;
        let retained = match bound {
            Bound::Min => core::mem::replace(&mut candidate.min_setpoint, value),
            Bound::Max => core::mem::replace(&mut candidate.max_setpoint, value),
        };

        if candidate.validate().is_err() {
            return Err(ConfigError::InvalidConfiguration { field, retained });
        }
        *limits = candidate;
        Ok(())
    }
}

fn threshold_field(channel: Channel, bound: Bound) -> &'static str {
    match (channel, bound) {
        (Channel::Temperature, Bound::Min) => "temperature.min",
        (Channel::Temperature, Bound::Max) => "temperature.max",
        (Channel::Humidity, Bound::Min) => "humidity.min",
        (Channel::Humidity, Bound::Max) => "humidity.max",
        (Channel::GasConcentration, Bound::Min) => "co2.min",
        (Channel::GasConcentration, Bound::Max) => "co2.max",
        (Channel::CoolantTemperature, Bound::Min) => "coolant.min",
        (Channel::CoolantTemperature, Bound::Max) => "coolant.max",
        (Channel::Turbidity, _) => "turbidity",
        (Channel::WaterLevel, _) => "water_level",
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temperature: ChannelLimits {
                min_setpoint: 18,
                max_setpoint: 30,
                hysteresis_margin: 2,
                danger_low: 5,
                danger_high: 45,
            },
            humidity: ChannelLimits {
                min_setpoint: 60,
                max_setpoint: 90,
                hysteresis_margin: 5,
                danger_low: 10,
                danger_high: 100,
            },
            gas: ChannelLimits {
                min_setpoint: 400,
                max_setpoint: 1000,
                hysteresis_margin: 100,
                danger_low: 0,
                danger_high: 2000,
            },
            coolant: ChannelLimits {
                min_setpoint: 20,
                max_setpoint: 28,
                hysteresis_margin: 1,
                danger_low: 2,
                danger_high: 40,
            },
        }
    }
}

/// Light/fog duty-cycle parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Hours of light within the fixed 12-hour cycle.
    pub light_on_hours: u8,
    /// Length of one fogger pulse.
    pub fogger_pulse_secs: u16,
}

impl CycleConfig {
    /// Total length of one light cycle.
    pub const CYCLE_HOURS: u8 = 12;
    pub const MIN_LIGHT_ON_HOURS: u8 = 1;
    pub const MAX_LIGHT_ON_HOURS: u8 = 11;
    pub const MIN_PULSE_SECS: u16 = 5;
    pub const MAX_PULSE_SECS: u16 = 180;

    pub fn light_on_hours_valid(hours: u8) -> bool {
        (Self::MIN_LIGHT_ON_HOURS..=Self::MAX_LIGHT_ON_HOURS).contains(&hours)
    }

    pub fn pulse_secs_valid(secs: u16) -> bool {
        (Self::MIN_PULSE_SECS..=Self::MAX_PULSE_SECS).contains(&secs)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !Self::light_on_hours_valid(self.light_on_hours) {
            return Err("light_on_hours must be 1..=11");
        }
        if !Self::pulse_secs_valid(self.fogger_pulse_secs) {
            return Err("fogger_pulse_secs must be 5..=180");
        }
        Ok(())
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            light_on_hours: 6,
            fogger_pulse_secs: 30,
        }
    }
}

/// Minimum change before a reading is reported again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Turbidity step (NTU).  All other channels report whole-unit changes.
    pub turbidity_min_step: i32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            turbidity_min_step: 10,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Control ---
    pub thresholds: ThresholdConfig,

    // --- Duty cycle ---
    pub cycle: CycleConfig,

    // --- Telemetry ---
    pub telemetry: TelemetryConfig,

    // --- Timing ---
    /// Sensor read + fan decision period (milliseconds)
    pub sensor_interval_ms: u32,
    /// Cooling loop logic period (milliseconds)
    pub cooling_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            cycle: CycleConfig::default(),
            telemetry: TelemetryConfig::default(),
            sensor_interval_ms: 1000, // 1 Hz
            cooling_interval_ms: 500, // 2 Hz
        }
    }
}

impl SystemConfig {
    /// Reject a loaded config that the controllers cannot run with.
    pub fn validate(&self) -> Result<(), &'static str> {
        for channel in Channel::ALL {
            if let Some(limits) = self.thresholds.limits(channel) {
                limits.validate()?;
            }
        }
        self.cycle.validate()?;
        if self.telemetry.turbidity_min_step <= 0 {
            return Err("turbidity_min_step must be positive");
        }
        if self.sensor_interval_ms == 0 || self.cooling_interval_ms == 0 {
            return Err("task intervals must be non-zero");
        }
        Ok(())
    }

    /// Compact binary encoding for flash-style storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

/// Physically plausible range of a channel's raw reading.  Values outside
/// it are treated as a failed read, never fed to the controllers.
pub const fn plausible_range(channel: Channel) -> (i32, i32) {
    match channel {
        Channel::Temperature => (-40, 85),
        Channel::Humidity => (0, 100),
        Channel::GasConcentration => (0, 10_000),
        Channel::CoolantTemperature => (-10, 100),
        Channel::Turbidity => (0, 4000),
        Channel::WaterLevel => (0, 100),
    }
}
