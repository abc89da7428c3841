//! Sticky band classification with hysteresis.
//!
//! ```text
//!   Low  │ hold │        Normal        │ hold │  High
//! ───────┼──────┼──────────────────────┼──────┼───────▶ value
//!       min   min+m                  max-m   max
//! ```
//!
//! The same rule applies to every banded channel.  Both boundaries are
//! inclusive: a reading exactly at `max` enters High, a reading exactly at
//! `max - margin` leaves it.

use serde::{Deserialize, Serialize};

use crate::config::ChannelLimits;

/// Every quantity the engine knows about.
///
/// The first four are banded (they have setpoints and danger limits);
/// `Turbidity` and `WaterLevel` are reported through telemetry only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channel {
    /// Enclosure air temperature (°C).
    Temperature = 0,
    /// Relative humidity (%).
    Humidity = 1,
    /// CO2 concentration (ppm).
    GasConcentration = 2,
    /// Cooling loop water temperature (°C).
    CoolantTemperature = 3,
    /// Water turbidity (NTU).
    Turbidity = 4,
    /// Reservoir level (%).
    WaterLevel = 5,
}

impl Channel {
    /// Total number of channels, used to size per-channel arrays.
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Temperature,
        Self::Humidity,
        Self::GasConcentration,
        Self::CoolantTemperature,
        Self::Turbidity,
        Self::WaterLevel,
    ];

    /// Channels feeding the intake/exhaust decision, in rule order.
    pub const FAN: [Self; 3] = [Self::Temperature, Self::Humidity, Self::GasConcentration];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bitmask used by the danger guard.
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }

    /// True if the channel has setpoints and danger limits.
    pub const fn is_banded(self) -> bool {
        matches!(
            self,
            Self::Temperature | Self::Humidity | Self::GasConcentration | Self::CoolantTemperature
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::GasConcentration => "co2",
            Self::CoolantTemperature => "coolant_temperature",
            Self::Turbidity => "turbidity",
            Self::WaterLevel => "water_level",
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sticky classification of one channel relative to its setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BandState {
    #[default]
    Normal,
    High,
    Low,
}

impl BandState {
    /// Apply the sticky transition rule for one reading.
    ///
    /// Entering a band wins over leaving the other one, so a reading can
    /// never be High and Low at once even with a degenerate config.
    pub fn next(self, value: i32, limits: &ChannelLimits) -> Self {
        let max = limits.max_setpoint;
        let min = limits.min_setpoint;
        let margin = limits.hysteresis_margin;

        if value >= max {
            return Self::High;
        }
        if value <= min {
            return Self::Low;
        }

        match self {
            Self::High if value <= max.saturating_sub(margin) => Self::Normal,
            Self::Low if value >= min.saturating_add(margin) => Self::Normal,
            held => held,
        }
    }
}

/// Band states of the three fan channels, indexed in [`Channel::FAN`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FanBands {
    pub temperature: BandState,
    pub humidity: BandState,
    pub gas: BandState,
}
