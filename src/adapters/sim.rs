//! Simulated enclosure for host runs and integration tests.
//!
//! A coarse first-order model: every quantity relaxes toward a target that
//! depends on which actuators are on.  Values are kept in milli-units and
//! read back as whole units, the way the real drivers round.
//!
//! Channels can be marked unavailable to exercise the hold-last-state path.

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::control::band::Channel;
use crate::control::cooling::CoolingOutputs;
use crate::control::fan::FanIntent;
use crate::error::SensorError;

/// Relaxation time constant for most quantities (ms).
const TAU_MS: i64 = 600_000;

/// Actuator state as last commanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimOutputs {
    pub fans: FanIntent,
    pub cooling: CoolingOutputs,
    pub light: bool,
    pub fogger: bool,
}

pub struct SimulatedEnclosure {
    /// Milli-units, indexed by [`Channel::index`].
    values: [i64; Channel::COUNT],
    /// Channels that currently fail to read.
    unavailable: u8,
    pub outputs: SimOutputs,
}

impl Default for SimulatedEnclosure {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEnclosure {
    pub fn new() -> Self {
        let mut values = [0; Channel::COUNT];
        values[Channel::Temperature.index()] = 24_000;
        values[Channel::Humidity.index()] = 75_000;
        values[Channel::GasConcentration.index()] = 600_000;
        values[Channel::CoolantTemperature.index()] = 24_000;
        values[Channel::Turbidity.index()] = 50_000;
        values[Channel::WaterLevel.index()] = 80_000;
        Self {
            values,
            unavailable: 0,
            outputs: SimOutputs::default(),
        }
    }

    /// Force a channel to a value (whole units).
    pub fn set(&mut self, channel: Channel, value: i32) {
        self.values[channel.index()] = i64::from(value) * 1000;
    }

    pub fn value(&self, channel: Channel) -> i32 {
        (self.values[channel.index()] / 1000) as i32
    }

    pub fn set_unavailable(&mut self, channel: Channel, unavailable: bool) {
        if unavailable {
            self.unavailable |= channel.mask();
        } else {
            self.unavailable &= !channel.mask();
        }
    }

    /// Advance the model by `dt_ms`.
    pub fn step(&mut self, dt_ms: u64) {
        let dt = dt_ms as i64;
        let o = self.outputs;
        let venting = o.fans.intake || o.fans.exhaust;

        let air_target = match (venting, o.light) {
            (true, _) => 22_000,
            (false, true) => 34_000,
            (false, false) => 28_000,
        };
        self.relax(Channel::Temperature, air_target, dt);

        let humidity_target = if o.fogger {
            100_000
        } else if o.fans.exhaust {
            55_000
        } else {
            80_000
        };
        self.relax(Channel::Humidity, humidity_target, dt);

        let gas_target = if o.fans.exhaust { 420_000 } else { 1_600_000 };
        self.relax(Channel::GasConcentration, gas_target, dt);

        let coolant_target = if o.cooling.cooling { 18_000 } else { 32_000 };
        self.relax(Channel::CoolantTemperature, coolant_target, dt);

        if o.cooling.drain {
            // 1 % per minute.
            let level = &mut self.values[Channel::WaterLevel.index()];
            *level = (*level - dt / 60).max(0);
            self.relax(Channel::Turbidity, 0, dt);
        } else {
            self.relax(Channel::Turbidity, 400_000, dt * 2);
        }
    }

    fn relax(&mut self, channel: Channel, target: i64, dt: i64) {
        let v = &mut self.values[channel.index()];
        *v += (target - *v) * dt.min(TAU_MS) / TAU_MS;
    }
}

impl SensorPort for SimulatedEnclosure {
    fn read_channel(&mut self, channel: Channel) -> Result<i32, SensorError> {
        if self.unavailable & channel.mask() != 0 {
            return Err(SensorError::Unavailable);
        }
        Ok(self.value(channel))
    }
}

impl ActuatorPort for SimulatedEnclosure {
    fn apply_fans(&mut self, intent: FanIntent) {
        self.outputs.fans = intent;
    }

    fn apply_cooling(&mut self, outputs: CoolingOutputs) {
        self.outputs.cooling = outputs;
    }

    fn set_light(&mut self, on: bool) {
        self.outputs.light = on;
    }

    fn set_fogger(&mut self, on: bool) {
        self.outputs.fogger = on;
    }
}
