//! Hardware adapter: bridges relay outputs to the [`ActuatorPort`].
//!
//! Every actuator in the enclosure is an on/off relay or MOSFET driven by
//! one GPIO.  The pins are taken as [`embedded_hal::digital::OutputPin`]s,
//! so the same adapter runs on any HAL that implements embedded-hal 1.0.
//!
//! ## Failure handling
//!
//! A failed pin write is logged and the cached state is left unchanged, so
//! [`RelayPin::is_on`] keeps reporting what the hardware last accepted.
//! The next control cycle rewrites the full intent anyway.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::app::ports::ActuatorPort;
use crate::control::cooling::CoolingOutputs;
use crate::control::fan::FanIntent;

/// One relay channel with its drive polarity.
pub struct RelayPin<P> {
    name: &'static str,
    pin: P,
    /// Relay boards commonly switch on a low level.
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> RelayPin<P> {
    pub fn new(name: &'static str, pin: P, active_low: bool) -> Self {
        Self {
            name,
            pin,
            active_low,
            on: false,
        }
    }

    pub fn set(&mut self, on: bool) {
        let level = PinState::from(on != self.active_low);
        match self.pin.set_state(level) {
            Ok(()) => self.on = on,
            Err(e) => warn!("Relay {}: write failed ({:?})", self.name, e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

/// Concrete adapter that owns every relay behind the actuator port.
pub struct GpioActuators<P> {
    pub intake: RelayPin<P>,
    pub exhaust: RelayPin<P>,
    pub cooling: RelayPin<P>,
    pub drain: RelayPin<P>,
    pub light: RelayPin<P>,
    pub fogger: RelayPin<P>,
}

impl<P: OutputPin> ActuatorPort for GpioActuators<P> {
    fn apply_fans(&mut self, intent: FanIntent) {
        self.intake.set(intent.intake);
        self.exhaust.set(intent.exhaust);
    }

    fn apply_cooling(&mut self, outputs: CoolingOutputs) {
        // Break before make: never run the drain with the loop pump on.
        if outputs.drain {
            self.cooling.set(outputs.cooling);
            self.drain.set(true);
        } else {
            self.drain.set(false);
            self.cooling.set(outputs.cooling);
        }
    }

    fn set_light(&mut self, on: bool) {
        self.light.set(on);
    }

    fn set_fogger(&mut self, on: bool) {
        self.fogger.set(on);
    }
}
