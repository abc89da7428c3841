//! Light/fog duty-cycle scheduler.
//!
//! Runs a repeating 12-hour cycle: `light_on_hours` of light followed by
//! darkness for the rest of the cycle.  Each light phase carries two fogger
//! pulses, one at the start and one halfway through.
//!
//! ```text
//!  enable()
//!    │
//!    ▼            +h/2            +h                +12h
//!  LightOn ──────────┬─────────────▶ LightOff ──────────▶ LightOn ─▶ ...
//!  light on          │               light off
//!  pulse             pulse
//! ```
//!
//! Instead of chained callback timers the scheduler keeps at most one phase
//! deadline and one pulse deadline.  The driver loop calls [`advance`] with
//! the current monotonic time; every deadline at or before `now` is
//! processed in time order.  Cancelling a timer means dropping its
//! deadline, so a cancelled timer can never fire.
//!
//! Follow-up deadlines are computed from the deadline that fired rather
//! than from `now`, which keeps the cycle exactly periodic even when
//! `advance` runs late.
//!
//! [`advance`]: DutyCycleScheduler::advance

use log::{debug, info, warn};

use crate::app::ports::{CycleDelegate, CycleEvent};
use crate::config::CycleConfig;
use crate::error::{self, ConfigError, Error};

const MS_PER_SEC: u64 = 1000;
const MS_PER_HOUR: u64 = 3600 * MS_PER_SEC;

/// Top-level scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// Scheduler disabled; light and fogger off.
    Idle,
    LightOn,
    LightOff,
}

/// What the pending phase deadline will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseStep {
    /// Second fogger pulse in the middle of the light phase.
    HalfwayPulse,
    /// End of the light phase.
    LightsOut,
    /// End of the dark phase; the cycle restarts.
    LightsUp,
}

#[derive(Debug, Clone, Copy)]
struct PhaseTimer {
    at_ms: u64,
    step: PhaseStep,
}

/// The duty-cycle scheduler.
pub struct DutyCycleScheduler {
    config: CycleConfig,
    phase: CyclePhase,
    light: bool,
    fogger: bool,
    /// Start of the current light phase.
    phase_started_ms: u64,
    phase_timer: Option<PhaseTimer>,
    /// Fogger switches off at this time.  `Some` means a pulse is active.
    pulse_deadline_ms: Option<u64>,
}

impl DutyCycleScheduler {
    /// Build an idle scheduler.  The config is checked here so the phase
    /// arithmetic never sees an on-duration of 12 h or more.
    pub fn new(config: CycleConfig) -> error::Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self {
            config,
            phase: CyclePhase::Idle,
            light: false,
            fogger: false,
            phase_started_ms: 0,
            phase_timer: None,
            pulse_deadline_ms: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start a fresh cycle from LightOn.  Calling it while a cycle runs
    /// restarts from the beginning, it never resumes mid-cycle.
    pub fn enable(&mut self, now_ms: u64, delegate: &mut dyn CycleDelegate) {
        self.cancel_timers(now_ms, delegate);
        info!(
            "Cycle: enabled ({}h light, {}s pulses)",
            self.config.light_on_hours, self.config.fogger_pulse_secs
        );
        self.enter_light_on(now_ms, delegate);
    }

    /// Stop everything immediately.  Always succeeds.
    pub fn disable(&mut self, now_ms: u64, delegate: &mut dyn CycleDelegate) {
        self.cancel_timers(now_ms, delegate);
        self.set_light(false, now_ms, delegate);
        if self.phase != CyclePhase::Idle {
            info!("Cycle: disabled");
        }
        self.phase = CyclePhase::Idle;
    }

    /// Request a fogger pulse.  No-op while a pulse is active or the light
    /// is off.  Returns `true` if a pulse started.
    pub fn pulse(&mut self, now_ms: u64, delegate: &mut dyn CycleDelegate) -> bool {
        if self.pulse_deadline_ms.is_some() || !self.light {
            debug!("Cycle: pulse request ignored");
            return false;
        }
        self.set_fogger(true, now_ms, delegate);
        self.pulse_deadline_ms =
            Some(now_ms + u64::from(self.config.fogger_pulse_secs) * MS_PER_SEC);
        true
    }

    /// Process every deadline at or before `now_ms`, oldest first.
    pub fn advance(&mut self, now_ms: u64, delegate: &mut dyn CycleDelegate) {
        loop {
            let pulse_due = self.pulse_deadline_ms.filter(|&at| at <= now_ms);
            let phase_due = self.phase_timer.filter(|t| t.at_ms <= now_ms);

            match (pulse_due, phase_due) {
                // A pulse ending at the same instant as a phase step ends first.
                (Some(at), Some(timer)) if at <= timer.at_ms => self.end_pulse(at, delegate),
                (_, Some(timer)) => self.fire_phase(timer, delegate),
                (Some(at), None) => self.end_pulse(at, delegate),
                (None, None) => break,
            }
        }
    }

    // ── Reconfiguration ───────────────────────────────────────

    /// Change the light duration.  Only accepted while idle.
    pub fn set_light_on_hours(&mut self, hours: u8) -> Result<(), ConfigError> {
        let retained = i32::from(self.config.light_on_hours);
        if self.phase != CyclePhase::Idle {
            warn!("Cycle: light_on_hours change rejected while running");
            return Err(ConfigError::ReconfigurationWhileActive {
                field: "light_on_hours",
                retained,
            });
        }
        if !CycleConfig::light_on_hours_valid(hours) {
            warn!("Cycle: light_on_hours {} out of range", hours);
            return Err(ConfigError::InvalidConfiguration {
                field: "light_on_hours",
                retained,
            });
        }
        self.config.light_on_hours = hours;
        info!("Cycle: light_on_hours = {}", hours);
        Ok(())
    }

    /// Change the fogger pulse length.  Only accepted while idle.
    pub fn set_fogger_pulse_secs(&mut self, secs: u16) -> Result<(), ConfigError> {
        let retained = i32::from(self.config.fogger_pulse_secs);
        if self.phase != CyclePhase::Idle {
            warn!("Cycle: fogger_pulse_secs change rejected while running");
            return Err(ConfigError::ReconfigurationWhileActive {
                field: "fogger_pulse_secs",
                retained,
            });
        }
        if !CycleConfig::pulse_secs_valid(secs) {
            warn!("Cycle: fogger_pulse_secs {} out of range", secs);
            return Err(ConfigError::InvalidConfiguration {
                field: "fogger_pulse_secs",
                retained,
            });
        }
        self.config.fogger_pulse_secs = secs;
        info!("Cycle: fogger_pulse_secs = {}", secs);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn is_light_on(&self) -> bool {
        self.light
    }

    pub fn is_fogger_on(&self) -> bool {
        self.fogger
    }

    pub fn config(&self) -> CycleConfig {
        self.config
    }

    /// Number of armed deadlines (phase + pulse), at most two.
    pub fn pending_timers(&self) -> usize {
        usize::from(self.phase_timer.is_some()) + usize::from(self.pulse_deadline_ms.is_some())
    }

    /// Earliest armed deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        let phase = self.phase_timer.map(|t| t.at_ms);
        match (phase, self.pulse_deadline_ms) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn light_on_ms(&self) -> u64 {
        u64::from(self.config.light_on_hours) * MS_PER_HOUR
    }

    fn light_off_ms(&self) -> u64 {
        u64::from(CycleConfig::CYCLE_HOURS - self.config.light_on_hours) * MS_PER_HOUR
    }

    fn enter_light_on(&mut self, at_ms: u64, delegate: &mut dyn CycleDelegate) {
        self.phase = CyclePhase::LightOn;
        self.phase_started_ms = at_ms;
        self.set_light(true, at_ms, delegate);
        self.pulse(at_ms, delegate);
        self.phase_timer = Some(PhaseTimer {
            at_ms: at_ms + self.light_on_ms() / 2,
            step: PhaseStep::HalfwayPulse,
        });
    }

    fn enter_light_off(&mut self, at_ms: u64, delegate: &mut dyn CycleDelegate) {
        self.phase = CyclePhase::LightOff;
        self.set_light(false, at_ms, delegate);
        self.phase_timer = Some(PhaseTimer {
            at_ms: at_ms + self.light_off_ms(),
            step: PhaseStep::LightsUp,
        });
    }

    fn fire_phase(&mut self, timer: PhaseTimer, delegate: &mut dyn CycleDelegate) {
        self.phase_timer = None;
        match timer.step {
            PhaseStep::HalfwayPulse => {
                self.pulse(timer.at_ms, delegate);
                self.phase_timer = Some(PhaseTimer {
                    at_ms: self.phase_started_ms + self.light_on_ms(),
                    step: PhaseStep::LightsOut,
                });
            }
            PhaseStep::LightsOut => self.enter_light_off(timer.at_ms, delegate),
            PhaseStep::LightsUp => self.enter_light_on(timer.at_ms, delegate),
        }
    }

    fn end_pulse(&mut self, at_ms: u64, delegate: &mut dyn CycleDelegate) {
        self.pulse_deadline_ms = None;
        self.set_fogger(false, at_ms, delegate);
    }

    /// Drop both deadlines and stop any running pulse.
    fn cancel_timers(&mut self, now_ms: u64, delegate: &mut dyn CycleDelegate) {
        self.phase_timer = None;
        self.pulse_deadline_ms = None;
        self.set_fogger(false, now_ms, delegate);
    }

    fn set_light(&mut self, on: bool, at_ms: u64, delegate: &mut dyn CycleDelegate) {
        if self.light != on {
            self.light = on;
            let event = if on { CycleEvent::LightOn } else { CycleEvent::LightOff };
            delegate.on_cycle_event(event, at_ms);
        }
    }

    fn set_fogger(&mut self, on: bool, at_ms: u64, delegate: &mut dyn CycleDelegate) {
        if self.fogger != on {
            self.fogger = on;
            let event = if on { CycleEvent::FoggerOn } else { CycleEvent::FoggerOff };
            delegate.on_cycle_event(event, at_ms);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
