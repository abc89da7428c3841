//! Control loop driver: the hexagonal core.
//!
//! [`ControlLoopDriver`] owns every controller instance for one enclosure
//! and dispatches three independent tasks from a single cooperative loop:
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │      ControlLoopDriver       │
//! ActuatorPort ◀──│  Fans · Cooling · DutyCycle  │
//!                 │  DangerGuard · Gates         │
//!                 └──────────────────────────────┘
//! ```
//!
//! | task                 | period                | work                                   |
//! |----------------------|-----------------------|----------------------------------------|
//! | sensor + fans        | `sensor_interval_ms`  | read, telemetry, danger, fan decision  |
//! | cooling              | `cooling_interval_ms` | override gate, thermostat              |
//! | duty cycle           | every tick            | [`DutyCycleScheduler::advance`]        |
//!
//! All state is owned by the driver and only mutated through `&mut self`,
//! so each task runs to completion before the next one starts.  On a
//! multi-threaded host, wrap the driver in a single exclusive owner.

use log::{debug, info, warn};

use crate::config::{SystemConfig, plausible_range};
use crate::control::band::{Channel, FanBands};
use crate::control::cooling::{CoolingController, CoolingOutputs};
use crate::control::fan::{FanController, FanIntent, FanReadings};
use crate::error::{self, ConfigError, Error, SensorError};
use crate::gate::{ModeGate, OverrideMode, SchedulerMode};
use crate::safety::{DangerEdge, DangerGuard, danger_mask};
use crate::scheduler::DutyCycleScheduler;
use crate::telemetry::TelemetryDebouncer;

use super::commands::AppCommand;
use super::events::{AppEvent, Subsystem};
use super::ports::{ActuatorPort, CycleDelegate, CycleEvent, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// Cycle delegate bridge
// ───────────────────────────────────────────────────────────────

/// Forwards scheduler changes to the hardware and the event sink.
struct CycleBridge<'a, A, E> {
    hw: &'a mut A,
    sink: &'a mut E,
}

impl<A: ActuatorPort, E: EventSink> CycleDelegate for CycleBridge<'_, A, E> {
    fn on_cycle_event(&mut self, event: CycleEvent, at_ms: u64) {
        match event {
            CycleEvent::LightOn => self.hw.set_light(true),
            CycleEvent::LightOff => self.hw.set_light(false),
            CycleEvent::FoggerOn => self.hw.set_fogger(true),
            CycleEvent::FoggerOff => self.hw.set_fogger(false),
        }
        self.sink.emit(&AppEvent::Cycle { event, at_ms });
    }
}

// ───────────────────────────────────────────────────────────────
// ControlLoopDriver
// ───────────────────────────────────────────────────────────────

/// The periodic caller that orchestrates all decision logic.
pub struct ControlLoopDriver {
    config: SystemConfig,
    fans: FanController,
    fan_guard: DangerGuard,
    cooling: CoolingController,
    cooling_guard: DangerGuard,
    scheduler: DutyCycleScheduler,
    scheduler_gate: ModeGate<SchedulerMode>,
    override_gate: ModeGate<OverrideMode>,
    telemetry: TelemetryDebouncer,
    /// Last fan intent written to the hardware.
    fan_intent: FanIntent,
    /// Last cooling outputs written to the hardware.
    cooling_outputs: CoolingOutputs,
    /// Coolant reading from the most recent sensor task, `None` if it failed.
    coolant: Option<i32>,
    next_sensor_ms: u64,
    next_cooling_ms: u64,
    tick_count: u64,
}

impl ControlLoopDriver {
    /// Construct the driver.  Does **not** touch hardware; call [`start`]
    /// next.  A config that fails [`SystemConfig::validate`] is rejected.
    ///
    /// [`start`]: Self::start
    pub fn new(config: SystemConfig) -> error::Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self {
            fans: FanController::new(),
            fan_guard: DangerGuard::new("fans"),
            cooling: CoolingController::new(),
            cooling_guard: DangerGuard::new("cooling"),
            scheduler: DutyCycleScheduler::new(config.cycle)?,
            scheduler_gate: ModeGate::new("cycle", SchedulerMode::Disabled),
            override_gate: ModeGate::new("drain", OverrideMode::Normal),
            telemetry: TelemetryDebouncer::new(&config.telemetry),
            fan_intent: FanIntent::OFF,
            cooling_outputs: CoolingOutputs::OFF,
            coolant: None,
            next_sensor_ms: 0,
            next_cooling_ms: 0,
            tick_count: 0,
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every actuator to its safe state and schedule both periodic
    /// tasks to run on the first tick.
    pub fn start(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.apply_fans(FanIntent::OFF);
        hw.apply_cooling(CoolingOutputs::OFF);
        hw.set_light(false);
        hw.set_fogger(false);
        self.next_sensor_ms = now_ms;
        self.next_cooling_ms = now_ms;
        sink.emit(&AppEvent::Started);
        info!("ControlLoopDriver started at {} ms", now_ms);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run whichever tasks are due at `now_ms`.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        if now_ms >= self.next_sensor_ms {
            self.sensor_task(hw, sink);
            self.next_sensor_ms = next_due(self.next_sensor_ms, self.config.sensor_interval_ms, now_ms);
        }

        if now_ms >= self.next_cooling_ms {
            self.cooling_task(hw, sink);
            self.next_cooling_ms =
                next_due(self.next_cooling_ms, self.config.cooling_interval_ms, now_ms);
        }

        let mut bridge = CycleBridge { hw, sink };
        self.scheduler.advance(now_ms, &mut bridge);
    }

    /// Read every channel, report changes and decide the fans.
    fn sensor_task(&mut self, hw: &mut (impl SensorPort + ActuatorPort), sink: &mut impl EventSink) {
        let mut values = [None; Channel::COUNT];

        for channel in Channel::ALL {
            match read_plausible(hw, channel) {
                Ok(value) => {
                    values[channel.index()] = Some(value);
                    if let Some(v) = self.telemetry.observe(channel, value) {
                        sink.emit(&AppEvent::Telemetry { channel, value: v });
                    }
                }
                Err(error) => {
                    warn!("Sensor {channel}: {error}");
                    sink.emit(&AppEvent::SensorUnavailable { channel, error });
                }
            }
        }

        self.coolant = values[Channel::CoolantTemperature.index()];

        let fan_value = |channel: Channel| values[channel.index()];
        match (
            fan_value(Channel::Temperature),
            fan_value(Channel::Humidity),
            fan_value(Channel::GasConcentration),
        ) {
            (Some(temperature), Some(humidity), Some(gas)) => {
                let readings = FanReadings {
                    temperature,
                    humidity,
                    gas,
                };
                let decision = self.fans.step(&readings, &self.config.thresholds);
                report_danger(&mut self.fan_guard, decision.danger, Subsystem::Fans, sink);
                self.set_fan_intent(decision.intent);
            }
            _ => {
                // Partial snapshot: bands are not touched, but a danger on
                // any channel that did read still forces venting.
                let danger = Channel::FAN.iter().fold(0, |mask, &channel| {
                    match fan_value(channel) {
                        Some(value) => {
                            mask | danger_mask(&self.config.thresholds, &[(channel, value)])
                        }
                        None => mask,
                    }
                });
                if danger != 0 {
                    report_danger(&mut self.fan_guard, danger, Subsystem::Fans, sink);
                    self.set_fan_intent(FanIntent::EMERGENCY);
                }
            }
        }

        // Unavailable readings hold the previous intent.
        hw.apply_fans(self.fan_intent);
    }

    fn set_fan_intent(&mut self, intent: FanIntent) {
        if intent != self.fan_intent {
            debug!("Fans: {:?} -> {:?}", self.fan_intent, intent);
        }
        self.fan_intent = intent;
    }

    /// Apply the drain override or run the cooling thermostat.
    fn cooling_task(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if self.override_gate.is_engaged() {
            self.cooling_outputs = CoolingOutputs::MANUAL_DRAIN;
        } else if let Some(value) = self.coolant {
            let decision = self.cooling.step(value, &self.config.thresholds.coolant);
            report_danger(&mut self.cooling_guard, decision.danger, Subsystem::Cooling, sink);
            self.cooling_outputs = decision.outputs;
        } else if self.cooling_outputs == CoolingOutputs::MANUAL_DRAIN {
            // Override cleared without a reading: hold the thermostat's own
            // state instead of the drain pattern.
            self.cooling_outputs = self.cooling.outputs();
        }
        hw.apply_cooling(self.cooling_outputs);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external write (dashboard, console, button).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SetThreshold {
                channel,
                bound,
                value,
            } => match self.config.thresholds.set_threshold(channel, bound, value) {
                Ok(()) => {
                    info!("Threshold {channel} {bound:?} = {value}");
                    sink.emit(&AppEvent::ThresholdUpdated {
                        channel,
                        bound,
                        value,
                    });
                }
                Err(e) => reject(e, sink),
            },
            AppCommand::SetSchedulerMode(mode) => {
                let changed = self.scheduler_gate.set(mode);
                self.apply_scheduler_mode(mode, changed, now_ms, hw, sink);
            }
            AppCommand::SetOverrideMode(mode) => {
                let changed = self.override_gate.set(mode);
                self.apply_override_mode(mode, changed, hw, sink);
            }
            AppCommand::SetLightOnHours(hours) => match self.scheduler.set_light_on_hours(hours) {
                Ok(()) => self.cycle_config_updated(sink),
                Err(e) => reject(e, sink),
            },
            AppCommand::SetFoggerPulseSecs(secs) => {
                match self.scheduler.set_fogger_pulse_secs(secs) {
                    Ok(()) => self.cycle_config_updated(sink),
                    Err(e) => reject(e, sink),
                }
            }
            AppCommand::RequestFoggerPulse => {
                let mut bridge = CycleBridge { hw, sink };
                self.scheduler.pulse(now_ms, &mut bridge);
            }
            AppCommand::ChannelRestored => {
                info!("Remote channel restored, reapplying last known modes");
                self.telemetry.invalidate();
                let scheduler_mode = self.scheduler_gate.restore();
                self.apply_scheduler_mode(scheduler_mode, true, now_ms, hw, sink);
                let override_mode = self.override_gate.restore();
                self.apply_override_mode(override_mode, true, hw, sink);
            }
        }
    }

    /// `announce` is false when the gate already held `mode`; the mode is
    /// still applied, only the event is skipped.
    fn apply_scheduler_mode(
        &mut self,
        mode: SchedulerMode,
        announce: bool,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if announce {
            sink.emit(&AppEvent::SchedulerModeChanged(mode));
        }
        let mut bridge = CycleBridge { hw, sink };
        match mode {
            SchedulerMode::Enabled => self.scheduler.enable(now_ms, &mut bridge),
            SchedulerMode::Disabled => self.scheduler.disable(now_ms, &mut bridge),
        }
    }

    /// Engaging takes effect immediately.  Clearing leaves the outputs
    /// alone until the next cooling tick re-evaluates the thermostat.
    fn apply_override_mode(
        &mut self,
        mode: OverrideMode,
        announce: bool,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if announce {
            sink.emit(&AppEvent::OverrideModeChanged(mode));
        }
        if mode == OverrideMode::ManualDrain {
            self.cooling_outputs = CoolingOutputs::MANUAL_DRAIN;
            hw.apply_cooling(self.cooling_outputs);
        }
    }

    fn cycle_config_updated(&mut self, sink: &mut impl EventSink) {
        let cycle = self.scheduler.config();
        self.config.cycle = cycle;
        sink.emit(&AppEvent::CycleConfigUpdated {
            light_on_hours: cycle.light_on_hours,
            fogger_pulse_secs: cycle.fogger_pulse_secs,
        });
    }

    // ── Queries ───────────────────────────────────────────────

    /// Fan intent most recently written to the hardware.
    pub fn fan_intent(&self) -> FanIntent {
        self.fan_intent
    }

    pub fn fan_bands(&self) -> FanBands {
        self.fans.bands()
    }

    /// Cooling outputs most recently written to the hardware.
    pub fn cooling_outputs(&self) -> CoolingOutputs {
        self.cooling_outputs
    }

    pub fn scheduler(&self) -> &DutyCycleScheduler {
        &self.scheduler
    }

    pub fn scheduler_mode(&self) -> SchedulerMode {
        self.scheduler_gate.mode()
    }

    pub fn override_mode(&self) -> OverrideMode {
        self.override_gate.mode()
    }

    /// Channels currently at a danger limit, across both subsystems.
    pub fn danger_flags(&self) -> u8 {
        self.fan_guard.flags() | self.cooling_guard.flags()
    }

    /// Total ticks executed since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Clone of the live configuration (for read-back or persistence).
    pub fn current_config(&self) -> SystemConfig {
        self.config.clone()
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Read a channel and reject physically implausible values.
fn read_plausible(hw: &mut impl SensorPort, channel: Channel) -> Result<i32, SensorError> {
    let value = hw.read_channel(channel)?;
    let (lo, hi) = plausible_range(channel);
    if (lo..=hi).contains(&value) {
        Ok(value)
    } else {
        Err(SensorError::OutOfRange)
    }
}

/// Next run time of a periodic task.  A task that fell behind skips the
/// missed runs instead of bursting.
fn next_due(prev_due: u64, interval_ms: u32, now_ms: u64) -> u64 {
    let next = prev_due + u64::from(interval_ms);
    if next <= now_ms {
        now_ms + u64::from(interval_ms)
    } else {
        next
    }
}

fn report_danger(guard: &mut DangerGuard, mask: u8, subsystem: Subsystem, sink: &mut impl EventSink) {
    match guard.observe(mask) {
        DangerEdge::Raised(channels) => sink.emit(&AppEvent::DangerDetected {
            subsystem,
            channels,
        }),
        DangerEdge::Cleared => sink.emit(&AppEvent::DangerCleared { subsystem }),
        DangerEdge::Unchanged => {}
    }
}

fn reject(e: ConfigError, sink: &mut impl EventSink) {
    warn!("Config write rejected: {e}");
    sink.emit(&AppEvent::ConfigRejected(e));
}
