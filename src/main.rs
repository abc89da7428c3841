//! ClimateBox host simulator. Drives the control loop against a simulated
//! enclosure in accelerated time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimulatedEnclosure   LogEventSink   JsonConfigFile          │
//! │  (Sensor+Actuator)    (EventSink)    (ConfigPort)            │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ───────────────         │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          ControlLoopDriver (pure logic)                │  │
//! │  │  Fans · Cooling · DangerGuard · DutyCycle · Gates      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `climate-sim [config.json] [hours]`.  The log level is taken
//! from `CLIMATE_LOG` (default `info`).

use anyhow::{Context, Result, bail};
use log::{info, warn};

use climatebox::adapters::config_store::JsonConfigFile;
use climatebox::adapters::log_sink::LogEventSink;
use climatebox::adapters::sim::SimulatedEnclosure;
use climatebox::adapters::time::MonotonicClock;
use climatebox::app::commands::AppCommand;
use climatebox::app::events::AppEvent;
use climatebox::app::ports::{ConfigPort, ConfigStoreError, EventSink};
use climatebox::app::service::ControlLoopDriver;
use climatebox::config::SystemConfig;
use climatebox::gate::{OverrideMode, SchedulerMode};

/// Dispatch loop period of the simulation.
const STEP_MS: u64 = 500;
const MS_PER_HOUR: u64 = 3_600_000;

/// Forwards to the log sink and keeps a few counters for the summary.
#[derive(Default)]
struct SummarySink {
    inner: LogEventSink,
    dangers: u32,
    rejected: u32,
    cycle_events: u32,
}

impl EventSink for SummarySink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::DangerDetected { .. } => self.dangers += 1,
            AppEvent::ConfigRejected(_) => self.rejected += 1,
            AppEvent::Cycle { .. } => self.cycle_events += 1,
            _ => {}
        }
        self.inner.emit(event);
    }
}

fn load_config(path: Option<&str>) -> Result<SystemConfig> {
    let Some(path) = path else {
        info!("No config file given, using defaults");
        return Ok(SystemConfig::default());
    };
    match JsonConfigFile::new(path).load() {
        Ok(config) => Ok(config),
        Err(ConfigStoreError::NotFound) => {
            warn!("{} not found, using defaults", path);
            Ok(SystemConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("loading {}", path)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("CLIMATE_LOG", "info"))
        .try_init()
        .context("installing logger")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let hours: u64 = match args.get(1) {
        Some(h) => h.parse().with_context(|| format!("invalid hour count '{}'", h))?,
        None => 24,
    };
    if hours == 0 {
        bail!("hour count must be positive");
    }

    info!("ClimateBox simulator v{}", env!("CARGO_PKG_VERSION"));
    info!("Simulating {} h at {} ms steps", hours, STEP_MS);

    let clock = MonotonicClock::new();
    let mut hw = SimulatedEnclosure::new();
    let mut sink = SummarySink::default();
    let mut driver = ControlLoopDriver::new(config).context("building control loop")?;

    driver.start(0, &mut hw, &mut sink);
    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Enabled),
        0,
        &mut hw,
        &mut sink,
    );

    let end_ms = hours * MS_PER_HOUR;
    let mut now_ms = 0;
    while now_ms < end_ms {
        // A few scripted external events to exercise the gates.
        match now_ms {
            t if t == 5 * MS_PER_HOUR => {
                driver.handle_command(AppCommand::ChannelRestored, t, &mut hw, &mut sink);
            }
            t if t == 8 * MS_PER_HOUR => driver.handle_command(
                AppCommand::SetOverrideMode(OverrideMode::ManualDrain),
                t,
                &mut hw,
                &mut sink,
            ),
            t if t == 8 * MS_PER_HOUR + 300_000 => driver.handle_command(
                AppCommand::SetOverrideMode(OverrideMode::Normal),
                t,
                &mut hw,
                &mut sink,
            ),
            _ => {}
        }

        driver.tick(now_ms, &mut hw, &mut sink);
        hw.step(STEP_MS);
        now_ms += STEP_MS;
    }

    info!(
        "Done: {} ticks in {} ms wall time | {} cycle events | {} danger episodes | {} rejected writes",
        driver.tick_count(),
        clock.now_ms(),
        sink.cycle_events,
        sink.dangers,
        sink.rejected
    );
    Ok(())
}
