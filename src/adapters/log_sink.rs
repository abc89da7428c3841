//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (serial console on target, stderr on host).  A
//! dashboard-sync adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::control::band::Channel;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Render a danger bitmask as channel names.
fn channel_names(mask: u8) -> String {
    Channel::ALL
        .iter()
        .filter(|c| mask & c.mask() != 0)
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(",")
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START"),
            AppEvent::Telemetry { channel, value } => {
                info!("TELEM | {}={}", channel, value);
            }
            AppEvent::SensorUnavailable { channel, error } => {
                warn!("SENSOR | {} unavailable: {}", channel, error);
            }
            AppEvent::DangerDetected {
                subsystem,
                channels,
            } => {
                error!(
                    "DANGER | {:?} emergency active [{}]",
                    subsystem,
                    channel_names(*channels)
                );
            }
            AppEvent::DangerCleared { subsystem } => {
                info!("DANGER | {:?} cleared", subsystem);
            }
            AppEvent::ThresholdUpdated {
                channel,
                bound,
                value,
            } => {
                info!("CONFIG | {} {:?} = {}", channel, bound, value);
            }
            AppEvent::ConfigRejected(e) => {
                warn!("CONFIG | rejected: {} (echo {}={})", e, e.field(), e.retained());
            }
            AppEvent::CycleConfigUpdated {
                light_on_hours,
                fogger_pulse_secs,
            } => {
                info!(
                    "CONFIG | cycle light={}h pulse={}s",
                    light_on_hours, fogger_pulse_secs
                );
            }
            AppEvent::SchedulerModeChanged(mode) => info!("MODE | cycle {:?}", mode),
            AppEvent::OverrideModeChanged(mode) => info!("MODE | cooling {:?}", mode),
            AppEvent::Cycle { event, at_ms } => {
                info!("CYCLE | {:?} at {} ms", event, at_ms);
            }
        }
    }
}
