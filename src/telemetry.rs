//! Change-only telemetry.
//!
//! The remote dashboard only needs a reading when it moved by at least the
//! channel's minimum step since the last report.  Every channel reports
//! whole-unit changes except turbidity, whose step is configurable.

use crate::config::TelemetryConfig;
use crate::control::band::Channel;

pub struct TelemetryDebouncer {
    last: [Option<i32>; Channel::COUNT],
    steps: [i32; Channel::COUNT],
}

impl TelemetryDebouncer {
    pub fn new(config: &TelemetryConfig) -> Self {
        let mut steps = [1; Channel::COUNT];
        steps[Channel::Turbidity.index()] = config.turbidity_min_step.max(1);
        Self {
            last: [None; Channel::COUNT],
            steps,
        }
    }

    /// Returns the value if it should be reported, and remembers it.
    pub fn observe(&mut self, channel: Channel, value: i32) -> Option<i32> {
        let slot = &mut self.last[channel.index()];
        let report = match *slot {
            None => true,
            Some(prev) => value.abs_diff(prev) >= self.steps[channel.index()].unsigned_abs(),
        };
        if report {
            *slot = Some(value);
            Some(value)
        } else {
            None
        }
    }

    /// Forget what was reported so every channel is sent again.
    pub fn invalidate(&mut self) {
        self.last = [None; Channel::COUNT];
    }

    /// Last value reported for `channel`.
    pub fn last_reported(&self, channel: Channel) -> Option<i32> {
        self.last[channel.index()]
    }
}
