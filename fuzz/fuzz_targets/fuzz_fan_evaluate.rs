//! Fuzz target: `fan::evaluate`
//!
//! Builds readings and a prior band state from raw bytes and checks the
//! danger path: any channel at a danger limit yields the emergency intent
//! and leaves the prior bands untouched.
//!
//! cargo fuzz run fuzz_fan_evaluate

#![no_main]

use climatebox::config::ThresholdConfig;
use climatebox::control::band::{BandState, FanBands};
use climatebox::control::fan::{self, FanIntent, FanReadings};
use libfuzzer_sys::fuzz_target;

fn band(b: u8) -> BandState {
    match b % 3 {
        0 => BandState::Normal,
        1 => BandState::High,
        _ => BandState::Low,
    }
}

fn word(data: &[u8], i: usize) -> i32 {
    let mut w = [0u8; 2];
    for (k, slot) in w.iter_mut().enumerate() {
        *slot = data.get(i * 2 + k).copied().unwrap_or(0);
    }
    i32::from(i16::from_le_bytes(w))
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 9 {
        return;
    }
    let thresholds = ThresholdConfig::default();
    let readings = FanReadings {
        temperature: word(data, 0),
        humidity: word(data, 1),
        gas: word(data, 2),
    };
    let prior = FanBands {
        temperature: band(data[6]),
        humidity: band(data[7]),
        gas: band(data[8]),
    };

    let decision = fan::evaluate(&readings, &thresholds, prior);

    let dangerous = thresholds.temperature.is_dangerous(readings.temperature)
        || thresholds.humidity.is_dangerous(readings.humidity)
        || thresholds.gas.is_dangerous(readings.gas);
    assert_eq!(dangerous, decision.danger != 0);
    if dangerous {
        assert_eq!(decision.intent, FanIntent::EMERGENCY);
        assert_eq!(decision.bands, prior);
    } else if decision.bands.temperature == BandState::High {
        assert!(decision.intent.intake && decision.intent.exhaust);
    }
});
