//! Periodic task tests: sensor read → danger guard → fan decision, and the
//! cooling thermostat, all driven through `ControlLoopDriver::tick`.

use crate::mock_hw::{ActuatorCall, EventLog, MockHardware};

use climatebox::app::events::{AppEvent, Subsystem};
use climatebox::app::service::ControlLoopDriver;
use climatebox::config::SystemConfig;
use climatebox::control::band::{BandState, Channel};
use climatebox::control::cooling::CoolingOutputs;
use climatebox::control::fan::FanIntent;
use climatebox::error::SensorError;

const BOTH: FanIntent = FanIntent {
    intake: true,
    exhaust: true,
};

const COOLING_ON: CoolingOutputs = CoolingOutputs {
    cooling: true,
    drain: false,
};

fn make_driver() -> (ControlLoopDriver, MockHardware, EventLog) {
    let mut driver = ControlLoopDriver::new(SystemConfig::default()).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = EventLog::new();
    driver.start(0, &mut hw, &mut sink);
    (driver, hw, sink)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_drives_every_actuator_off() {
    let (_driver, hw, sink) = make_driver();
    assert_eq!(
        hw.calls,
        vec![
            ActuatorCall::Fans(FanIntent::OFF),
            ActuatorCall::Cooling(CoolingOutputs::OFF),
            ActuatorCall::Light(false),
            ActuatorCall::Fogger(false),
        ]
    );
    assert_eq!(sink.events, vec![AppEvent::Started]);
}

#[test]
fn calm_readings_keep_fans_off() {
    let (mut driver, mut hw, mut sink) = make_driver();
    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(hw.last_fans(), Some(FanIntent::OFF));
    assert_eq!(hw.last_cooling(), Some(CoolingOutputs::OFF));
    assert_eq!(driver.danger_flags(), 0);
}

// ── Task cadence ──────────────────────────────────────────────

#[test]
fn sensor_and_cooling_tasks_run_on_their_own_periods() {
    let (mut driver, mut hw, mut sink) = make_driver();
    hw.calls.clear();

    // 2 s at 250 ms ticks: sensor every 1000 ms, cooling every 500 ms.
    for t in (0..2000).step_by(250) {
        driver.tick(t, &mut hw, &mut sink);
    }

    let fans = hw
        .calls
        .iter()
        .filter(|c| matches!(c, ActuatorCall::Fans(_)))
        .count();
    let cooling = hw
        .calls
        .iter()
        .filter(|c| matches!(c, ActuatorCall::Cooling(_)))
        .count();
    assert_eq!(fans, 2);
    assert_eq!(cooling, 4);
    assert_eq!(driver.tick_count(), 8);
}

#[test]
fn stalled_loop_runs_each_task_once_on_resume() {
    let (mut driver, mut hw, mut sink) = make_driver();
    driver.tick(0, &mut hw, &mut sink);
    hw.calls.clear();

    driver.tick(10_000, &mut hw, &mut sink);
    assert_eq!(hw.count(ActuatorCall::Fans(FanIntent::OFF)), 1);
    assert_eq!(hw.count(ActuatorCall::Cooling(CoolingOutputs::OFF)), 1);
}

// ── Fan hysteresis through the driver ─────────────────────────

#[test]
fn temperature_high_band_holds_through_dead_zone() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.set(Channel::Temperature, 32);
    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(driver.fan_bands().temperature, BandState::High);
    assert_eq!(hw.last_fans(), Some(BOTH));

    hw.set(Channel::Temperature, 29);
    driver.tick(1000, &mut hw, &mut sink);
    assert_eq!(driver.fan_bands().temperature, BandState::High);
    assert_eq!(hw.last_fans(), Some(BOTH));

    hw.set(Channel::Temperature, 27);
    driver.tick(2000, &mut hw, &mut sink);
    assert_eq!(driver.fan_bands().temperature, BandState::Normal);
    assert_eq!(hw.last_fans(), Some(FanIntent::OFF));
}

#[test]
fn humidity_and_gas_combine_with_or() {
    let (mut driver, mut hw, mut sink) = make_driver();

    // Temperature low asks for intake, humidity high for exhaust.
    hw.set(Channel::Temperature, 17);
    hw.set(Channel::Humidity, 92);
    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(hw.last_fans(), Some(BOTH));

    // Humidity low never switches the exhaust off on its own.
    hw.set(Channel::Temperature, 24);
    hw.set(Channel::Humidity, 55);
    hw.set(Channel::GasConcentration, 1200);
    driver.tick(1000, &mut hw, &mut sink);
    assert_eq!(
        hw.last_fans(),
        Some(FanIntent {
            intake: false,
            exhaust: true,
        })
    );
}

// ── Danger escalation ─────────────────────────────────────────

#[test]
fn gas_danger_forces_exhaust_and_preserves_bands() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.set(Channel::Temperature, 32);
    driver.tick(0, &mut hw, &mut sink);
    let bands_before = driver.fan_bands();
    assert_eq!(bands_before.temperature, BandState::High);

    hw.set(Channel::GasConcentration, 2100);
    hw.set(Channel::Temperature, 20);
    driver.tick(1000, &mut hw, &mut sink);

    assert_eq!(hw.last_fans(), Some(FanIntent::EMERGENCY));
    assert_eq!(driver.fan_bands(), bands_before);
    assert_eq!(driver.danger_flags(), Channel::GasConcentration.mask());
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::DangerDetected {
                subsystem: Subsystem::Fans,
                ..
            }
        )),
        1
    );

    // Still dangerous: no duplicate event.
    driver.tick(2000, &mut hw, &mut sink);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::DangerDetected { .. })),
        1
    );

    // Cleared: banding resumes from the preserved High state.
    hw.set(Channel::GasConcentration, 700);
    hw.set(Channel::Temperature, 29);
    driver.tick(3000, &mut hw, &mut sink);
    assert_eq!(driver.danger_flags(), 0);
    assert_eq!(hw.last_fans(), Some(BOTH));
    assert!(sink.events.contains(&AppEvent::DangerCleared {
        subsystem: Subsystem::Fans
    }));
}

#[test]
fn coolant_danger_forces_cooling() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.set(Channel::CoolantTemperature, 41);
    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(hw.last_cooling(), Some(CoolingOutputs::EMERGENCY));
    assert!(sink.events.contains(&AppEvent::DangerDetected {
        subsystem: Subsystem::Cooling,
        channels: Channel::CoolantTemperature.mask(),
    }));
    // Fans are unaffected by the coolant channel.
    assert_eq!(hw.last_fans(), Some(FanIntent::OFF));
}

// ── Cooling thermostat ────────────────────────────────────────

#[test]
fn cooling_turns_on_at_max_and_off_at_lower_edge() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.set(Channel::CoolantTemperature, 28);
    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(hw.last_cooling(), Some(COOLING_ON));

    hw.set(Channel::CoolantTemperature, 27);
    driver.tick(1000, &mut hw, &mut sink);
    assert_eq!(hw.last_cooling(), Some(CoolingOutputs::OFF));
}

#[test]
fn cooling_holds_between_edges() {
    let mut config = SystemConfig::default();
    config.thresholds.coolant.hysteresis_margin = 3;
    let mut driver = ControlLoopDriver::new(config).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = EventLog::new();
    driver.start(0, &mut hw, &mut sink);

    hw.set(Channel::CoolantTemperature, 29);
    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(hw.last_cooling(), Some(COOLING_ON));

    // 26 < 28 but above 28 - 3: still cooling.
    hw.set(Channel::CoolantTemperature, 26);
    driver.tick(1000, &mut hw, &mut sink);
    assert_eq!(hw.last_cooling(), Some(COOLING_ON));

    hw.set(Channel::CoolantTemperature, 25);
    driver.tick(2000, &mut hw, &mut sink);
    assert_eq!(hw.last_cooling(), Some(CoolingOutputs::OFF));
}

// ── Sensor failures ───────────────────────────────────────────

#[test]
fn unavailable_reading_holds_last_fan_intent() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.set(Channel::Temperature, 32);
    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(hw.last_fans(), Some(BOTH));

    // Would clear the band, but the reading is missing.
    hw.fail(Channel::Temperature, SensorError::Unavailable);
    hw.set(Channel::Humidity, 75);
    driver.tick(1000, &mut hw, &mut sink);

    assert_eq!(hw.last_fans(), Some(BOTH));
    assert_eq!(driver.fan_bands().temperature, BandState::High);
    assert!(sink.events.contains(&AppEvent::SensorUnavailable {
        channel: Channel::Temperature,
        error: SensorError::Unavailable,
    }));
}

#[test]
fn danger_on_a_readable_channel_vents_despite_missing_peer() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.fail(Channel::Humidity, SensorError::Unavailable);
    hw.set(Channel::GasConcentration, 2100);
    driver.tick(0, &mut hw, &mut sink);

    assert_eq!(hw.last_fans(), Some(FanIntent::EMERGENCY));
    assert_eq!(driver.danger_flags(), Channel::GasConcentration.mask());
    assert!(sink.events.contains(&AppEvent::DangerDetected {
        subsystem: Subsystem::Fans,
        channels: Channel::GasConcentration.mask(),
    }));
    // Bands are only moved by a complete snapshot.
    assert_eq!(driver.fan_bands().gas, BandState::Normal);
}

#[test]
fn implausible_reading_is_treated_as_unavailable() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.set(Channel::Temperature, 500);
    driver.tick(0, &mut hw, &mut sink);

    assert_eq!(hw.last_fans(), Some(FanIntent::OFF));
    assert_eq!(driver.danger_flags(), 0);
    assert!(sink.events.contains(&AppEvent::SensorUnavailable {
        channel: Channel::Temperature,
        error: SensorError::OutOfRange,
    }));
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::Telemetry {
                channel: Channel::Temperature,
                ..
            }
        )),
        0
    );
}

#[test]
fn missing_coolant_holds_cooling_outputs() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.set(Channel::CoolantTemperature, 30);
    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(hw.last_cooling(), Some(COOLING_ON));

    hw.fail(Channel::CoolantTemperature, SensorError::Unavailable);
    driver.tick(1000, &mut hw, &mut sink);
    driver.tick(1500, &mut hw, &mut sink);
    assert_eq!(hw.last_cooling(), Some(COOLING_ON));
}

// ── Telemetry debouncing ──────────────────────────────────────

#[test]
fn telemetry_reports_only_changes() {
    let (mut driver, mut hw, mut sink) = make_driver();
    let telemetry = |sink: &EventLog| sink.count(|e| matches!(e, AppEvent::Telemetry { .. }));

    driver.tick(0, &mut hw, &mut sink);
    assert_eq!(telemetry(&sink), Channel::COUNT);

    sink.clear();
    driver.tick(1000, &mut hw, &mut sink);
    assert_eq!(telemetry(&sink), 0);

    hw.set(Channel::Temperature, 25);
    driver.tick(2000, &mut hw, &mut sink);
    assert_eq!(
        sink.events,
        vec![AppEvent::Telemetry {
            channel: Channel::Temperature,
            value: 25,
        }]
    );
}

#[test]
fn turbidity_uses_configured_step() {
    let (mut driver, mut hw, mut sink) = make_driver();
    driver.tick(0, &mut hw, &mut sink);
    sink.clear();

    hw.set(Channel::Turbidity, 55);
    driver.tick(1000, &mut hw, &mut sink);
    assert!(sink.events.is_empty());

    hw.set(Channel::Turbidity, 60);
    driver.tick(2000, &mut hw, &mut sink);
    assert_eq!(
        sink.events,
        vec![AppEvent::Telemetry {
            channel: Channel::Turbidity,
            value: 60,
        }]
    );
}
