//! External command tests: mode gates, duty cycle, configuration writes and
//! channel restoration.

use crate::mock_hw::{EventLog, MockHardware};

use climatebox::app::commands::AppCommand;
use climatebox::app::events::AppEvent;
use climatebox::app::ports::CycleEvent;
use climatebox::app::service::ControlLoopDriver;
use climatebox::config::{Bound, SystemConfig};
use climatebox::control::band::Channel;
use climatebox::control::cooling::CoolingOutputs;
use climatebox::error::{ConfigError, SensorError};
use climatebox::gate::{OverrideMode, SchedulerMode};
use climatebox::scheduler::CyclePhase;

const HOUR_MS: u64 = 3_600_000;

fn make_driver() -> (ControlLoopDriver, MockHardware, EventLog) {
    let mut driver = ControlLoopDriver::new(SystemConfig::default()).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = EventLog::new();
    driver.start(0, &mut hw, &mut sink);
    (driver, hw, sink)
}

fn cycle_events(sink: &EventLog) -> Vec<(CycleEvent, u64)> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Cycle { event, at_ms } => Some((*event, *at_ms)),
            _ => None,
        })
        .collect()
}

// ── Duty cycle ────────────────────────────────────────────────

#[test]
fn six_hour_cycle_timeline() {
    let (mut driver, mut hw, mut sink) = make_driver();

    driver.handle_command(AppCommand::SetFoggerPulseSecs(5), 0, &mut hw, &mut sink);
    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Enabled),
        0,
        &mut hw,
        &mut sink,
    );
    assert!(hw.light_on());
    assert!(hw.fogger_on());

    for t in [5_000, 3 * HOUR_MS, 3 * HOUR_MS + 5_000, 6 * HOUR_MS, 12 * HOUR_MS] {
        driver.tick(t, &mut hw, &mut sink);
    }

    assert_eq!(
        cycle_events(&sink),
        vec![
            (CycleEvent::LightOn, 0),
            (CycleEvent::FoggerOn, 0),
            (CycleEvent::FoggerOff, 5_000),
            (CycleEvent::FoggerOn, 3 * HOUR_MS),
            (CycleEvent::FoggerOff, 3 * HOUR_MS + 5_000),
            (CycleEvent::LightOff, 6 * HOUR_MS),
            (CycleEvent::LightOn, 12 * HOUR_MS),
            (CycleEvent::FoggerOn, 12 * HOUR_MS),
        ]
    );
    assert_eq!(driver.scheduler().phase(), CyclePhase::LightOn);
}

#[test]
fn disabling_mid_pulse_stops_light_and_fogger() {
    let (mut driver, mut hw, mut sink) = make_driver();
    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Enabled),
        0,
        &mut hw,
        &mut sink,
    );
    assert!(hw.fogger_on());

    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Disabled),
        10_000,
        &mut hw,
        &mut sink,
    );
    assert!(!hw.light_on());
    assert!(!hw.fogger_on());
    assert_eq!(driver.scheduler().phase(), CyclePhase::Idle);
    assert_eq!(driver.scheduler().pending_timers(), 0);

    // Nothing fires afterwards.
    sink.clear();
    driver.tick(7 * HOUR_MS, &mut hw, &mut sink);
    assert!(cycle_events(&sink).is_empty());
}

#[test]
fn fogger_pulse_request_only_while_light_is_on() {
    let (mut driver, mut hw, mut sink) = make_driver();

    driver.handle_command(AppCommand::RequestFoggerPulse, 0, &mut hw, &mut sink);
    assert!(!hw.fogger_on());

    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Enabled),
        0,
        &mut hw,
        &mut sink,
    );
    // Let the start-of-phase pulse finish (30 s default).
    driver.tick(30_000, &mut hw, &mut sink);
    assert!(!hw.fogger_on());

    driver.handle_command(AppCommand::RequestFoggerPulse, 60_000, &mut hw, &mut sink);
    assert!(hw.fogger_on());
    driver.tick(90_000, &mut hw, &mut sink);
    assert!(!hw.fogger_on());
}

// ── Configuration writes ──────────────────────────────────────

#[test]
fn cycle_reconfiguration_rejected_while_running() {
    let (mut driver, mut hw, mut sink) = make_driver();
    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Enabled),
        0,
        &mut hw,
        &mut sink,
    );

    driver.handle_command(AppCommand::SetLightOnHours(8), 1000, &mut hw, &mut sink);
    assert!(sink.events.contains(&AppEvent::ConfigRejected(
        ConfigError::ReconfigurationWhileActive {
            field: "light_on_hours",
            retained: 6,
        }
    )));
    assert_eq!(driver.current_config().cycle.light_on_hours, 6);

    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Disabled),
        2000,
        &mut hw,
        &mut sink,
    );
    driver.handle_command(AppCommand::SetLightOnHours(8), 3000, &mut hw, &mut sink);
    assert!(sink.events.contains(&AppEvent::CycleConfigUpdated {
        light_on_hours: 8,
        fogger_pulse_secs: 30,
    }));
    assert_eq!(driver.current_config().cycle.light_on_hours, 8);
}

#[test]
fn out_of_range_cycle_values_are_rejected() {
    let (mut driver, mut hw, mut sink) = make_driver();

    driver.handle_command(AppCommand::SetLightOnHours(12), 0, &mut hw, &mut sink);
    driver.handle_command(AppCommand::SetFoggerPulseSecs(2), 0, &mut hw, &mut sink);

    assert!(sink.events.contains(&AppEvent::ConfigRejected(
        ConfigError::InvalidConfiguration {
            field: "light_on_hours",
            retained: 6,
        }
    )));
    assert!(sink.events.contains(&AppEvent::ConfigRejected(
        ConfigError::InvalidConfiguration {
            field: "fogger_pulse_secs",
            retained: 30,
        }
    )));
    assert_eq!(driver.current_config().cycle, SystemConfig::default().cycle);
}

#[test]
fn threshold_write_applies_on_next_sensor_tick() {
    let (mut driver, mut hw, mut sink) = make_driver();

    hw.set(Channel::Temperature, 28);
    driver.tick(0, &mut hw, &mut sink);
    assert!(!driver.fan_intent().exhaust);

    driver.handle_command(
        AppCommand::SetThreshold {
            channel: Channel::Temperature,
            bound: Bound::Max,
            value: 27,
        },
        500,
        &mut hw,
        &mut sink,
    );
    assert!(sink.events.contains(&AppEvent::ThresholdUpdated {
        channel: Channel::Temperature,
        bound: Bound::Max,
        value: 27,
    }));

    driver.tick(1000, &mut hw, &mut sink);
    assert!(driver.fan_intent().intake);
    assert!(driver.fan_intent().exhaust);
}

#[test]
fn threshold_beyond_danger_limit_echoes_retained_value() {
    let (mut driver, mut hw, mut sink) = make_driver();

    driver.handle_command(
        AppCommand::SetThreshold {
            channel: Channel::Temperature,
            bound: Bound::Max,
            value: 50,
        },
        0,
        &mut hw,
        &mut sink,
    );

    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::ConfigRejected(ConfigError::InvalidConfiguration {
            field: "temperature.max",
            retained: 30,
        }))
    );
    assert_eq!(driver.current_config().thresholds.temperature.max_setpoint, 30);
}

// ── Manual drain override ─────────────────────────────────────

#[test]
fn manual_drain_engages_immediately_and_supersedes_thermostat() {
    let (mut driver, mut hw, mut sink) = make_driver();
    hw.set(Channel::CoolantTemperature, 30);
    driver.tick(0, &mut hw, &mut sink);
    assert!(driver.cooling_outputs().cooling);

    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::ManualDrain),
        200,
        &mut hw,
        &mut sink,
    );
    assert_eq!(hw.last_cooling(), Some(CoolingOutputs::MANUAL_DRAIN));
    assert!(sink
        .events
        .contains(&AppEvent::OverrideModeChanged(OverrideMode::ManualDrain)));

    // The thermostat would cool, but the override holds.
    for t in [500, 1000, 1500] {
        driver.tick(t, &mut hw, &mut sink);
        assert_eq!(hw.last_cooling(), Some(CoolingOutputs::MANUAL_DRAIN));
    }
}

#[test]
fn clearing_drain_waits_for_next_cooling_tick() {
    let (mut driver, mut hw, mut sink) = make_driver();
    hw.set(Channel::CoolantTemperature, 30);
    driver.tick(0, &mut hw, &mut sink);
    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::ManualDrain),
        100,
        &mut hw,
        &mut sink,
    );

    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::Normal),
        200,
        &mut hw,
        &mut sink,
    );
    assert_eq!(driver.override_mode(), OverrideMode::Normal);
    assert_eq!(hw.last_cooling(), Some(CoolingOutputs::MANUAL_DRAIN));

    driver.tick(500, &mut hw, &mut sink);
    assert_eq!(
        hw.last_cooling(),
        Some(CoolingOutputs {
            cooling: true,
            drain: false,
        })
    );
}

#[test]
fn clearing_drain_without_coolant_reading_stops_draining() {
    let (mut driver, mut hw, mut sink) = make_driver();
    hw.set(Channel::CoolantTemperature, 30);
    driver.tick(0, &mut hw, &mut sink);
    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::ManualDrain),
        100,
        &mut hw,
        &mut sink,
    );

    hw.fail(Channel::CoolantTemperature, SensorError::Unavailable);
    driver.tick(1000, &mut hw, &mut sink);
    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::Normal),
        1200,
        &mut hw,
        &mut sink,
    );

    driver.tick(1500, &mut hw, &mut sink);
    assert_eq!(
        hw.last_cooling(),
        Some(CoolingOutputs {
            cooling: true,
            drain: false,
        })
    );
    assert_eq!(driver.cooling_outputs(), hw.last_cooling().unwrap());
}

#[test]
fn repeated_mode_command_is_applied_but_not_announced() {
    let (mut driver, mut hw, mut sink) = make_driver();

    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::Normal),
        0,
        &mut hw,
        &mut sink,
    );
    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Disabled),
        0,
        &mut hw,
        &mut sink,
    );
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::OverrideModeChanged(_) | AppEvent::SchedulerModeChanged(_)
        )),
        0
    );

    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::ManualDrain),
        100,
        &mut hw,
        &mut sink,
    );
    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::ManualDrain),
        200,
        &mut hw,
        &mut sink,
    );
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::OverrideModeChanged(_))),
        1
    );
    assert_eq!(hw.last_cooling(), Some(CoolingOutputs::MANUAL_DRAIN));
}

// ── Channel restoration ───────────────────────────────────────

#[test]
fn channel_restored_reapplies_last_known_modes() {
    let (mut driver, mut hw, mut sink) = make_driver();
    driver.handle_command(
        AppCommand::SetSchedulerMode(SchedulerMode::Enabled),
        0,
        &mut hw,
        &mut sink,
    );
    driver.handle_command(
        AppCommand::SetOverrideMode(OverrideMode::ManualDrain),
        0,
        &mut hw,
        &mut sink,
    );
    driver.tick(HOUR_MS, &mut hw, &mut sink);

    sink.clear();
    driver.handle_command(AppCommand::ChannelRestored, 2 * HOUR_MS, &mut hw, &mut sink);

    assert!(sink
        .events
        .contains(&AppEvent::SchedulerModeChanged(SchedulerMode::Enabled)));
    assert!(sink
        .events
        .contains(&AppEvent::OverrideModeChanged(OverrideMode::ManualDrain)));
    assert_eq!(hw.last_cooling(), Some(CoolingOutputs::MANUAL_DRAIN));

    // The cycle restarts from the top with a fresh pulse.
    assert!(hw.fogger_on());
    assert_eq!(driver.scheduler().phase(), CyclePhase::LightOn);
    assert_eq!(
        driver.scheduler().next_deadline(),
        Some(2 * HOUR_MS + 30_000)
    );
}

#[test]
fn channel_restored_resends_telemetry() {
    let (mut driver, mut hw, mut sink) = make_driver();
    driver.tick(0, &mut hw, &mut sink);
    driver.tick(1000, &mut hw, &mut sink);

    sink.clear();
    driver.handle_command(AppCommand::ChannelRestored, 1500, &mut hw, &mut sink);
    driver.tick(2000, &mut hw, &mut sink);

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Telemetry { .. })),
        Channel::COUNT
    );
}

#[test]
fn channel_restored_while_disabled_keeps_everything_off() {
    let (mut driver, mut hw, mut sink) = make_driver();
    driver.handle_command(AppCommand::ChannelRestored, 0, &mut hw, &mut sink);
    assert_eq!(driver.scheduler_mode(), SchedulerMode::Disabled);
    assert!(!hw.light_on());
    assert!(cycle_events(&sink).is_empty());
}
