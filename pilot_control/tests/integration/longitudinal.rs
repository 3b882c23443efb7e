//! Longitudinal state machine and PID loop through the full tick.

use pilot_common::controls::config::{ControlsConfig, LongitudinalConfig};
use pilot_common::controls::events::EventName;
use pilot_common::controls::snapshot::AccelLimits;
use pilot_common::controls::state::LongControlState;
use pilot_control::state::longitudinal::{LongTransitionInput, long_control_state_trans};

use super::{core, core_with, cruise, cruise_with, engage};

#[test]
fn off_goes_straight_to_pid_from_rest() {
    let cfg = LongitudinalConfig::default();
    let next = long_control_state_trans(
        &cfg,
        LongControlState::Off,
        &LongTransitionInput {
            active: true,
            v_ego: 0.0,
            should_stop: false,
            brake_pressed: false,
            cruise_standstill: false,
        },
    );
    assert_eq!(next, LongControlState::Pid);

    let mut c = core();
    let r = engage(&mut c, 0.0);
    assert!(r.long_active);
    assert_eq!(r.command.long_control_state, LongControlState::Pid);
}

#[test]
fn pid_output_is_exactly_clamped() {
    let limits = AccelLimits { min: -2.0, max: 1.5 };
    for (target, bound) in [(10.0, limits.max), (-10.0, limits.min)] {
        let mut c = core();
        engage(&mut c, 15.0);
        for _ in 0..200 {
            let mut inputs = cruise(15.0);
            inputs.long_plan.a_target = target;
            inputs.accel_limits = Some(limits);
            let r = c.tick(&inputs);
            assert_eq!(r.command.long_control_state, LongControlState::Pid);
            assert_eq!(r.command.accel, bound);
        }
    }
}

#[test]
fn missing_limits_fall_back_to_speed_table() {
    let cfg = ControlsConfig::default();
    let mut c = core();
    engage(&mut c, 30.0);
    let mut inputs = cruise(30.0);
    inputs.long_plan.a_target = 10.0;
    let r = c.tick(&inputs);
    assert_eq!(r.command.accel, cfg.longitudinal.accel_max.eval(30.0));
}

#[test]
fn stop_then_start_sequence() {
    let cfg = ControlsConfig::default().longitudinal;
    let step = cfg.stopping_decel_rate * 0.01;
    let mut c = core();
    engage(&mut c, 2.0);

    let mut stopping = cruise(0.0);
    stopping.long_plan.should_stop = true;
    let mut last = f64::INFINITY;
    for _ in 0..1000 {
        let r = c.tick(&stopping);
        assert_eq!(r.command.long_control_state, LongControlState::Stopping);
        assert!(r.command.accel <= last);
        last = r.command.accel;
    }
    assert!(last <= cfg.stop_accel);
    assert!(last > cfg.stop_accel - step - 1e-9);

    let r = c.tick(&cruise(0.0));
    assert_eq!(r.command.long_control_state, LongControlState::Starting);
    assert_eq!(r.command.accel, cfg.start_accel);

    let r = c.tick(&cruise(cfg.v_ego_starting + 0.1));
    assert_eq!(r.command.long_control_state, LongControlState::Pid);
}

#[test]
fn brake_keeps_stopping() {
    let mut c = core();
    engage(&mut c, 0.0);
    let mut stop = cruise(0.0);
    stop.long_plan.should_stop = true;
    c.tick(&stop);

    let mut held = cruise(0.0);
    held.vehicle.brake_pressed = true;
    assert_eq!(
        c.tick(&held).command.long_control_state,
        LongControlState::Stopping
    );
}

#[test]
fn disengage_zeroes_acceleration_same_tick() {
    let mut c = core();
    engage(&mut c, 15.0);
    let mut inputs = cruise(15.0);
    inputs.long_plan.a_target = 1.0;
    for _ in 0..50 {
        c.tick(&inputs);
    }
    assert!(c.longitudinal().pid().state().i != 0.0 || c.last_command().accel != 0.0);

    let mut cancel = cruise_with(15.0, &[EventName::ButtonCancel]);
    cancel.long_plan.a_target = 1.0;
    let r = c.tick(&cancel);
    assert_eq!(r.command.accel, 0.0);
    assert_eq!(r.command.long_control_state, LongControlState::Off);
    assert_eq!(c.longitudinal().pid().state().i, 0.0);
}

#[test]
fn longitudinal_can_be_disabled_in_config() {
    let mut c = core_with(|cfg| cfg.engagement.longitudinal_enabled = false);
    let r = engage(&mut c, 15.0);
    assert!(r.active && r.lat_active);
    assert!(!r.long_active);
    assert_eq!(r.command.long_control_state, LongControlState::Off);
}

#[test]
fn gas_override_releases_longitudinal_but_keeps_lateral() {
    let mut c = core();
    engage(&mut c, 15.0);
    let r = c.tick(&cruise_with(15.0, &[EventName::GasPressedOverride]));
    assert!(r.lat_active);
    assert!(!r.long_active);
    assert_eq!(r.command.accel, 0.0);
}
