//! Saturation supervisor driven through the full tick.

use pilot_common::controls::command::LateralKind;
use pilot_common::controls::events::EventName;
use pilot_common::controls::snapshot::TickInputs;
use pilot_control::cycle::{ControlsCore, TickReport};

use super::{core, core_with, cruise, cruise_with, engage};

/// Dwell before sustained saturation is escalated, in ticks.
const DWELL_TICKS: usize = 40;

fn turning(v_ego: f64, curvature: f64) -> TickInputs {
    let mut inputs = cruise(v_ego);
    inputs.lat_plan.curvature = curvature;
    inputs
}

fn first_warning(core: &mut ControlsCore, inputs: &TickInputs, ticks: usize) -> Option<usize> {
    (0..ticks).find(|_| core.tick(inputs).warning.is_some())
}

#[test]
fn torque_undershoot_raises_after_dwell() {
    let mut c = core_with(|cfg| cfg.lateral.controller = LateralKind::Torque);
    engage(&mut c, 20.0);

    // Wheel stays centred while the plan asks for a hard left.
    let inputs = turning(20.0, 0.02);
    let reports: Vec<TickReport> = (0..400).map(|_| c.tick(&inputs)).collect();

    let first = reports
        .iter()
        .position(|r| r.warning.is_some())
        .expect("sustained undershoot must raise");
    assert!(first >= DWELL_TICKS - 1);
    assert_eq!(reports[first].warning, Some(EventName::SteerSaturated));
    assert!(reports[first].command.steer.abs() > 0.99);
    // Warning-only: the core stays engaged.
    assert!(reports.iter().all(|r| r.lat_active));
}

#[test]
fn torque_saturation_below_supervisor_speed_never_raises() {
    let mut c = core_with(|cfg| cfg.lateral.controller = LateralKind::Torque);
    engage(&mut c, 4.0);

    let inputs = turning(4.0, 0.5);
    let reports: Vec<TickReport> = (0..300).map(|_| c.tick(&inputs)).collect();
    assert!(reports.iter().any(|r| r.command.steer.abs() > 0.99));
    assert!(reports.iter().all(|r| r.warning.is_none()));
}

#[test]
fn reduced_steer_max_still_raises() {
    let mut c = core_with(|cfg| {
        cfg.lateral.controller = LateralKind::Torque;
        cfg.lateral.steer_max = 0.5;
    });
    engage(&mut c, 20.0);

    let inputs = turning(20.0, 0.02);
    let reports: Vec<TickReport> = (0..400).map(|_| c.tick(&inputs)).collect();
    let first = reports
        .iter()
        .position(|r| r.warning.is_some())
        .expect("undershoot at the reduced limit must raise");
    assert!(first >= DWELL_TICKS - 1);
    assert!(reports.iter().all(|r| r.command.steer.abs() <= 0.5));
}

#[test]
fn blend_with_torque_member_raises_lateral_accel_warning() {
    let mut c = core_with(|cfg| cfg.lateral.controller = LateralKind::Blend);
    engage(&mut c, 25.0);

    let inputs = turning(25.0, 0.02);
    let first = first_warning(&mut c, &inputs, 400).expect("blend undershoot must raise");
    assert!(first >= DWELL_TICKS - 1);
}

#[test]
fn pid_path_deviation_on_commanded_side() {
    let mut c = core();
    engage(&mut c, 15.0);

    // Left curvature commands negative steer; path lying further left deviates.
    let mut inputs = turning(15.0, 0.05);
    inputs.lat_plan.path_offset = Some(0.5);
    let first = first_warning(&mut c, &inputs, 400).expect("path deviation must raise");
    assert!(first >= DWELL_TICKS - 1);
}

#[test]
fn pid_path_on_opposite_side_never_raises() {
    let mut c = core();
    engage(&mut c, 15.0);

    let mut inputs = turning(15.0, 0.05);
    inputs.lat_plan.path_offset = Some(-0.5);
    assert_eq!(first_warning(&mut c, &inputs, 400), None);
}

#[test]
fn steering_press_suppresses_warning_for_two_seconds() {
    let mut c = core();
    engage(&mut c, 15.0);

    let mut inputs = turning(15.0, 0.05);
    inputs.lat_plan.path_offset = Some(0.5);
    first_warning(&mut c, &inputs, 400).expect("path deviation must raise");

    let mut pressed = inputs.clone();
    pressed.vehicle.steering_pressed = true;
    assert!(c.tick(&pressed).warning.is_none());

    // 2 s debounce at 100 Hz, the press tick included.
    for _ in 1..200 {
        assert!(c.tick(&inputs).warning.is_none());
    }
    assert!(first_warning(&mut c, &inputs, 200).is_some());
}

#[test]
fn disengage_zeroes_steer_same_tick() {
    let mut c = core();
    engage(&mut c, 15.0);

    let mut inputs = turning(15.0, 0.05);
    inputs.lat_plan.path_offset = Some(0.5);
    first_warning(&mut c, &inputs, 400).expect("path deviation must raise");

    let mut cancel = cruise_with(15.0, &[EventName::ButtonCancel]);
    cancel.lat_plan = inputs.lat_plan;
    let r = c.tick(&cancel);
    assert!(!r.enabled);
    assert!(!r.lat_active);
    assert_eq!(r.command.steer, 0.0);
    assert_eq!(r.command.accel, 0.0);
    assert!(r.warning.is_none());
}
