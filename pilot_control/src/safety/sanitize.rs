//! Non-finite value screening.
//!
//! Inputs are screened before any controller sees them, so a NaN can never
//! enter an integrator or filter. The command is screened last, right before
//! it is published. Offending values become 0 (or the field default for live
//! calibration) and are logged by name.

use pilot_common::controls::command::ActuatorCommand;
use pilot_common::controls::fault::ControlFault;
use pilot_common::controls::snapshot::{LiveParameters, TickInputs};
use tracing::error;

#[inline]
fn screen(value: &mut f64, fallback: f64, field: &'static str, flag: ControlFault, faults: &mut ControlFault) {
    if !value.is_finite() {
        error!(field, value = *value, "non-finite value replaced");
        *value = fallback;
        *faults |= flag;
    }
}

#[inline]
fn screen_opt(value: &mut Option<f64>, field: &'static str, faults: &mut ControlFault) {
    if value.is_some_and(|v| !v.is_finite()) {
        error!(field, "non-finite optional input dropped");
        *value = None;
        *faults |= ControlFault::NON_FINITE_INPUT;
    }
}

/// Replace non-finite actuator values with 0.
pub fn sanitize_command(cmd: &mut ActuatorCommand) -> ControlFault {
    let mut faults = ControlFault::empty();
    let flag = ControlFault::NON_FINITE_OUTPUT;
    screen(&mut cmd.steer, 0.0, "steer", flag, &mut faults);
    screen(&mut cmd.steering_angle_deg, 0.0, "steering_angle_deg", flag, &mut faults);
    screen(&mut cmd.accel, 0.0, "accel", flag, &mut faults);
    faults
}

/// Screen every numeric input of the tick.
pub fn sanitize_inputs(inputs: &mut TickInputs) -> ControlFault {
    let mut faults = ControlFault::empty();
    let flag = ControlFault::NON_FINITE_INPUT;

    let vs = &mut inputs.vehicle;
    screen(&mut vs.v_ego, 0.0, "v_ego", flag, &mut faults);
    screen(&mut vs.a_ego, 0.0, "a_ego", flag, &mut faults);
    screen(&mut vs.steering_angle_deg, 0.0, "steering_angle_deg", flag, &mut faults);
    screen(&mut vs.steering_rate_deg, 0.0, "steering_rate_deg", flag, &mut faults);
    screen(&mut vs.steering_torque, 0.0, "steering_torque", flag, &mut faults);
    screen(&mut vs.steering_torque_eps, 0.0, "steering_torque_eps", flag, &mut faults);
    screen_opt(&mut vs.yaw_rate, "yaw_rate", &mut faults);

    screen(&mut inputs.long_plan.a_target, 0.0, "a_target", flag, &mut faults);

    let lat = &mut inputs.lat_plan;
    screen(&mut lat.curvature, 0.0, "curvature", flag, &mut faults);
    screen(&mut lat.curvature_rate, 0.0, "curvature_rate", flag, &mut faults);
    screen_opt(&mut lat.path_offset, "path_offset", &mut faults);

    let defaults = LiveParameters::default();
    let live = &mut inputs.live;
    screen(&mut live.steer_ratio, defaults.steer_ratio, "steer_ratio", flag, &mut faults);
    screen(
        &mut live.stiffness_factor,
        defaults.stiffness_factor,
        "stiffness_factor",
        flag,
        &mut faults,
    );
    screen(&mut live.angle_offset_deg, 0.0, "angle_offset_deg", flag, &mut faults);
    screen(
        &mut live.angle_offset_average_deg,
        0.0,
        "angle_offset_average_deg",
        flag,
        &mut faults,
    );
    screen(&mut live.roll, 0.0, "roll", flag, &mut faults);
    if let Some(t) = live.torque {
        if !(t.lat_accel_factor.is_finite() && t.lat_accel_offset.is_finite() && t.friction.is_finite()) {
            error!("non-finite live torque parameters dropped");
            live.torque = None;
            faults |= flag;
        }
    }

    if let Some(l) = inputs.accel_limits {
        if !(l.min.is_finite() && l.max.is_finite()) {
            error!("non-finite acceleration limits dropped");
            inputs.accel_limits = None;
            faults |= flag;
        }
    }
    if let Some(a) = inputs.applied {
        if !(a.steer.is_finite() && a.steering_angle_deg.is_finite()) {
            error!("non-finite applied actuator feedback dropped");
            inputs.applied = None;
            faults |= flag;
        }
    }

    faults
}

// ─── Tests ──────────────────────────────────────────────────────────
