//! Lateral-acceleration torque controller.
//!
//! Setpoint and measurement are lateral accelerations (curvature times `v²`)
//! plus a low-speed curvature term. Both are mapped to torque through the
//! linear lateral-accel/torque model before the PID sees them. Feedforward is
//! the gravity-adjusted desired lateral acceleration mapped the same way, with
//! a friction term interpolated on the lateral acceleration error.

use pilot_common::consts::ACCELERATION_DUE_TO_GRAVITY;
use pilot_common::controls::command::{LateralDebugState, LateralKind, TorqueDebug};
use pilot_common::controls::config::{LateralConfig, TorqueConfig};
use pilot_common::controls::interp::interp;
use pilot_common::controls::snapshot::LiveParameters;

use super::{LateralControl, LateralInput, LateralOutput, SaturationCheck, SaturationCounter};
use crate::control::filters::apply_center_deadzone;
use crate::control::pid::{PidController, PidGains};

/// Speed band [m/s] over which measured curvature blends from the steering
/// angle to the yaw rate.
const YAW_RATE_BLEND_BP: [f64; 2] = [2.0, 5.0];

/// Lateral-accel/torque model in effect for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorqueModel {
    pub lat_accel_factor: f64,
    pub lat_accel_offset: f64,
    pub friction: f64,
    pub friction_threshold: f64,
}

impl TorqueModel {
    fn resolve(cfg: &TorqueConfig, live: &LiveParameters) -> Self {
        let mut model = Self {
            lat_accel_factor: cfg.lat_accel_factor,
            lat_accel_offset: cfg.lat_accel_offset,
            friction: cfg.friction,
            friction_threshold: cfg.friction_threshold,
        };
        if cfg.use_live_parameters {
            if let Some(t) = live.torque {
                if t.lat_accel_factor.is_finite() && t.lat_accel_factor > 0.0 {
                    model.lat_accel_factor = t.lat_accel_factor;
                }
                model.lat_accel_offset = t.lat_accel_offset;
                model.friction = t.friction;
            }
        }
        model
    }

    /// Normalized torque for a lateral acceleration, with optional friction
    /// interpolated on the (deadzoned) lateral acceleration error.
    pub fn torque_from_lateral_accel(
        &self,
        lateral_accel: f64,
        lateral_accel_error: f64,
        deadzone: f64,
        friction_compensation: bool,
    ) -> f64 {
        let friction = if friction_compensation {
            interp(
                apply_center_deadzone(lateral_accel_error, deadzone),
                &[-self.friction_threshold, self.friction_threshold],
                &[-self.friction, self.friction],
            )
        } else {
            0.0
        };
        lateral_accel / self.lat_accel_factor + friction
    }
}

#[derive(Debug, Clone)]
pub struct TorqueLateral {
    tuning: TorqueConfig,
    pid: PidController,
    sat: SaturationCounter,
    steer_max: f64,
}

impl TorqueLateral {
    pub fn new(cfg: &LateralConfig, dt: f64) -> Self {
        let t = &cfg.torque;
        let mut gains = PidGains::constant(t.kp, t.ki, t.kf);
        gains.kd = t.kd;
        Self {
            tuning: t.clone(),
            pid: PidController::new(gains, -cfg.steer_max, cfg.steer_max, dt),
            sat: SaturationCounter::new(dt, cfg.steer_limit_timer, cfg.sat_check_min_speed),
            steer_max: cfg.steer_max,
        }
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }
}

impl LateralControl for TorqueLateral {
    fn kind(&self) -> LateralKind {
        LateralKind::Torque
    }

    fn saturation_check(&self) -> SaturationCheck {
        SaturationCheck::LateralAccel
    }

    fn update(&mut self, input: &LateralInput<'_>) -> LateralOutput {
        let vs = input.vehicle;
        let live = input.live;
        let v = vs.v_ego;
        let vm = input.model;
        let angle_des = vm
            .get_steer_from_curvature(-input.desired_curvature, v, live.roll)
            .to_degrees()
            + live.angle_offset_deg;

        if !input.active {
            self.reset();
            return LateralOutput {
                steer: 0.0,
                steering_angle_deg: angle_des,
                debug: LateralDebugState::Torque(TorqueDebug::default()),
            };
        }

        let model = TorqueModel::resolve(&self.tuning, live);
        let actual_curvature_vm = -vm.calc_curvature(
            (vs.steering_angle_deg - live.angle_offset_deg).to_radians(),
            v,
            live.roll,
        );
        let roll_compensation = live.roll * ACCELERATION_DUE_TO_GRAVITY;

        let (actual_curvature, curvature_deadzone) = match vs.yaw_rate {
            Some(yaw_rate) if !self.tuning.use_steering_angle && v > 0.0 => {
                let from_yaw = yaw_rate / v;
                let blended = interp(
                    v,
                    &YAW_RATE_BLEND_BP,
                    &[actual_curvature_vm, from_yaw],
                );
                (blended, 0.0)
            }
            _ => {
                let dz = vm
                    .calc_curvature(self.tuning.steering_angle_deadzone_deg.to_radians(), v, 0.0)
                    .abs();
                (actual_curvature_vm, dz)
            }
        };

        let v2 = v * v;
        let desired_lateral_accel = input.desired_curvature * v2;
        let actual_lateral_accel = actual_curvature * v2;
        let lateral_accel_deadzone = curvature_deadzone * v2;

        let low_speed = self.tuning.low_speed_factor.eval(v);
        let low_speed_factor = low_speed * low_speed;
        let setpoint = desired_lateral_accel + low_speed_factor * input.desired_curvature;
        let measurement = actual_lateral_accel + low_speed_factor * actual_curvature;

        let torque_from_setpoint =
            model.torque_from_lateral_accel(setpoint, setpoint, lateral_accel_deadzone, false);
        let torque_from_measurement =
            model.torque_from_lateral_accel(measurement, measurement, lateral_accel_deadzone, false);
        let error = torque_from_setpoint - torque_from_measurement;

        let gravity_adjusted = desired_lateral_accel - roll_compensation - model.lat_accel_offset;
        let ff = model.torque_from_lateral_accel(
            gravity_adjusted,
            desired_lateral_accel - actual_lateral_accel,
            lateral_accel_deadzone,
            self.tuning.friction_compensation,
        );

        let freeze =
            input.steer_limited || vs.steering_pressed || v < self.tuning.freeze_integrator_speed;
        let output_torque = self.pid.update(error, v, ff, false, freeze);

        let state = self.pid.state();
        let saturated = self.sat.check(
            self.steer_max - output_torque.abs() < 1e-3,
            vs,
            input.steer_limited,
        );

        // Torque is computed with left-positive curvature; the steering
        // command uses the wheel-angle sign.
        LateralOutput {
            steer: -output_torque,
            steering_angle_deg: angle_des,
            debug: LateralDebugState::Torque(TorqueDebug {
                active: true,
                error,
                p: state.p,
                i: state.i,
                d: state.d,
                f: state.f,
                actual_lateral_accel,
                desired_lateral_accel,
                output: -output_torque,
                saturated,
            }),
        }
    }

    fn reset(&mut self) {
        self.pid.reset();
        self.sat.reset();
    }

    fn steer_max(&self) -> f64 {
        self.steer_max
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
