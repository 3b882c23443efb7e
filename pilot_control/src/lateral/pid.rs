//! Steering-angle PID.
//!
//! Error is desired minus measured wheel angle [deg]. The feedforward term is
//! the offset-free desired angle times `v²`, scaled by `kf`.

use pilot_common::controls::command::{LateralDebugState, LateralKind, PidDebug};
use pilot_common::controls::config::LateralConfig;

use super::{LateralControl, LateralInput, LateralOutput, SaturationCounter};
use crate::control::pid::{PidController, PidGains};

#[derive(Debug, Clone)]
pub struct PidLateral {
    pid: PidController,
    sat: SaturationCounter,
    steer_max: f64,
}

impl PidLateral {
    pub fn new(cfg: &LateralConfig, dt: f64) -> Self {
        let gains = PidGains {
            kp: cfg.pid.kp.clone(),
            ki: cfg.pid.ki.clone(),
            kd: cfg.pid.kd,
            kf: cfg.pid.kf,
            derivative_rc: cfg.pid.derivative_rc,
        };
        Self {
            pid: PidController::new(gains, -cfg.steer_max, cfg.steer_max, dt),
            sat: SaturationCounter::new(dt, cfg.steer_limit_timer, cfg.sat_check_min_speed),
            steer_max: cfg.steer_max,
        }
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }
}

/// Default steering feedforward: angle scaled by speed squared.
#[inline]
fn steer_feedforward(angle_deg: f64, v_ego: f64) -> f64 {
    angle_deg * v_ego * v_ego
}

impl LateralControl for PidLateral {
    fn kind(&self) -> LateralKind {
        LateralKind::Pid
    }

    fn update(&mut self, input: &LateralInput<'_>) -> LateralOutput {
        let vs = input.vehicle;
        let angle_no_offset = input
            .model
            .get_steer_from_curvature(-input.desired_curvature, vs.v_ego, input.live.roll)
            .to_degrees();
        let angle_des = angle_no_offset + input.live.angle_offset_deg;
        let error = angle_des - vs.steering_angle_deg;

        let mut debug = PidDebug {
            steering_angle_deg: vs.steering_angle_deg,
            steering_rate_deg: vs.steering_rate_deg,
            angle_error_deg: error,
            ..Default::default()
        };

        if !input.active {
            self.reset();
            return LateralOutput {
                steer: 0.0,
                steering_angle_deg: angle_des,
                debug: LateralDebugState::Pid(debug),
            };
        }

        let ff = steer_feedforward(angle_no_offset, vs.v_ego);
        let output = self
            .pid
            .update(error, vs.v_ego, ff, vs.steering_pressed, false);

        let state = self.pid.state();
        debug.active = true;
        debug.p = state.p;
        debug.i = state.i;
        debug.f = state.f;
        debug.output = output;
        debug.saturated = self.sat.check(
            self.steer_max - output.abs() < 1e-3,
            vs,
            input.steer_limited,
        );

        LateralOutput {
            steer: output,
            steering_angle_deg: angle_des,
            debug: LateralDebugState::Pid(debug),
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
