//! Linear-quadratic regulator on a two-state steering model.
//!
//! An observer tracks the steering angle from the measured EPS torque; the
//! state feedback plus a DC-gain reference term drive the angle to target,
//! and a conditionally integrated error term removes the residual bias. The
//! actuator model is scaled by `(0.45 + v/60)²`.

use pilot_common::consts::MIN_LATERAL_CONTROL_SPEED;
use pilot_common::controls::command::{LateralDebugState, LateralKind, LqrDebug};
use pilot_common::controls::config::{LateralConfig, LqrConfig};

use super::{LateralControl, LateralInput, LateralOutput, SaturationCounter};

/// Integral unwind rate while the driver steers, per second.
const I_UNWIND_RATE: f64 = 0.3;

#[inline]
fn torque_scale(v_ego: f64) -> f64 {
    let s = 0.45 + v_ego / 60.0;
    s * s
}

#[derive(Debug, Clone)]
pub struct LqrLateral {
    tuning: LqrConfig,
    x_hat: [f64; 2],
    i_lqr: f64,
    i_rate: f64,
    i_unwind: f64,
    sat: SaturationCounter,
    steer_max: f64,
}

impl LqrLateral {
    pub fn new(cfg: &LateralConfig, dt: f64) -> Self {
        Self {
            tuning: cfg.lqr.clone(),
            x_hat: [0.0; 2],
            i_lqr: 0.0,
            i_rate: dt,
            i_unwind: I_UNWIND_RATE * dt,
            sat: SaturationCounter::new(dt, cfg.steer_limit_timer, cfg.sat_check_min_speed),
            steer_max: cfg.steer_max,
        }
    }

    /// Integral term.
    pub fn integral(&self) -> f64 {
        self.i_lqr
    }

    pub fn estimate(&self) -> [f64; 2] {
        self.x_hat
    }
}

impl LateralControl for LqrLateral {
    fn kind(&self) -> LateralKind {
        LateralKind::Lqr
    }

    fn update(&mut self, input: &LateralInput<'_>) -> LateralOutput {
        let vs = input.vehicle;
        let live = input.live;
        let t = &self.tuning;
        let scale = torque_scale(vs.v_ego);

        let angle_no_offset = vs.steering_angle_deg - live.angle_offset_average_deg;
        let instant_offset = live.angle_offset_deg - live.angle_offset_average_deg;
        let desired_angle = input
            .model
            .get_steer_from_curvature(-input.desired_curvature, vs.v_ego, live.roll)
            .to_degrees()
            + instant_offset;

        let angle_k = t.c[0] * self.x_hat[0] + t.c[1] * self.x_hat[1];
        let e = angle_no_offset - angle_k;
        let u = vs.steering_torque_eps / scale;
        let x = self.x_hat;
        self.x_hat = [
            t.a[0] * x[0] + t.a[1] * x[1] + t.b[0] * u + t.l[0] * e,
            t.a[2] * x[0] + t.a[3] * x[1] + t.b[1] * u + t.l[1] * e,
        ];

        if !input.active || vs.v_ego < MIN_LATERAL_CONTROL_SPEED {
            self.reset();
            return LateralOutput {
                steer: 0.0,
                steering_angle_deg: desired_angle,
                debug: LateralDebugState::Lqr(LqrDebug {
                    steering_angle_deg: angle_k,
                    ..Default::default()
                }),
            };
        }

        let u_lqr =
            desired_angle / t.dc_gain - (t.k[0] * self.x_hat[0] + t.k[1] * self.x_hat[1]);
        let lqr_output = scale * u_lqr / t.scale;

        if vs.steering_pressed {
            let step = self.i_unwind * self.i_lqr.signum();
            self.i_lqr = if self.i_lqr.abs() <= self.i_unwind {
                0.0
            } else {
                self.i_lqr - step
            };
        } else {
            let error = desired_angle - angle_k;
            let i = self.i_lqr + t.ki * self.i_rate * error;
            let control = lqr_output + i;
            if (error >= 0.0 && (control <= self.steer_max || i < 0.0))
                || (error <= 0.0 && (control >= -self.steer_max || i > 0.0))
            {
                self.i_lqr = i;
            }
        }

        let output = (lqr_output + self.i_lqr).clamp(-self.steer_max, self.steer_max);
        let saturated = self.sat.check(
            self.steer_max - output.abs() < 1e-3,
            vs,
            input.steer_limited,
        );

        LateralOutput {
            steer: output,
            steering_angle_deg: desired_angle,
            debug: LateralDebugState::Lqr(LqrDebug {
                active: true,
                steering_angle_deg: angle_k,
                i: self.i_lqr,
                lqr_output,
                output,
                saturated,
            }),
        }
    }

    fn reset(&mut self) {
        self.x_hat = [0.0; 2];
        self.i_lqr = 0.0;
        self.sat.reset();
    }

    fn steer_max(&self) -> f64 {
        self.steer_max
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
