//! Incremental nonlinear dynamic inversion.
//!
//! A fixed-gain three-state Kalman filter estimates steering angle, rate and
//! acceleration from the measured angle and rate. A cascaded rate loop and
//! acceleration loop compute the desired steering acceleration; dividing the
//! acceleration error by the actuator effectiveness gives an increment that is
//! added to the first-order filtered previous output.

use pilot_common::controls::command::{IndiDebug, LateralDebugState, LateralKind};
use pilot_common::controls::config::{IndiConfig, LateralConfig};

use super::{LateralControl, LateralInput, LateralOutput, SaturationCounter};
use crate::control::filters::FirstOrderFilter;

/// Steady-state Kalman gain for measurements `[angle, rate]`.
const K: [[f64; 2]; 3] = [
    [7.30262179e-01, 2.07003658e-04],
    [7.29394177e+00, 1.39159419e-02],
    [1.71022442e+01, 3.38495381e-02],
];

/// `A - K·C` for the constant-acceleration model with tick period `dt`,
/// where `C` observes angle and rate.
fn observer_matrix(dt: f64) -> [[f64; 3]; 3] {
    let a = [[1.0, dt, 0.0], [0.0, 1.0, dt], [0.0, 0.0, 1.0]];
    let mut ak = a;
    for (i, row) in ak.iter_mut().enumerate() {
        row[0] -= K[i][0];
        row[1] -= K[i][1];
    }
    ak
}

#[derive(Debug, Clone)]
pub struct IndiLateral {
    tuning: IndiConfig,
    a_k: [[f64; 3]; 3],
    /// Estimated `[angle, rate, accel]` [rad, rad/s, rad/s²].
    x: [f64; 3],
    steer_filter: FirstOrderFilter,
    output_steer: f64,
    sat: SaturationCounter,
    steer_max: f64,
}

impl IndiLateral {
    pub fn new(cfg: &LateralConfig, dt: f64) -> Self {
        let rc = cfg.indi.time_constant.eval(0.0);
        Self {
            tuning: cfg.indi.clone(),
            a_k: observer_matrix(dt),
            x: [0.0; 3],
            steer_filter: FirstOrderFilter::new(0.0, rc, dt),
            output_steer: 0.0,
            sat: SaturationCounter::new(dt, cfg.steer_limit_timer, cfg.sat_check_min_speed),
            steer_max: cfg.steer_max,
        }
    }

    /// Current `[angle, rate, accel]` estimate.
    pub fn estimate(&self) -> [f64; 3] {
        self.x
    }

    fn observe(&mut self, angle_rad: f64, rate_rad: f64) {
        let y = [angle_rad, rate_rad];
        let prev = self.x;
        for i in 0..3 {
            self.x[i] = self.a_k[i][0] * prev[0]
                + self.a_k[i][1] * prev[1]
                + self.a_k[i][2] * prev[2]
                + K[i][0] * y[0]
                + K[i][1] * y[1];
        }
    }
}

impl LateralControl for IndiLateral {
    fn kind(&self) -> LateralKind {
        LateralKind::Indi
    }

    fn update(&mut self, input: &LateralInput<'_>) -> LateralOutput {
        let vs = input.vehicle;
        let v = vs.v_ego;
        self.observe(
            vs.steering_angle_deg.to_radians(),
            vs.steering_rate_deg.to_radians(),
        );

        let steers_des = input
            .model
            .get_steer_from_curvature(-input.desired_curvature, v, input.live.roll)
            + input.live.angle_offset_deg.to_radians();
        let rate_des = input
            .model
            .get_steer_from_curvature(-input.desired_curvature_rate, v, 0.0);

        let mut debug = IndiDebug {
            steering_angle_deg: self.x[0].to_degrees(),
            steering_rate_deg: self.x[1].to_degrees(),
            steering_accel_deg: self.x[2].to_degrees(),
            ..Default::default()
        };

        if !input.active {
            self.reset();
            return LateralOutput {
                steer: 0.0,
                steering_angle_deg: steers_des.to_degrees(),
                debug: LateralDebugState::Indi(debug),
            };
        }

        self.steer_filter
            .update_alpha(self.tuning.time_constant.eval(v));
        self.steer_filter.update(self.output_steer);

        let outer = self.tuning.outer_loop_gain.eval(v);
        let inner = self.tuning.inner_loop_gain.eval(v);
        let g = self.tuning.actuator_effectiveness.eval(v);

        let rate_sp = outer * (steers_des - self.x[0]) + rate_des;
        let accel_sp = inner * (rate_sp - self.x[1]);
        let accel_error = accel_sp - self.x[2];
        let delta_u = accel_error / g;

        let output = (self.steer_filter.value() + delta_u).clamp(-self.steer_max, self.steer_max);
        self.output_steer = output;

        debug.active = true;
        debug.rate_setpoint = rate_sp.to_degrees();
        debug.accel_setpoint = accel_sp.to_degrees();
        debug.accel_error = accel_error.to_degrees();
        debug.delayed_output = self.steer_filter.value();
        debug.delta = delta_u;
        debug.output = output;
        debug.saturated = self.sat.check(
            self.steer_max - output.abs() < 1e-3,
            vs,
            input.steer_limited,
        );

        LateralOutput {
            steer: output,
            steering_angle_deg: steers_des.to_degrees(),
            debug: LateralDebugState::Indi(debug),
        }
    }

    fn reset(&mut self) {
        self.x = [0.0; 3];
        self.steer_filter.reset(0.0);
        self.output_steer = 0.0;
        self.sat.reset();
    }

    fn steer_max(&self) -> f64 {
        self.steer_max
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
