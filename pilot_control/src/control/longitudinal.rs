//! Longitudinal control loop.
//!
//! Runs the state transition, then produces the acceleration command for the
//! resulting state:
//!
//! | State    | Output                                              |
//! |----------|-----------------------------------------------------|
//! | Off      | 0, PID reset                                        |
//! | Stopping | previous output ramped down to `stop_accel`, reset  |
//! | Starting | `start_accel`, reset                                |
//! | PID      | PID on `a_target − a_ego`, feedforward `a_target`   |
//!
//! The per-tick limits clamp every branch last.

use pilot_common::controls::config::LongitudinalConfig;
use pilot_common::controls::snapshot::{AccelLimits, LongitudinalPlan, VehicleStateSnapshot};
use pilot_common::controls::state::LongControlState;
use tracing::error;

use super::pid::{PidController, PidGains};
use crate::state::longitudinal::{LongTransitionInput, long_control_state_trans};

fn gains_from(cfg: &LongitudinalConfig) -> PidGains {
    PidGains {
        kp: cfg.kp.clone(),
        ki: cfg.ki.clone(),
        kd: 0.0,
        kf: cfg.kf,
        derivative_rc: 0.0,
    }
}

/// Acceleration bounds from the configured speed tables.
pub fn accel_limits_for_speed(cfg: &LongitudinalConfig, v_ego: f64) -> AccelLimits {
    AccelLimits {
        min: cfg.accel_min.eval(v_ego),
        max: cfg.accel_max.eval(v_ego),
    }
}

#[derive(Debug, Clone)]
pub struct LongControl {
    cfg: LongitudinalConfig,
    state: LongControlState,
    pid: PidController,
    last_output_accel: f64,
    dt: f64,
}

impl LongControl {
    pub fn new(cfg: &LongitudinalConfig, dt: f64) -> Self {
        let limits = accel_limits_for_speed(cfg, 0.0);
        Self {
            cfg: cfg.clone(),
            state: LongControlState::Off,
            pid: PidController::new(gains_from(cfg), limits.min, limits.max, dt),
            last_output_accel: 0.0,
            dt,
        }
    }

    #[inline]
    pub fn state(&self) -> LongControlState {
        self.state
    }

    #[inline]
    pub fn last_output_accel(&self) -> f64 {
        self.last_output_accel
    }

    #[inline]
    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    /// Zero the integrator.
    pub fn reset(&mut self) {
        self.pid.reset();
    }

    /// Full session reset: Off, zero output, zero integrator.
    pub fn deactivate(&mut self) {
        self.state = LongControlState::Off;
        self.last_output_accel = 0.0;
        self.pid.reset();
    }

    /// Swap in new tuning. Integrator state is discarded.
    pub fn apply_config(&mut self, cfg: &LongitudinalConfig) {
        self.cfg = cfg.clone();
        self.pid.set_gains(gains_from(cfg));
        self.pid.reset();
    }

    /// Run one tick and return the clamped acceleration command [m/s²].
    pub fn update(
        &mut self,
        active: bool,
        vs: &VehicleStateSnapshot,
        plan: &LongitudinalPlan,
        limits: AccelLimits,
    ) -> f64 {
        self.pid.set_limits(limits.min, limits.max);

        let input = LongTransitionInput {
            active,
            v_ego: vs.v_ego,
            should_stop: plan.should_stop,
            brake_pressed: vs.brake_pressed,
            cruise_standstill: vs.cruise_standstill,
        };
        self.state = long_control_state_trans(&self.cfg, self.state, &input);

        let output = match self.state {
            LongControlState::Off => {
                self.reset();
                0.0
            }
            LongControlState::Stopping => {
                let mut out = self.last_output_accel;
                if out > self.cfg.stop_accel {
                    out = out.min(0.0) - self.cfg.stopping_decel_rate * self.dt;
                }
                self.reset();
                out
            }
            LongControlState::Starting => {
                self.reset();
                self.cfg.start_accel
            }
            LongControlState::Pid => {
                let error = plan.a_target - vs.a_ego;
                self.pid.update(error, vs.v_ego, plan.a_target, false, false)
            }
        };

        let output = if output.is_finite() {
            output
        } else {
            error!(state = self.state.tag(), "non-finite acceleration, replaced with 0");
            self.reset();
            0.0
        };
        self.last_output_accel = limits.clamp(output);
        self.last_output_accel
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
