//! Direct steering-angle command for angle-controlled racks.
//!
//! The torque command is always zero. While inactive the desired angle tracks
//! the measured angle so that engagement starts from where the wheel is.

use pilot_common::consts::STEER_ANGLE_SATURATION_THRESHOLD;
use pilot_common::controls::command::{AngleDebug, LateralDebugState, LateralKind};
use pilot_common::controls::config::LateralConfig;

use super::{LateralControl, LateralInput, LateralOutput, SaturationCounter};
use crate::control::filters::rate_limit;

#[derive(Debug, Clone)]
pub struct AngleLateral {
    /// Maximum desired-angle change per tick [deg]; 0 disables.
    max_step_deg: f64,
    sat: SaturationCounter,
    steer_max: f64,
}

impl AngleLateral {
    pub fn new(cfg: &LateralConfig, dt: f64) -> Self {
        Self {
            max_step_deg: cfg.angle.max_angle_rate_deg * dt,
            sat: SaturationCounter::new(dt, cfg.steer_limit_timer, cfg.angle_sat_check_min_speed),
            steer_max: cfg.steer_max,
        }
    }
}

impl LateralControl for AngleLateral {
    fn kind(&self) -> LateralKind {
        LateralKind::Angle
    }

    fn update(&mut self, input: &LateralInput<'_>) -> LateralOutput {
        let vs = input.vehicle;

        if !input.active {
            self.reset();
            return LateralOutput {
                steer: 0.0,
                steering_angle_deg: vs.steering_angle_deg,
                debug: LateralDebugState::Angle(AngleDebug {
                    active: false,
                    steering_angle_deg: vs.steering_angle_deg,
                    saturated: false,
                }),
            };
        }

        let target = input
            .model
            .get_steer_from_curvature(-input.desired_curvature, vs.v_ego, input.live.roll)
            .to_degrees()
            + input.live.angle_offset_deg;

        // Continue from the last active command, or from the wheel on the
        // first active tick.
        let last = match input.prior.lateral_debug {
            LateralDebugState::Angle(AngleDebug { active: true, .. }) => {
                input.prior.steering_angle_deg
            }
            _ => vs.steering_angle_deg,
        };
        let angle_des = if self.max_step_deg > 0.0 {
            rate_limit(target, last, -self.max_step_deg, self.max_step_deg)
        } else {
            target
        };

        let limited = (angle_des - vs.steering_angle_deg).abs() > STEER_ANGLE_SATURATION_THRESHOLD;
        let saturated = self.sat.check(limited, vs, false);

        LateralOutput {
            steer: 0.0,
            steering_angle_deg: angle_des,
            debug: LateralDebugState::Angle(AngleDebug {
                active: true,
                steering_angle_deg: vs.steering_angle_deg,
                saturated,
            }),
        }
    }

    fn reset(&mut self) {
        self.sat.reset();
    }

    fn steer_max(&self) -> f64 {
        self.steer_max
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
