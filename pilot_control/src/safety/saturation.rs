//! Saturation supervisor.
//!
//! Runs after the lateral update while lateral control is active and the
//! driver has not touched the wheel within the debounce window.
//!
//! | Check           | Raised when                                            |
//! |-----------------|--------------------------------------------------------|
//! | Lateral accel   | undershoot ratio, turning, speed and a command at the  |
//! |                 | controller's `steer_max` all hold for the dwell time   |
//! | Path deviation  | variant reports saturation and the planned path lies   |
//! |                 | beyond the offset on the commanded side                |
//!
//! The result is a `SteerSaturated` warning fed into the next tick's events.

use pilot_common::controls::config::{SteerControlType, SupervisorConfig};
use pilot_common::controls::events::EventName;
use pilot_common::controls::snapshot::VehicleStateSnapshot;
use tracing::warn;

use crate::lateral::{DwellCounter, LateralOutput, SaturationCheck};

/// Inputs of one supervisor evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorInput<'a> {
    pub lat_active: bool,
    pub vehicle: &'a VehicleStateSnapshot,
    pub check: SaturationCheck,
    pub steer_control: SteerControlType,
    pub output: &'a LateralOutput,
    /// Command limit of the active controller.
    pub steer_max: f64,
    /// Planned path offset at the first point [m], left positive.
    pub path_offset: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SaturationSupervisor {
    cfg: SupervisorConfig,
    dt: f64,
    ticks_since_pressed: Option<u32>,
    dwell: DwellCounter,
    raised: bool,
}

impl SaturationSupervisor {
    /// `limit_timer` is the dwell [s] before sustained lateral-accel
    /// saturation is escalated.
    pub fn new(cfg: &SupervisorConfig, dt: f64, limit_timer: f64) -> Self {
        Self {
            cfg: cfg.clone(),
            dt,
            ticks_since_pressed: None,
            dwell: DwellCounter::new(dt, limit_timer),
            raised: false,
        }
    }

    /// Driver steered within the debounce window.
    pub fn recent_steer_pressed(&self) -> bool {
        self.ticks_since_pressed
            .is_some_and(|t| (t as f64) * self.dt < self.cfg.steer_pressed_debounce)
    }

    pub fn reset(&mut self) {
        self.dwell.reset();
        self.raised = false;
    }

    /// Evaluate one tick. Returns the warning to inject next tick.
    pub fn update(&mut self, input: &SupervisorInput<'_>) -> Option<EventName> {
        let vs = input.vehicle;
        self.ticks_since_pressed = if vs.steering_pressed {
            Some(0)
        } else {
            self.ticks_since_pressed.map(|t| t.saturating_add(1))
        };

        if !input.lat_active || self.recent_steer_pressed() {
            self.reset();
            return None;
        }

        let saturated = match input.check {
            SaturationCheck::LateralAccel => self.dwell.tick(self.lateral_accel_saturated(input)),
            SaturationCheck::PathDeviation => {
                self.dwell.reset();
                input.output.saturated() && self.path_deviated(input)
            }
        };

        if saturated && !self.raised {
            warn!(check = ?input.check, v_ego = vs.v_ego, "steering saturated");
        }
        self.raised = saturated;
        saturated.then_some(EventName::SteerSaturated)
    }

    fn lateral_accel_saturated(&self, input: &SupervisorInput<'_>) -> bool {
        let Some((desired, actual)) = input.output.debug.lateral_accel() else {
            return false;
        };
        let desired = desired.abs();
        let undershooting =
            desired / (self.cfg.lateral_accel_eps + actual.abs()) > self.cfg.lateral_accel_ratio;
        let turning = desired > self.cfg.turning_lateral_accel;
        let good_speed = input.vehicle.v_ego > self.cfg.min_speed;
        let max_torque = input.steer_max - input.output.steer.abs() < self.cfg.max_torque_margin;
        undershooting && turning && good_speed && max_torque
    }

    fn path_deviated(&self, input: &SupervisorInput<'_>) -> bool {
        let Some(offset) = input.path_offset else {
            return false;
        };
        let steering = match input.steer_control {
            SteerControlType::Angle => input.output.steering_angle_deg,
            SteerControlType::Torque => input.output.steer,
        };
        let limit = self.cfg.path_deviation;
        (steering > 0.0 && offset < -limit) || (steering < 0.0 && offset > limit)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
