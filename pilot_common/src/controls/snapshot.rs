//! Per-tick inputs produced by collaborators outside the control core.
//!
//! Everything here is read-only to the core and lives for exactly one tick.
//! All structs deserialize with field defaults so a recorded stream may omit
//! anything its producer did not know.

use serde::{Deserialize, Serialize};

use super::events::EventSet;

// ─── Vehicle State ──────────────────────────────────────────────────

/// One immutable view of the vehicle for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleStateSnapshot {
    /// Vehicle speed [m/s].
    pub v_ego: f64,
    /// Measured longitudinal acceleration [m/s²].
    pub a_ego: f64,
    /// Steering wheel angle [deg], left positive.
    pub steering_angle_deg: f64,
    /// Steering wheel rate [deg/s].
    pub steering_rate_deg: f64,
    /// Driver torque on the wheel (normalized or Nm, vehicle specific).
    pub steering_torque: f64,
    /// Torque reported by the steering actuator.
    pub steering_torque_eps: f64,
    /// Driver is actively steering.
    pub steering_pressed: bool,
    pub brake_pressed: bool,
    pub gas_pressed: bool,
    /// Vehicle is stopped.
    pub standstill: bool,
    /// Cruise control is holding the vehicle at standstill.
    pub cruise_standstill: bool,
    /// Steering actuator reports a recoverable fault.
    pub steer_fault_temporary: bool,
    /// Steering actuator reports a non-recoverable fault.
    pub steer_fault_permanent: bool,
    /// Yaw rate [rad/s] from the localizer, when available.
    pub yaw_rate: Option<f64>,
}

impl VehicleStateSnapshot {
    /// Any steering actuator fault that forbids lateral actuation.
    #[inline]
    pub const fn has_steer_fault(&self) -> bool {
        self.steer_fault_temporary || self.steer_fault_permanent
    }
}

// ─── Plans ──────────────────────────────────────────────────────────

/// Which planner branch produced the longitudinal target. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Cruise,
    Lead0,
    Lead1,
    Lead2,
    E2e,
    Stop,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Longitudinal plan value for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LongitudinalPlan {
    /// Target acceleration [m/s²].
    pub a_target: f64,
    /// Planner requests a full stop.
    pub should_stop: bool,
    pub source: PlanSource,
}

/// Lateral plan value for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LateralPlan {
    /// Desired path curvature [1/m], left positive.
    pub curvature: f64,
    /// Desired curvature rate [1/(m·s)].
    pub curvature_rate: f64,
    /// Lateral offset of the planned path at its first point [m], left
    /// positive. Absent when the planner did not publish a path.
    pub path_offset: Option<f64>,
}

// ─── Live Parameters ────────────────────────────────────────────────

/// Lateral-acceleration-to-torque calibration estimated online.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveTorqueParameters {
    /// Lateral acceleration produced by a unit torque command [m/s²].
    pub lat_accel_factor: f64,
    /// Lateral acceleration bias [m/s²].
    pub lat_accel_offset: f64,
    /// Friction torque (normalized).
    pub friction: f64,
}

/// Slowly refreshed calibration snapshot, passed by value into each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveParameters {
    /// Steering ratio (wheel angle / road wheel angle).
    pub steer_ratio: f64,
    /// Tire stiffness scale relative to the configured stiffness.
    pub stiffness_factor: f64,
    /// Instantaneous steering angle offset [deg].
    pub angle_offset_deg: f64,
    /// Long-term average steering angle offset [deg].
    pub angle_offset_average_deg: f64,
    /// Road roll [rad].
    pub roll: f64,
    /// Online torque calibration, when the estimator has converged.
    pub torque: Option<LiveTorqueParameters>,
}

impl Default for LiveParameters {
    fn default() -> Self {
        Self {
            steer_ratio: 15.0,
            stiffness_factor: 1.0,
            angle_offset_deg: 0.0,
            angle_offset_average_deg: 0.0,
            roll: 0.0,
            torque: None,
        }
    }
}

// ─── Transport Feedback ─────────────────────────────────────────────

/// Acceleration bounds for this tick [m/s²].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelLimits {
    pub min: f64,
    pub max: f64,
}

impl AccelLimits {
    #[inline]
    pub fn clamp(&self, accel: f64) -> f64 {
        accel.clamp(self.min, self.max)
    }
}

/// What the transport actually sent on the previous tick after its own
/// rate and magnitude limits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppliedActuators {
    /// Applied normalized steering torque.
    pub steer: f64,
    /// Applied steering angle [deg] for angle-commanded racks.
    pub steering_angle_deg: f64,
}

// ─── Tick Inputs ────────────────────────────────────────────────────

/// Everything the core consumes in one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TickInputs {
    pub vehicle: VehicleStateSnapshot,
    pub long_plan: LongitudinalPlan,
    pub lat_plan: LateralPlan,
    pub live: LiveParameters,
    /// Events raised by collaborators for this tick.
    pub events: EventSet,
    /// Per-tick acceleration bounds. Falls back to the configured speed table.
    pub accel_limits: Option<AccelLimits>,
    /// Transport feedback from the previous tick.
    pub applied: Option<AppliedActuators>,
}
