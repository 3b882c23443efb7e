//! Actuator command produced once per tick, plus lateral debug records.

use serde::{Deserialize, Serialize};

use super::state::LongControlState;

/// Lateral control law selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateralKind {
    #[default]
    Pid,
    Indi,
    Lqr,
    Torque,
    Angle,
    Blend,
}

impl LateralKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pid => "pid",
            Self::Indi => "indi",
            Self::Lqr => "lqr",
            Self::Torque => "torque",
            Self::Angle => "angle",
            Self::Blend => "blend",
        }
    }
}

impl std::fmt::Display for LateralKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Debug Records ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidDebug {
    pub active: bool,
    pub steering_angle_deg: f64,
    pub steering_rate_deg: f64,
    pub angle_error_deg: f64,
    pub p: f64,
    pub i: f64,
    pub f: f64,
    pub output: f64,
    pub saturated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndiDebug {
    pub active: bool,
    pub steering_angle_deg: f64,
    pub steering_rate_deg: f64,
    pub steering_accel_deg: f64,
    pub rate_setpoint: f64,
    pub accel_setpoint: f64,
    pub accel_error: f64,
    pub delayed_output: f64,
    pub delta: f64,
    pub output: f64,
    pub saturated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LqrDebug {
    pub active: bool,
    pub steering_angle_deg: f64,
    pub i: f64,
    pub lqr_output: f64,
    pub output: f64,
    pub saturated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TorqueDebug {
    pub active: bool,
    pub error: f64,
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub f: f64,
    pub actual_lateral_accel: f64,
    pub desired_lateral_accel: f64,
    pub output: f64,
    pub saturated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AngleDebug {
    pub active: bool,
    pub steering_angle_deg: f64,
    pub saturated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlendDebug {
    pub active: bool,
    /// Member currently in charge (largest weight when interpolating).
    pub selected: LateralKind,
    /// Speed [m/s] or absolute steering angle [deg] used for selection.
    pub selector: f64,
    pub output: f64,
    pub saturated: bool,
    /// Lateral accelerations [m/s²] of the selected member. Zero unless it
    /// is the torque controller.
    pub desired_lateral_accel: f64,
    pub actual_lateral_accel: f64,
}

/// Variant-specific lateral debug record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LateralDebugState {
    #[default]
    None,
    Pid(PidDebug),
    Indi(IndiDebug),
    Lqr(LqrDebug),
    Torque(TorqueDebug),
    Angle(AngleDebug),
    Blend(BlendDebug),
}

impl LateralDebugState {
    /// Saturation flag reported by the variant.
    pub const fn saturated(&self) -> bool {
        match self {
            Self::None => false,
            Self::Pid(d) => d.saturated,
            Self::Indi(d) => d.saturated,
            Self::Lqr(d) => d.saturated,
            Self::Torque(d) => d.saturated,
            Self::Angle(d) => d.saturated,
            Self::Blend(d) => d.saturated,
        }
    }

    /// Variant that produced the record.
    pub const fn kind(&self) -> Option<LateralKind> {
        match self {
            Self::None => None,
            Self::Pid(_) => Some(LateralKind::Pid),
            Self::Indi(_) => Some(LateralKind::Indi),
            Self::Lqr(_) => Some(LateralKind::Lqr),
            Self::Torque(_) => Some(LateralKind::Torque),
            Self::Angle(_) => Some(LateralKind::Angle),
            Self::Blend(_) => Some(LateralKind::Blend),
        }
    }

    /// Desired and actual lateral acceleration [m/s²] when the command came
    /// from the torque controller, directly or as the selected blend member.
    pub const fn lateral_accel(&self) -> Option<(f64, f64)> {
        match self {
            Self::Torque(d) => Some((d.desired_lateral_accel, d.actual_lateral_accel)),
            Self::Blend(d) if matches!(d.selected, LateralKind::Torque) => {
                Some((d.desired_lateral_accel, d.actual_lateral_accel))
            }
            _ => None,
        }
    }
}

// ─── Actuator Command ───────────────────────────────────────────────

/// Output of one tick, handed by value to the actuator publisher.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// Normalized steering torque in `[-steer_max, steer_max]`.
    /// Zero for angle-commanded racks.
    pub steer: f64,
    /// Desired steering wheel angle [deg].
    pub steering_angle_deg: f64,
    /// Acceleration command [m/s²].
    pub accel: f64,
    pub long_control_state: LongControlState,
    pub lateral_debug: LateralDebugState,
}

impl ActuatorCommand {
    /// Zeroed command with the given longitudinal state tag.
    pub const fn neutral(long_control_state: LongControlState) -> Self {
        Self {
            steer: 0.0,
            steering_angle_deg: 0.0,
            accel: 0.0,
            long_control_state,
            lateral_debug: LateralDebugState::None,
        }
    }
}
