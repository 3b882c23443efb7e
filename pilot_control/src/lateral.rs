//! Lateral control dispatcher.
//!
//! Every control law implements [`LateralControl`]: one `update()` per tick
//! turning the desired curvature into a steering command, plus `reset()`.
//! [`LateralController`] is the tagged union the core owns; the blend
//! variant holds other controllers as members.
//!
//! | Variant  | Command            | Supervisor check  |
//! |----------|--------------------|-------------------|
//! | PID      | torque             | path deviation    |
//! | INDI     | torque             | path deviation    |
//! | LQR      | torque             | path deviation    |
//! | Torque   | torque             | lateral accel     |
//! | Angle    | angle              | path deviation    |
//! | Blend    | member's command   | selected member's |

pub mod angle;
pub mod blend;
pub mod indi;
pub mod lqr;
pub mod pid;
pub mod torque;

use pilot_common::consts::SATURATION_EPS;
use pilot_common::controls::command::{ActuatorCommand, LateralDebugState, LateralKind};
use pilot_common::controls::config::LateralConfig;
use pilot_common::controls::snapshot::{LiveParameters, VehicleStateSnapshot};
use thiserror::Error;

use crate::control::vehicle_model::VehicleModel;

pub use angle::AngleLateral;
pub use blend::BlendLateral;
pub use indi::IndiLateral;
pub use lqr::LqrLateral;
pub use pid::PidLateral;
pub use torque::TorqueLateral;

// ─── Contract ───────────────────────────────────────────────────────

/// Everything a lateral variant reads in one tick.
#[derive(Debug, Clone, Copy)]
pub struct LateralInput<'a> {
    /// Lateral actuation is permitted this tick.
    pub active: bool,
    pub vehicle: &'a VehicleStateSnapshot,
    pub model: &'a VehicleModel,
    pub live: &'a LiveParameters,
    /// Command published on the previous tick.
    pub prior: &'a ActuatorCommand,
    /// The transport limited last tick's steering command.
    pub steer_limited: bool,
    /// Jerk-limited desired curvature [1/m].
    pub desired_curvature: f64,
    pub desired_curvature_rate: f64,
}

/// Result of one lateral update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LateralOutput {
    /// Normalized steering torque. Zero for angle racks.
    pub steer: f64,
    /// Desired steering wheel angle [deg].
    pub steering_angle_deg: f64,
    pub debug: LateralDebugState,
}

impl LateralOutput {
    #[inline]
    pub fn saturated(&self) -> bool {
        self.debug.saturated()
    }
}

/// Which saturation rule the supervisor applies to a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturationCheck {
    /// Desired vs. actual lateral acceleration with the command maxed out.
    LateralAccel,
    /// Variant saturation flag plus deviation from the planned path.
    PathDeviation,
}

pub trait LateralControl {
    fn kind(&self) -> LateralKind;

    /// Compute this tick's command. An inactive update returns a neutral
    /// command and leaves the variant in its reset state.
    fn update(&mut self, input: &LateralInput<'_>) -> LateralOutput;

    /// Zero all persistent state.
    fn reset(&mut self);

    /// Command bound of this variant.
    fn steer_max(&self) -> f64;

    fn saturation_check(&self) -> SaturationCheck {
        SaturationCheck::PathDeviation
    }
}

// ─── Saturation Dwell ───────────────────────────────────────────────

/// Dwell counter: rises by `dt` while a condition holds, falls by `dt`
/// otherwise, bounded to `[0, limit]`. Reports true once it reaches the limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellCounter {
    count: f64,
    rate: f64,
    limit: f64,
}

impl DwellCounter {
    pub fn new(dt: f64, limit: f64) -> Self {
        Self {
            count: 0.0,
            rate: dt,
            limit,
        }
    }

    #[inline]
    pub fn tick(&mut self, condition: bool) -> bool {
        if condition {
            self.count += self.rate;
        } else {
            self.count -= self.rate;
        }
        self.count = self.count.clamp(0.0, self.limit);
        self.count > self.limit - SATURATION_EPS
    }

    #[inline]
    pub fn count(&self) -> f64 {
        self.count
    }

    #[inline]
    pub fn reset(&mut self) {
        self.count = 0.0;
    }
}

/// Per-variant saturation flag: a [`DwellCounter`] that only rises while
/// the vehicle is fast enough, the transport did not limit the command, and
/// the driver is not steering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationCounter {
    dwell: DwellCounter,
    min_speed: f64,
}

impl SaturationCounter {
    pub fn new(dt: f64, limit: f64, min_speed: f64) -> Self {
        Self {
            dwell: DwellCounter::new(dt, limit),
            min_speed,
        }
    }

    pub fn check(
        &mut self,
        saturated: bool,
        vs: &VehicleStateSnapshot,
        steer_limited: bool,
    ) -> bool {
        let counting =
            saturated && vs.v_ego > self.min_speed && !steer_limited && !vs.steering_pressed;
        self.dwell.tick(counting)
    }

    #[inline]
    pub fn reset(&mut self) {
        self.dwell.reset();
    }
}

// ─── Dispatcher ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LateralError {
    #[error("blend member {0} is not allowed")]
    InvalidBlendMember(LateralKind),
    #[error("blend needs at least two members, got {0}")]
    TooFewBlendMembers(usize),
}

/// The configured lateral control law.
#[derive(Debug, Clone)]
pub enum LateralController {
    Pid(PidLateral),
    Indi(IndiLateral),
    Lqr(LqrLateral),
    Torque(TorqueLateral),
    Angle(AngleLateral),
    Blend(BlendLateral),
}

impl LateralController {
    /// Build the controller selected by `cfg.controller`.
    pub fn from_config(cfg: &LateralConfig, dt: f64) -> Result<Self, LateralError> {
        match cfg.controller {
            LateralKind::Blend => Ok(Self::Blend(BlendLateral::new(cfg, dt)?)),
            LateralKind::Angle => Ok(Self::Angle(AngleLateral::new(cfg, dt))),
            kind => Self::member(kind, cfg, dt),
        }
    }

    /// Build a torque-commanding controller usable as a blend member.
    pub fn member(kind: LateralKind, cfg: &LateralConfig, dt: f64) -> Result<Self, LateralError> {
        match kind {
            LateralKind::Pid => Ok(Self::Pid(PidLateral::new(cfg, dt))),
            LateralKind::Indi => Ok(Self::Indi(IndiLateral::new(cfg, dt))),
            LateralKind::Lqr => Ok(Self::Lqr(LqrLateral::new(cfg, dt))),
            LateralKind::Torque => Ok(Self::Torque(TorqueLateral::new(cfg, dt))),
            LateralKind::Angle | LateralKind::Blend => Err(LateralError::InvalidBlendMember(kind)),
        }
    }

    fn inner(&self) -> &dyn LateralControl {
        match self {
            Self::Pid(c) => c,
            Self::Indi(c) => c,
            Self::Lqr(c) => c,
            Self::Torque(c) => c,
            Self::Angle(c) => c,
            Self::Blend(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn LateralControl {
        match self {
            Self::Pid(c) => c,
            Self::Indi(c) => c,
            Self::Lqr(c) => c,
            Self::Torque(c) => c,
            Self::Angle(c) => c,
            Self::Blend(c) => c,
        }
    }
}

impl LateralControl for LateralController {
    fn kind(&self) -> LateralKind {
        self.inner().kind()
    }

    /// Dispatch, then clamp the command to `[-steer_max, steer_max]`.
    fn update(&mut self, input: &LateralInput<'_>) -> LateralOutput {
        let steer_max = self.steer_max();
        let mut out = self.inner_mut().update(input);
        out.steer = out.steer.clamp(-steer_max, steer_max);
        out
    }

    fn reset(&mut self) {
        self.inner_mut().reset();
    }

    fn steer_max(&self) -> f64 {
        self.inner().steer_max()
    }

    fn saturation_check(&self) -> SaturationCheck {
        self.inner().saturation_check()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
