//! Prelude module for common re-exports.
//!
//! ```rust
//! use pilot_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::controls::config::{
    BlendMethod, ControlsConfig, SteerControlType, SteerRatioSource,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DT_CTRL, STEER_MAX, TICK_PERIOD_US};

// ─── Per-Tick Types ─────────────────────────────────────────────────
pub use crate::controls::command::{ActuatorCommand, LateralDebugState, LateralKind};
pub use crate::controls::events::{EventName, EventSet, EventType};
pub use crate::controls::fault::ControlFault;
pub use crate::controls::snapshot::{
    AccelLimits, AppliedActuators, LateralPlan, LiveParameters, LiveTorqueParameters,
    LongitudinalPlan, PlanSource, TickInputs, VehicleStateSnapshot,
};
pub use crate::controls::state::{EngagementState, LongControlState};
