//! System-wide constants for the pilot workspace.
//!
//! Single source of truth for tick timing and the fixed thresholds of the
//! control laws. Tunable values live in [`crate::controls::config`] and only
//! take their defaults from here.

use static_assertions::const_assert;

/// Nominal tick period in microseconds (100 Hz).
pub const TICK_PERIOD_US: u64 = 10_000;

/// Nominal tick period [s].
pub const DT_CTRL: f64 = TICK_PERIOD_US as f64 / 1_000_000.0;

/// Soft-disable grace window in microseconds.
pub const SOFT_DISABLE_TIME_US: u64 = 3_000_000;

/// Soft-disable grace window [s].
pub const SOFT_DISABLE_TIME: f64 = SOFT_DISABLE_TIME_US as f64 / 1_000_000.0;

/// Soft-disable countdown length at the nominal tick period.
pub const SOFT_DISABLE_TICKS: u32 = (SOFT_DISABLE_TIME_US / TICK_PERIOD_US) as u32;

const_assert!(SOFT_DISABLE_TIME_US % TICK_PERIOD_US == 0);
const_assert!(SOFT_DISABLE_TICKS == 300);

/// Capacity of the per-tick event list.
pub const MAX_EVENTS_PER_TICK: usize = 32;

/// Maximum number of lateral controllers composed by a blend.
pub const MAX_BLEND_MEMBERS: usize = 4;

const_assert!(MAX_BLEND_MEMBERS >= 2);

/// Normalized steering command bound.
pub const STEER_MAX: f64 = 1.0;

/// Below this speed [m/s] the lateral controllers stay in reset.
pub const MIN_LATERAL_CONTROL_SPEED: f64 = 0.3;

/// Maximum lateral jerk used to rate-limit the desired curvature [m/s³].
pub const MAX_LATERAL_JERK: f64 = 5.0;

/// Speed floor [m/s] for the curvature rate limit.
pub const MIN_CURVATURE_SPEED: f64 = 1.0;

/// Standard gravity [m/s²].
pub const ACCELERATION_DUE_TO_GRAVITY: f64 = 9.81;

/// Angle error [deg] above which an angle-commanded rack counts as limited.
pub const STEER_ANGLE_SATURATION_THRESHOLD: f64 = 2.5;

/// Commanded vs. applied torque gap above which the transport limited it.
pub const STEER_TORQUE_LIMITED_EPS: f64 = 1e-2;

/// Saturation epsilon for "pinned at maximum" checks.
pub const SATURATION_EPS: f64 = 1e-3;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/pilot.toml";
