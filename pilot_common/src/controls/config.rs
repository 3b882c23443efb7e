//! Tuning document for the control core.
//!
//! One TOML file with `[shared]`, `[timing]`, `[engagement]`,
//! `[longitudinal]`, `[lateral]`, `[vehicle]` and `[supervisor]` tables.
//! Every numeric field has a default, so an empty document (plus `[shared]`)
//! is a complete configuration. Calibration breakpoints are data here, never
//! constants in the control laws.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "pilot-control"
//!
//! [lateral]
//! controller = "torque"
//! steer_limit_timer = 0.4
//!
//! [lateral.torque]
//! lat_accel_factor = 2.8
//! friction = 0.08
//!
//! [vehicle]
//! mass = 1900.0
//! wheelbase = 2.84
//! steer_ratio_source = { mode = "live", adjust_percent = 5.0 }
//! ```

use serde::{Deserialize, Serialize};

use super::command::LateralKind;
use super::interp::BreakpointTable;
use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    DT_CTRL, MAX_BLEND_MEMBERS, SOFT_DISABLE_TIME, STEER_MAX, TICK_PERIOD_US,
};

// ─── Top-Level ──────────────────────────────────────────────────────

/// Complete control-core configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlsConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub engagement: EngagementConfig,
    #[serde(default)]
    pub longitudinal: LongitudinalConfig,
    #[serde(default)]
    pub lateral: LateralConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

impl ControlsConfig {
    /// Validate every table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        let checks = [
            self.timing.validate(),
            self.engagement.validate(),
            self.longitudinal.validate(),
            self.lateral.validate(),
            self.vehicle.validate(),
            self.supervisor.validate(),
        ];
        for check in checks {
            check.map_err(ConfigError::ValidationError)?;
        }
        if self.lateral.controller == LateralKind::Angle
            && self.vehicle.steer_control != SteerControlType::Angle
        {
            return Err(ConfigError::ValidationError(
                "lateral.controller = \"angle\" requires vehicle.steer_control = \"angle\""
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{name} {value} out of range [{min}, {max}]"));
    }
    Ok(())
}

// ─── [timing] ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Tick period [µs] (default: 10000 = 100 Hz).
    #[serde(default = "default_tick_period_us")]
    pub tick_period_us: u64,

    /// Ticks between configuration file re-reads (default: 500 = 5 s).
    #[serde(default = "default_refresh_ticks")]
    pub refresh_interval_ticks: u32,
}

fn default_tick_period_us() -> u64 {
    TICK_PERIOD_US
}
fn default_refresh_ticks() -> u32 {
    500
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_period_us: default_tick_period_us(),
            refresh_interval_ticks: default_refresh_ticks(),
        }
    }
}

impl TimingConfig {
    pub const TICK_PERIOD_US_MIN: u64 = 1_000;
    pub const TICK_PERIOD_US_MAX: u64 = 100_000;

    /// Tick period [s].
    #[inline]
    pub fn dt(&self) -> f64 {
        self.tick_period_us as f64 / 1_000_000.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tick_period_us < Self::TICK_PERIOD_US_MIN
            || self.tick_period_us > Self::TICK_PERIOD_US_MAX
        {
            return Err(format!(
                "tick_period_us {} out of range [{}, {}]",
                self.tick_period_us,
                Self::TICK_PERIOD_US_MIN,
                Self::TICK_PERIOD_US_MAX
            ));
        }
        if self.refresh_interval_ticks == 0 {
            return Err("refresh_interval_ticks must be at least 1".to_string());
        }
        Ok(())
    }
}

// ─── [engagement] ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementConfig {
    /// Soft-disable grace window [s] (default: 3.0).
    #[serde(default = "default_soft_disable_time")]
    pub soft_disable_time: f64,

    /// The core owns longitudinal control (default: true). When false the
    /// acceleration command stays zero and the longitudinal machine stays Off.
    #[serde(default = "default_true")]
    pub longitudinal_enabled: bool,
}

fn default_soft_disable_time() -> f64 {
    SOFT_DISABLE_TIME
}
fn default_true() -> bool {
    true
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            soft_disable_time: default_soft_disable_time(),
            longitudinal_enabled: true,
        }
    }
}

impl EngagementConfig {
    /// Soft-disable countdown length in ticks.
    #[inline]
    pub fn soft_disable_ticks(&self, dt: f64) -> u32 {
        (self.soft_disable_time / dt).round() as u32
    }

    pub fn validate(&self) -> Result<(), String> {
        check_range("soft_disable_time", self.soft_disable_time, 0.1, 10.0)
    }
}

// ─── [longitudinal] ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongitudinalConfig {
    /// Vehicle needs an explicit Starting phase after a stop.
    #[serde(default = "default_true")]
    pub starting_state: bool,
    /// Speed [m/s] above which Starting hands over to PID.
    #[serde(default = "default_v_ego_starting")]
    pub v_ego_starting: f64,
    /// Acceleration held while Starting [m/s²].
    #[serde(default = "default_start_accel")]
    pub start_accel: f64,
    /// Ceiling of the stopping ramp [m/s²].
    #[serde(default = "default_stop_accel")]
    pub stop_accel: f64,
    /// Stopping ramp rate [m/s³].
    #[serde(default = "default_stopping_decel_rate")]
    pub stopping_decel_rate: f64,
    #[serde(default = "default_long_kp")]
    pub kp: BreakpointTable,
    #[serde(default = "default_long_ki")]
    pub ki: BreakpointTable,
    #[serde(default = "default_one")]
    pub kf: f64,
    /// Fallback lower acceleration bound keyed on speed.
    #[serde(default = "default_accel_min")]
    pub accel_min: BreakpointTable,
    /// Fallback upper acceleration bound keyed on speed.
    #[serde(default = "default_accel_max")]
    pub accel_max: BreakpointTable,
}

fn default_v_ego_starting() -> f64 {
    0.1
}
fn default_start_accel() -> f64 {
    1.0
}
fn default_stop_accel() -> f64 {
    -2.0
}
fn default_stopping_decel_rate() -> f64 {
    0.8
}
fn default_long_kp() -> BreakpointTable {
    BreakpointTable::constant(0.5)
}
fn default_long_ki() -> BreakpointTable {
    BreakpointTable::constant(0.0)
}
fn default_one() -> f64 {
    1.0
}
fn default_accel_min() -> BreakpointTable {
    BreakpointTable::constant(-3.5)
}
fn default_accel_max() -> BreakpointTable {
    BreakpointTable::new(&[0.0, 10.0, 25.0, 40.0], &[2.0, 1.6, 1.0, 0.6])
}

impl Default for LongitudinalConfig {
    fn default() -> Self {
        Self {
            starting_state: true,
            v_ego_starting: default_v_ego_starting(),
            start_accel: default_start_accel(),
            stop_accel: default_stop_accel(),
            stopping_decel_rate: default_stopping_decel_rate(),
            kp: default_long_kp(),
            ki: default_long_ki(),
            kf: 1.0,
            accel_min: default_accel_min(),
            accel_max: default_accel_max(),
        }
    }
}

impl LongitudinalConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_range("v_ego_starting", self.v_ego_starting, 0.0, 5.0)?;
        check_range("start_accel", self.start_accel, 0.0, 4.0)?;
        check_range("stop_accel", self.stop_accel, -5.0, 0.0)?;
        check_range("stopping_decel_rate", self.stopping_decel_rate, 0.0, 10.0)?;
        check_range("longitudinal.kf", self.kf, 0.0, 10.0)?;
        self.kp.validate("longitudinal.kp")?;
        self.ki.validate("longitudinal.ki")?;
        self.accel_min.validate("accel_min")?;
        self.accel_max.validate("accel_max")?;
        if self.accel_min.v.iter().any(|v| *v > 0.0) || self.accel_max.v.iter().any(|v| *v < 0.0)
        {
            return Err("accel_min must be <= 0 and accel_max >= 0".to_string());
        }
        Ok(())
    }
}

// ─── [lateral] ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateralConfig {
    /// Active control law.
    #[serde(default)]
    pub controller: LateralKind,
    /// Steering command bound (normalized).
    #[serde(default = "default_steer_max")]
    pub steer_max: f64,
    /// Saturation dwell before a warning [s].
    #[serde(default = "default_steer_limit_timer")]
    pub steer_limit_timer: f64,
    /// Lateral actuation is blocked at or below this speed [m/s]; 0 disables.
    #[serde(default)]
    pub min_steer_speed: f64,
    /// Saturation dwell of torque-commanding variants only counts above
    /// this speed [m/s].
    #[serde(default = "default_sat_check_min_speed")]
    pub sat_check_min_speed: f64,
    /// Saturation dwell of the angle variant only counts above this speed [m/s].
    #[serde(default = "default_angle_sat_check_min_speed")]
    pub angle_sat_check_min_speed: f64,
    #[serde(default)]
    pub pid: LatPidConfig,
    #[serde(default)]
    pub indi: IndiConfig,
    #[serde(default)]
    pub lqr: LqrConfig,
    #[serde(default)]
    pub torque: TorqueConfig,
    #[serde(default)]
    pub angle: AngleConfig,
    #[serde(default)]
    pub blend: BlendConfig,
}

fn default_steer_max() -> f64 {
    STEER_MAX
}
fn default_steer_limit_timer() -> f64 {
    0.4
}
fn default_sat_check_min_speed() -> f64 {
    10.0
}
fn default_angle_sat_check_min_speed() -> f64 {
    5.0
}

impl Default for LateralConfig {
    fn default() -> Self {
        Self {
            controller: LateralKind::default(),
            steer_max: STEER_MAX,
            steer_limit_timer: default_steer_limit_timer(),
            min_steer_speed: 0.0,
            sat_check_min_speed: default_sat_check_min_speed(),
            angle_sat_check_min_speed: default_angle_sat_check_min_speed(),
            pid: LatPidConfig::default(),
            indi: IndiConfig::default(),
            lqr: LqrConfig::default(),
            torque: TorqueConfig::default(),
            angle: AngleConfig::default(),
            blend: BlendConfig::default(),
        }
    }
}

impl LateralConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_range("steer_max", self.steer_max, 0.01, 1.0)?;
        check_range("steer_limit_timer", self.steer_limit_timer, DT_CTRL, 10.0)?;
        check_range("min_steer_speed", self.min_steer_speed, 0.0, 40.0)?;
        check_range("sat_check_min_speed", self.sat_check_min_speed, 0.0, 40.0)?;
        check_range("angle_sat_check_min_speed", self.angle_sat_check_min_speed, 0.0, 40.0)?;
        self.pid.validate()?;
        self.indi.validate()?;
        self.lqr.validate()?;
        self.torque.validate()?;
        self.angle.validate()?;
        if self.controller == LateralKind::Blend {
            self.blend.validate()?;
        }
        Ok(())
    }
}

/// `[lateral.pid]`: angle-error PID with speed-scheduled gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatPidConfig {
    #[serde(default = "default_lat_kp")]
    pub kp: BreakpointTable,
    #[serde(default = "default_lat_ki")]
    pub ki: BreakpointTable,
    #[serde(default)]
    pub kd: f64,
    /// Feedforward gain on `angle · v²`.
    #[serde(default = "default_lat_kf")]
    pub kf: f64,
    /// Derivative low-pass time constant [s].
    #[serde(default = "default_d_rc")]
    pub derivative_rc: f64,
}

fn default_lat_kp() -> BreakpointTable {
    BreakpointTable::new(&[0.0, 9.0], &[0.1, 0.25])
}
fn default_lat_ki() -> BreakpointTable {
    BreakpointTable::new(&[0.0, 9.0], &[0.01, 0.05])
}
fn default_lat_kf() -> f64 {
    0.00005
}
fn default_d_rc() -> f64 {
    0.05
}

impl Default for LatPidConfig {
    fn default() -> Self {
        Self {
            kp: default_lat_kp(),
            ki: default_lat_ki(),
            kd: 0.0,
            kf: default_lat_kf(),
            derivative_rc: default_d_rc(),
        }
    }
}

impl LatPidConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.kp.validate("lateral.pid.kp")?;
        self.ki.validate("lateral.pid.ki")?;
        check_range("lateral.pid.kd", self.kd, 0.0, 10.0)?;
        check_range("lateral.pid.kf", self.kf, 0.0, 1.0)?;
        check_range("lateral.pid.derivative_rc", self.derivative_rc, 0.0, 5.0)
    }
}

/// `[lateral.indi]`: cascaded rate/accel controller. Gains keyed on speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndiConfig {
    #[serde(default = "default_indi_inner")]
    pub inner_loop_gain: BreakpointTable,
    #[serde(default = "default_indi_outer")]
    pub outer_loop_gain: BreakpointTable,
    /// Output filter time constant [s].
    #[serde(default = "default_indi_rc")]
    pub time_constant: BreakpointTable,
    #[serde(default = "default_indi_g")]
    pub actuator_effectiveness: BreakpointTable,
}

fn default_indi_inner() -> BreakpointTable {
    BreakpointTable::constant(4.0)
}
fn default_indi_outer() -> BreakpointTable {
    BreakpointTable::constant(3.0)
}
fn default_indi_rc() -> BreakpointTable {
    BreakpointTable::constant(1.0)
}
fn default_indi_g() -> BreakpointTable {
    BreakpointTable::constant(1.0)
}

impl Default for IndiConfig {
    fn default() -> Self {
        Self {
            inner_loop_gain: default_indi_inner(),
            outer_loop_gain: default_indi_outer(),
            time_constant: default_indi_rc(),
            actuator_effectiveness: default_indi_g(),
        }
    }
}

impl IndiConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.inner_loop_gain.validate("lateral.indi.inner_loop_gain")?;
        self.outer_loop_gain.validate("lateral.indi.outer_loop_gain")?;
        self.time_constant.validate("lateral.indi.time_constant")?;
        self.actuator_effectiveness
            .validate("lateral.indi.actuator_effectiveness")?;
        if self.actuator_effectiveness.v.iter().any(|g| *g <= 0.0) {
            return Err("lateral.indi.actuator_effectiveness must be > 0".to_string());
        }
        if self.time_constant.v.iter().any(|rc| *rc < 0.0) {
            return Err("lateral.indi.time_constant must be >= 0".to_string());
        }
        Ok(())
    }
}

/// `[lateral.lqr]`: discrete two-state model, observer and feedback gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LqrConfig {
    #[serde(default = "default_lqr_scale")]
    pub scale: f64,
    #[serde(default = "default_lqr_ki")]
    pub ki: f64,
    #[serde(default = "default_lqr_dc_gain")]
    pub dc_gain: f64,
    /// State transition, row major.
    #[serde(default = "default_lqr_a")]
    pub a: [f64; 4],
    #[serde(default = "default_lqr_b")]
    pub b: [f64; 2],
    #[serde(default = "default_lqr_c")]
    pub c: [f64; 2],
    /// State feedback gain.
    #[serde(default = "default_lqr_k")]
    pub k: [f64; 2],
    /// Observer gain.
    #[serde(default = "default_lqr_l")]
    pub l: [f64; 2],
}

fn default_lqr_scale() -> f64 {
    1700.0
}
fn default_lqr_ki() -> f64 {
    0.01
}
fn default_lqr_dc_gain() -> f64 {
    0.0027
}
fn default_lqr_a() -> [f64; 4] {
    [0.0, 1.0, -0.22619643, 1.21822268]
}
fn default_lqr_b() -> [f64; 2] {
    [-1.92006585e-04, 3.95603032e-05]
}
fn default_lqr_c() -> [f64; 2] {
    [1.0, 0.0]
}
fn default_lqr_k() -> [f64; 2] {
    [-110.73572306, 451.22718255]
}
fn default_lqr_l() -> [f64; 2] {
    [0.3233671, 0.3185757]
}

impl Default for LqrConfig {
    fn default() -> Self {
        Self {
            scale: default_lqr_scale(),
            ki: default_lqr_ki(),
            dc_gain: default_lqr_dc_gain(),
            a: default_lqr_a(),
            b: default_lqr_b(),
            c: default_lqr_c(),
            k: default_lqr_k(),
            l: default_lqr_l(),
        }
    }
}

impl LqrConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_range("lateral.lqr.scale", self.scale, 1.0, 1e5)?;
        check_range("lateral.lqr.ki", self.ki, 0.0, 1.0)?;
        if !self.dc_gain.is_finite() || self.dc_gain.abs() < 1e-9 {
            return Err("lateral.lqr.dc_gain must be finite and non-zero".to_string());
        }
        let all = self
            .a
            .iter()
            .chain(&self.b)
            .chain(&self.c)
            .chain(&self.k)
            .chain(&self.l);
        if all.into_iter().any(|x| !x.is_finite()) {
            return Err("lateral.lqr matrices must be finite".to_string());
        }
        Ok(())
    }
}

/// `[lateral.torque]`: lateral-acceleration controller with friction model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorqueConfig {
    #[serde(default = "default_one")]
    pub kp: f64,
    #[serde(default = "default_torque_ki")]
    pub ki: f64,
    #[serde(default)]
    pub kd: f64,
    #[serde(default = "default_one")]
    pub kf: f64,
    /// Lateral acceleration per unit torque [m/s²].
    #[serde(default = "default_lat_accel_factor")]
    pub lat_accel_factor: f64,
    #[serde(default)]
    pub lat_accel_offset: f64,
    /// Friction torque (normalized).
    #[serde(default = "default_friction")]
    pub friction: f64,
    /// Lateral acceleration error [m/s²] at which full friction applies.
    #[serde(default = "default_friction_threshold")]
    pub friction_threshold: f64,
    #[serde(default = "default_true")]
    pub friction_compensation: bool,
    /// Measure curvature from the steering angle. When false and a yaw rate
    /// is available, blend toward the yaw-rate curvature above 2 m/s.
    #[serde(default = "default_true")]
    pub use_steering_angle: bool,
    #[serde(default)]
    pub steering_angle_deadzone_deg: f64,
    /// Low-speed curvature gain keyed on speed; squared before use.
    #[serde(default = "default_low_speed_factor")]
    pub low_speed_factor: BreakpointTable,
    /// Prefer live torque parameters when supplied.
    #[serde(default = "default_true")]
    pub use_live_parameters: bool,
    /// Below this speed the integrator is frozen [m/s].
    #[serde(default = "default_freeze_integrator_speed")]
    pub freeze_integrator_speed: f64,
}

fn default_torque_ki() -> f64 {
    0.1
}
fn default_lat_accel_factor() -> f64 {
    2.5
}
fn default_friction() -> f64 {
    0.1
}
fn default_friction_threshold() -> f64 {
    0.3
}
fn default_freeze_integrator_speed() -> f64 {
    5.0
}
fn default_low_speed_factor() -> BreakpointTable {
    BreakpointTable::new(&[0.0, 10.0, 20.0, 30.0], &[15.0, 13.0, 10.0, 5.0])
}

impl Default for TorqueConfig {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: default_torque_ki(),
            kd: 0.0,
            kf: 1.0,
            lat_accel_factor: default_lat_accel_factor(),
            lat_accel_offset: 0.0,
            friction: default_friction(),
            friction_threshold: default_friction_threshold(),
            friction_compensation: true,
            use_steering_angle: true,
            steering_angle_deadzone_deg: 0.0,
            low_speed_factor: default_low_speed_factor(),
            use_live_parameters: true,
            freeze_integrator_speed: default_freeze_integrator_speed(),
        }
    }
}

impl TorqueConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_range("lateral.torque.kp", self.kp, 0.0, 10.0)?;
        check_range("lateral.torque.ki", self.ki, 0.0, 10.0)?;
        check_range("lateral.torque.kd", self.kd, 0.0, 10.0)?;
        check_range("lateral.torque.kf", self.kf, 0.0, 10.0)?;
        check_range("lateral.torque.lat_accel_factor", self.lat_accel_factor, 0.1, 10.0)?;
        check_range("lateral.torque.lat_accel_offset", self.lat_accel_offset, -1.0, 1.0)?;
        check_range("lateral.torque.friction", self.friction, 0.0, 1.0)?;
        check_range("lateral.torque.friction_threshold", self.friction_threshold, 0.01, 5.0)?;
        check_range(
            "lateral.torque.freeze_integrator_speed",
            self.freeze_integrator_speed,
            0.0,
            40.0,
        )?;
        check_range(
            "lateral.torque.steering_angle_deadzone_deg",
            self.steering_angle_deadzone_deg,
            0.0,
            10.0,
        )?;
        self.low_speed_factor.validate("lateral.torque.low_speed_factor")
    }
}

/// `[lateral.angle]`: direct angle command for steer-by-wire racks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleConfig {
    /// Desired angle rate limit [deg/s]; 0 disables.
    #[serde(default = "default_angle_rate")]
    pub max_angle_rate_deg: f64,
}

fn default_angle_rate() -> f64 {
    300.0
}

impl Default for AngleConfig {
    fn default() -> Self {
        Self {
            max_angle_rate_deg: default_angle_rate(),
        }
    }
}

impl AngleConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_range("lateral.angle.max_angle_rate_deg", self.max_angle_rate_deg, 0.0, 2000.0)
    }
}

/// How a blend picks between its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMethod {
    /// Discrete selection by speed band, re-sampled on a slow timer.
    #[default]
    SpeedThreshold,
    /// Discrete selection by steering angle band, re-sampled on a slow timer.
    AngleThreshold,
    /// Continuous interpolation of outputs across speed breakpoints.
    SpeedInterp,
    /// Continuous interpolation of outputs across steering angle breakpoints.
    AngleInterp,
}

impl BlendMethod {
    pub const fn is_interp(self) -> bool {
        matches!(self, Self::SpeedInterp | Self::AngleInterp)
    }

    pub const fn keyed_on_speed(self) -> bool {
        matches!(self, Self::SpeedThreshold | Self::SpeedInterp)
    }
}

/// `[lateral.blend]`: composition of other lateral controllers.
///
/// Threshold methods need one more member than breakpoints (member `i` is
/// selected below breakpoint `i`, the last one above every breakpoint).
/// Interpolation methods pair each member with one breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendConfig {
    #[serde(default)]
    pub method: BlendMethod,
    #[serde(default = "default_blend_members")]
    pub members: Vec<LateralKind>,
    /// Speed [m/s] or absolute steering angle [deg] breakpoints.
    #[serde(default = "default_blend_breakpoints")]
    pub breakpoints: Vec<f64>,
    #[serde(default = "default_speed_reselect")]
    pub speed_reselect_ticks: u32,
    #[serde(default = "default_angle_reselect")]
    pub angle_reselect_ticks: u32,
}

fn default_blend_members() -> Vec<LateralKind> {
    vec![LateralKind::Pid, LateralKind::Lqr, LateralKind::Torque]
}
fn default_blend_breakpoints() -> Vec<f64> {
    vec![8.33, 16.67]
}
fn default_speed_reselect() -> u32 {
    300
}
fn default_angle_reselect() -> u32 {
    150
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            method: BlendMethod::default(),
            members: default_blend_members(),
            breakpoints: default_blend_breakpoints(),
            speed_reselect_ticks: default_speed_reselect(),
            angle_reselect_ticks: default_angle_reselect(),
        }
    }
}

impl BlendConfig {
    /// Re-selection cadence for the configured method.
    pub fn reselect_ticks(&self) -> u32 {
        if self.method.keyed_on_speed() {
            self.speed_reselect_ticks
        } else {
            self.angle_reselect_ticks
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let n = self.members.len();
        if !(2..=MAX_BLEND_MEMBERS).contains(&n) {
            return Err(format!(
                "lateral.blend.members: {n} members, expected 2..={MAX_BLEND_MEMBERS}"
            ));
        }
        if self
            .members
            .iter()
            .any(|m| matches!(m, LateralKind::Blend | LateralKind::Angle))
        {
            return Err("lateral.blend.members may only hold torque-commanding controllers".to_string());
        }
        let expected = if self.method.is_interp() { n } else { n - 1 };
        if self.breakpoints.len() != expected {
            return Err(format!(
                "lateral.blend.breakpoints: {} given, {expected} required for {n} members",
                self.breakpoints.len()
            ));
        }
        if self.breakpoints.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err("lateral.blend.breakpoints must be finite and >= 0".to_string());
        }
        if self.breakpoints.windows(2).any(|w| w[1] <= w[0]) {
            return Err("lateral.blend.breakpoints must be strictly ascending".to_string());
        }
        if self.reselect_ticks() == 0 {
            return Err("lateral.blend reselect ticks must be at least 1".to_string());
        }
        Ok(())
    }
}

// ─── [vehicle] ──────────────────────────────────────────────────────

/// How the steering rack is commanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteerControlType {
    #[default]
    Torque,
    Angle,
}

/// Where the vehicle model takes its steering ratio from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SteerRatioSource {
    /// Use the live estimate, scaled by `1 + adjust_percent / 100`.
    Live {
        #[serde(default)]
        adjust_percent: f64,
    },
    /// Always use `vehicle.steer_ratio`.
    Fixed,
}

impl Default for SteerRatioSource {
    fn default() -> Self {
        Self::Live {
            adjust_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Vehicle mass including standard cargo [kg].
    #[serde(default = "default_mass")]
    pub mass: f64,
    #[serde(default = "default_wheelbase")]
    pub wheelbase: f64,
    /// Center of gravity position as a fraction of the wheelbase from the
    /// front axle.
    #[serde(default = "default_center_to_front_ratio")]
    pub center_to_front_ratio: f64,
    /// Tire stiffness scale relative to the reference vehicle.
    #[serde(default = "default_one")]
    pub tire_stiffness_factor: f64,
    /// Calibrated steering ratio.
    #[serde(default = "default_steer_ratio")]
    pub steer_ratio: f64,
    #[serde(default)]
    pub steer_ratio_source: SteerRatioSource,
    #[serde(default)]
    pub steer_control: SteerControlType,
}

fn default_mass() -> f64 {
    1900.0
}
fn default_wheelbase() -> f64 {
    2.84
}
fn default_center_to_front_ratio() -> f64 {
    0.4
}
fn default_steer_ratio() -> f64 {
    13.5
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: default_mass(),
            wheelbase: default_wheelbase(),
            center_to_front_ratio: default_center_to_front_ratio(),
            tire_stiffness_factor: 1.0,
            steer_ratio: default_steer_ratio(),
            steer_ratio_source: SteerRatioSource::default(),
            steer_control: SteerControlType::default(),
        }
    }
}

impl VehicleConfig {
    #[inline]
    pub fn center_to_front(&self) -> f64 {
        self.wheelbase * self.center_to_front_ratio
    }

    pub fn validate(&self) -> Result<(), String> {
        check_range("mass", self.mass, 300.0, 10_000.0)?;
        check_range("wheelbase", self.wheelbase, 1.0, 6.0)?;
        check_range("center_to_front_ratio", self.center_to_front_ratio, 0.1, 0.9)?;
        check_range("tire_stiffness_factor", self.tire_stiffness_factor, 0.1, 5.0)?;
        check_range("steer_ratio", self.steer_ratio, 1.0, 40.0)?;
        if let SteerRatioSource::Live { adjust_percent } = self.steer_ratio_source {
            check_range("steer_ratio_source.adjust_percent", adjust_percent, -50.0, 50.0)?;
        }
        Ok(())
    }
}

// ─── [supervisor] ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Driver steering input suppresses saturation checks this long [s].
    #[serde(default = "default_debounce")]
    pub steer_pressed_debounce: f64,
    /// Desired/actual lateral acceleration ratio that counts as undershoot.
    #[serde(default = "default_ratio")]
    pub lateral_accel_ratio: f64,
    /// Desired lateral acceleration that counts as turning [m/s²].
    #[serde(default = "default_one")]
    pub turning_lateral_accel: f64,
    /// Minimum speed for the torque check [m/s].
    #[serde(default = "default_supervisor_speed")]
    pub min_speed: f64,
    /// A command within this margin of the controller's `steer_max` counts
    /// as maxed out.
    #[serde(default = "default_max_torque_margin")]
    pub max_torque_margin: f64,
    /// Added to the measured lateral acceleration before taking the
    /// undershoot ratio [m/s²].
    #[serde(default = "default_lateral_accel_eps")]
    pub lateral_accel_eps: f64,
    /// Planned path offset that counts as deviating [m].
    #[serde(default = "default_path_deviation")]
    pub path_deviation: f64,
}

fn default_debounce() -> f64 {
    2.0
}
fn default_ratio() -> f64 {
    1.2
}
fn default_supervisor_speed() -> f64 {
    5.0
}
fn default_max_torque_margin() -> f64 {
    0.01
}
fn default_lateral_accel_eps() -> f64 {
    1e-3
}
fn default_path_deviation() -> f64 {
    0.20
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            steer_pressed_debounce: default_debounce(),
            lateral_accel_ratio: default_ratio(),
            turning_lateral_accel: 1.0,
            min_speed: default_supervisor_speed(),
            max_torque_margin: default_max_torque_margin(),
            lateral_accel_eps: default_lateral_accel_eps(),
            path_deviation: default_path_deviation(),
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_range("steer_pressed_debounce", self.steer_pressed_debounce, 0.0, 10.0)?;
        check_range("lateral_accel_ratio", self.lateral_accel_ratio, 1.0, 10.0)?;
        check_range("turning_lateral_accel", self.turning_lateral_accel, 0.0, 10.0)?;
        check_range("supervisor.min_speed", self.min_speed, 0.0, 40.0)?;
        check_range("max_torque_margin", self.max_torque_margin, 1e-4, 0.5)?;
        check_range("lateral_accel_eps", self.lateral_accel_eps, 1e-6, 1.0)?;
        check_range("path_deviation", self.path_deviation, 0.0, 2.0)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
