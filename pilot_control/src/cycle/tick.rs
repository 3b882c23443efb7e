//! One control tick: events → engagement → gating → longitudinal + lateral →
//! supervisor → command.
//!
//! [`ControlsCore`] owns every piece of per-session controller state. Nothing
//! here allocates once constructed: staged configurations arrive with their
//! controllers already built.

use pilot_common::consts::{
    MAX_LATERAL_JERK, MIN_CURVATURE_SPEED, MIN_LATERAL_CONTROL_SPEED,
    STEER_ANGLE_SATURATION_THRESHOLD, STEER_TORQUE_LIMITED_EPS,
};
use pilot_common::controls::command::ActuatorCommand;
use pilot_common::controls::config::{ControlsConfig, SteerControlType, SteerRatioSource};
use pilot_common::controls::events::{EventName, EventType};
use pilot_common::controls::fault::ControlFault;
use pilot_common::controls::snapshot::{AccelLimits, TickInputs};
use pilot_common::controls::state::{EngagementState, LongControlState};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, ConfigSnapshot};
use crate::control::longitudinal::{LongControl, accel_limits_for_speed};
use crate::control::vehicle_model::VehicleModel;
use crate::lateral::{LateralControl, LateralController, LateralInput};
use crate::safety::sanitize::{sanitize_command, sanitize_inputs};
use crate::safety::saturation::{SaturationSupervisor, SupervisorInput};
use crate::state::engagement::EngagementMachine;

// ─── Tick Report ────────────────────────────────────────────────────

/// Everything observable about one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    /// 1-based tick counter.
    pub tick: u64,
    /// The command handed to the publisher this tick.
    pub command: ActuatorCommand,
    pub engagement: EngagementState,
    pub enabled: bool,
    pub active: bool,
    pub lat_active: bool,
    pub long_active: bool,
    pub faults: ControlFault,
    /// Warning raised for the next tick's event set.
    pub warning: Option<EventName>,
    /// Jerk-limited desired curvature [1/m].
    pub desired_curvature: f64,
    pub config_generation: u64,
}

// ─── Controllers ────────────────────────────────────────────────────

/// Controller state derived from one configuration.
#[derive(Debug, Clone)]
struct Controllers {
    long: LongControl,
    lateral: LateralController,
    model: VehicleModel,
    supervisor: SaturationSupervisor,
    soft_disable_ticks: u32,
}

impl Controllers {
    fn build(cfg: &ControlsConfig, dt: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            long: LongControl::new(&cfg.longitudinal, dt),
            lateral: LateralController::from_config(&cfg.lateral, dt)?,
            model: VehicleModel::new(&cfg.vehicle),
            supervisor: SaturationSupervisor::new(
                &cfg.supervisor,
                dt,
                cfg.lateral.steer_limit_timer,
            ),
            soft_disable_ticks: cfg.engagement.soft_disable_ticks(dt),
        })
    }
}

// ─── Controls Core ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ControlsCore {
    config: ConfigSnapshot,
    staged: Option<(ConfigSnapshot, Controllers)>,
    dt: f64,
    engagement: EngagementMachine,
    ctl: Controllers,
    /// Supervisor warning carried into the next tick.
    pending_warning: Option<EventName>,
    desired_curvature: f64,
    last_command: ActuatorCommand,
    last_lat_active: bool,
    tick: u64,
}

impl ControlsCore {
    /// Build a core in Disabled with zeroed controller state.
    pub fn new(config: ConfigSnapshot) -> Result<Self, ConfigError> {
        let dt = config.dt();
        let ctl = Controllers::build(config.config(), dt)?;
        Ok(Self {
            engagement: EngagementMachine::new(ctl.soft_disable_ticks),
            config,
            staged: None,
            dt,
            ctl,
            pending_warning: None,
            desired_curvature: 0.0,
            last_command: ActuatorCommand::neutral(LongControlState::Off),
            last_lat_active: false,
            tick: 0,
        })
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &ConfigSnapshot {
        &self.config
    }

    /// Newest known configuration: the staged one if pending.
    pub fn latest_config(&self) -> &ConfigSnapshot {
        self.staged.as_ref().map_or(&self.config, |(s, _)| s)
    }

    #[inline]
    pub fn has_staged_config(&self) -> bool {
        self.staged.is_some()
    }

    #[inline]
    pub fn engagement_state(&self) -> EngagementState {
        self.engagement.state()
    }

    #[inline]
    pub fn engagement(&self) -> &EngagementMachine {
        &self.engagement
    }

    #[inline]
    pub fn lateral(&self) -> &LateralController {
        &self.ctl.lateral
    }

    #[inline]
    pub fn longitudinal(&self) -> &LongControl {
        &self.ctl.long
    }

    #[inline]
    pub fn last_command(&self) -> &ActuatorCommand {
        &self.last_command
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Queue a configuration. It takes effect on the first tick that starts
    /// in Disabled; a later stage replaces an earlier one.
    pub fn stage_config(&mut self, snapshot: ConfigSnapshot) -> Result<(), ConfigError> {
        if snapshot.config().timing.tick_period_us != self.config.config().timing.tick_period_us {
            return Err(ConfigError::ReloadScopeViolation(
                "tick_period_us cannot change while running".to_string(),
            ));
        }
        let ctl = Controllers::build(snapshot.config(), self.dt)?;
        info!(generation = snapshot.generation(), "configuration staged");
        self.staged = Some((snapshot, ctl));
        Ok(())
    }

    fn apply_staged(&mut self) {
        if let Some((snapshot, ctl)) = self.staged.take() {
            info!(
                from = self.config.generation(),
                to = snapshot.generation(),
                controller = %snapshot.config().lateral.controller,
                "configuration applied"
            );
            self.engagement.set_soft_disable_ticks(ctl.soft_disable_ticks);
            self.ctl = ctl;
            self.config = snapshot;
        }
    }

    /// Run one tick.
    pub fn tick(&mut self, inputs: &TickInputs) -> TickReport {
        self.tick += 1;
        let mut inputs = inputs.clone();
        let mut faults = sanitize_inputs(&mut inputs);

        if self.engagement.state() == EngagementState::Disabled {
            self.apply_staged();
        }
        let snapshot = self.config.clone();
        let cfg = snapshot.config();

        // ── Event set ──
        if let Some(warning) = self.pending_warning.take() {
            if !inputs.events.add(warning) {
                error!(event = ?warning, "event set full, warning dropped");
                faults |= ControlFault::EVENT_OVERFLOW;
            }
        }

        // ── Engagement ──
        let update = self.engagement.update(&inputs.events);
        let vs = &inputs.vehicle;

        // ── Vehicle model ──
        let steer_ratio = match cfg.vehicle.steer_ratio_source {
            SteerRatioSource::Live { adjust_percent } => {
                inputs.live.steer_ratio * (1.0 + adjust_percent / 100.0)
            }
            SteerRatioSource::Fixed => cfg.vehicle.steer_ratio,
        };
        if self.ctl.model.update_params(inputs.live.stiffness_factor, steer_ratio) {
            faults |= ControlFault::LIVE_PARAMS_CLAMPED;
        }

        // ── Gating ──
        let enabled = self.engagement.is_enabled();
        let active = self.engagement.is_active() && !faults.has_critical();
        let min_steer_speed = cfg.lateral.min_steer_speed;
        let standstill = vs.standstill
            || (min_steer_speed > 0.0
                && vs.v_ego <= min_steer_speed.max(MIN_LATERAL_CONTROL_SPEED));
        let lat_active = active && !vs.has_steer_fault() && !standstill;
        let long_active = active
            && cfg.engagement.longitudinal_enabled
            && !inputs.events.contains(EventType::OVERRIDE_LONGITUDINAL);

        // ── Transport feedback ──
        let steer_limited = match inputs.applied {
            Some(applied) if self.last_lat_active => match cfg.vehicle.steer_control {
                SteerControlType::Torque => {
                    (self.last_command.steer - applied.steer).abs() > STEER_TORQUE_LIMITED_EPS
                }
                SteerControlType::Angle => {
                    (self.last_command.steering_angle_deg - applied.steering_angle_deg).abs()
                        > STEER_ANGLE_SATURATION_THRESHOLD
                }
            },
            _ => false,
        };
        if steer_limited {
            faults |= ControlFault::STEER_LIMITED;
        }

        // ── Desired curvature ──
        let v = vs.v_ego.max(MIN_CURVATURE_SPEED);
        let max_curvature_rate = MAX_LATERAL_JERK / (v * v);
        let step = max_curvature_rate * self.dt;
        let plan = &inputs.lat_plan;
        let desired_curvature = plan
            .curvature
            .clamp(self.desired_curvature - step, self.desired_curvature + step);
        let desired_curvature_rate = plan
            .curvature_rate
            .clamp(-max_curvature_rate, max_curvature_rate);
        if desired_curvature != plan.curvature {
            faults |= ControlFault::CURVATURE_LIMITED;
        }
        self.desired_curvature = desired_curvature;

        // ── Acceleration limits ──
        let table = || accel_limits_for_speed(&cfg.longitudinal, vs.v_ego);
        let limits = match inputs.accel_limits {
            Some(l) if l.min <= l.max => l,
            Some(AccelLimits { min, max }) => {
                warn!(min, max, "inverted acceleration limits, using speed table");
                table()
            }
            None => table(),
        };

        // ── Session reset on deactivation ──
        if update.deactivated() || update.disengaged() {
            self.ctl.long.deactivate();
            self.ctl.lateral.reset();
            self.ctl.supervisor.reset();
        }

        // ── Longitudinal ──
        let accel = self.ctl.long.update(long_active, vs, &inputs.long_plan, limits);

        // ── Lateral ──
        let lat_out = self.ctl.lateral.update(&LateralInput {
            active: lat_active,
            vehicle: vs,
            model: &self.ctl.model,
            live: &inputs.live,
            prior: &self.last_command,
            steer_limited,
            desired_curvature,
            desired_curvature_rate,
        });

        let mut command = ActuatorCommand {
            steer: if lat_active { lat_out.steer } else { 0.0 },
            steering_angle_deg: lat_out.steering_angle_deg,
            accel: if long_active { accel } else { 0.0 },
            long_control_state: self.ctl.long.state(),
            lateral_debug: lat_out.debug,
        };
        faults |= sanitize_command(&mut command);

        // ── Supervisor ──
        let warning = self.ctl.supervisor.update(&SupervisorInput {
            lat_active,
            vehicle: vs,
            check: self.ctl.lateral.saturation_check(),
            steer_control: cfg.vehicle.steer_control,
            output: &lat_out,
            steer_max: self.ctl.lateral.steer_max(),
            path_offset: plan.path_offset,
        });
        self.pending_warning = warning;

        debug!(
            tick = self.tick,
            state = ?update.current,
            lat_active,
            long_active,
            long_state = self.ctl.long.state().tag(),
            steer = command.steer,
            accel = command.accel,
            faults = faults.bits(),
            "tick"
        );

        self.last_command = command;
        self.last_lat_active = lat_active;

        TickReport {
            tick: self.tick,
            command,
            engagement: update.current,
            enabled,
            active,
            lat_active,
            long_active,
            faults,
            warning,
            desired_curvature,
            config_generation: snapshot.generation(),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
