//! Lateral dispatcher contract, checked for every variant.

use pilot_common::consts::DT_CTRL;
use pilot_common::controls::command::{ActuatorCommand, LateralDebugState, LateralKind};
use pilot_common::controls::config::{LateralConfig, SteerControlType, VehicleConfig};
use pilot_common::controls::snapshot::{LiveParameters, VehicleStateSnapshot};
use pilot_control::control::vehicle_model::VehicleModel;
use pilot_control::lateral::{LateralControl, LateralController, LateralInput, LateralOutput};

use super::{core_with, cruise, engage};

// ─── Helpers ────────────────────────────────────────────────────────

const KINDS: [LateralKind; 6] = [
    LateralKind::Pid,
    LateralKind::Indi,
    LateralKind::Lqr,
    LateralKind::Torque,
    LateralKind::Angle,
    LateralKind::Blend,
];

fn build(kind: LateralKind) -> LateralController {
    let cfg = LateralConfig {
        controller: kind,
        ..Default::default()
    };
    LateralController::from_config(&cfg, DT_CTRL).unwrap()
}

struct World {
    vehicle: VehicleStateSnapshot,
    model: VehicleModel,
    live: LiveParameters,
    prior: ActuatorCommand,
}

impl World {
    fn new(v_ego: f64) -> Self {
        Self {
            vehicle: VehicleStateSnapshot {
                v_ego,
                steering_angle_deg: 1.0,
                steering_rate_deg: 0.5,
                yaw_rate: Some(0.02),
                ..Default::default()
            },
            model: VehicleModel::new(&VehicleConfig::default()),
            live: LiveParameters::default(),
            prior: ActuatorCommand::default(),
        }
    }

    fn input(&self, active: bool, curvature: f64) -> LateralInput<'_> {
        LateralInput {
            active,
            vehicle: &self.vehicle,
            model: &self.model,
            live: &self.live,
            prior: &self.prior,
            steer_limited: false,
            desired_curvature: curvature,
            desired_curvature_rate: 0.0,
        }
    }
}

/// Run `ticks` active updates, feeding each output back as the prior command.
fn drive(c: &mut LateralController, w: &mut World, ticks: usize, curvature: f64) -> LateralOutput {
    let mut out = LateralOutput::default();
    for _ in 0..ticks {
        out = c.update(&w.input(true, curvature));
        w.prior.steer = out.steer;
        w.prior.steering_angle_deg = out.steering_angle_deg;
        w.prior.lateral_debug = out.debug;
    }
    out
}

// ─── Contract ───────────────────────────────────────────────────────

#[test]
fn reset_twice_equals_reset_once() {
    for kind in KINDS {
        let mut once = build(kind);
        let mut twice = build(kind);
        let mut w1 = World::new(15.0);
        let mut w2 = World::new(15.0);
        drive(&mut once, &mut w1, 80, 0.01);
        drive(&mut twice, &mut w2, 80, 0.01);

        once.reset();
        twice.reset();
        twice.reset();

        let w = World::new(15.0);
        for _ in 0..20 {
            assert_eq!(
                once.update(&w.input(true, 0.004)),
                twice.update(&w.input(true, 0.004)),
                "{kind}"
            );
        }
    }
}

#[test]
fn reset_restores_fresh_behaviour() {
    for kind in KINDS {
        let mut used = build(kind);
        let mut w = World::new(15.0);
        drive(&mut used, &mut w, 120, 0.02);
        used.reset();

        let mut fresh = build(kind);
        let w = World::new(15.0);
        assert_eq!(
            used.update(&w.input(true, 0.004)),
            fresh.update(&w.input(true, 0.004)),
            "{kind}"
        );
    }
}

#[test]
fn inactive_update_is_neutral_and_resets() {
    for kind in KINDS {
        let mut c = build(kind);
        let mut w = World::new(15.0);
        drive(&mut c, &mut w, 60, 0.02);

        let w = World::new(15.0);
        let out = c.update(&w.input(false, 0.02));
        assert_eq!(out.steer, 0.0, "{kind}");
        assert!(!out.saturated(), "{kind}");
        if kind == LateralKind::Angle {
            assert_eq!(out.steering_angle_deg, w.vehicle.steering_angle_deg);
        }

        let mut fresh = build(kind);
        assert_eq!(
            c.update(&w.input(true, 0.004)),
            fresh.update(&w.input(true, 0.004)),
            "{kind}"
        );
    }
}

#[test]
fn command_never_exceeds_steer_max() {
    for kind in KINDS {
        let cfg = LateralConfig {
            controller: kind,
            steer_max: 0.5,
            ..Default::default()
        };
        let mut c = LateralController::from_config(&cfg, DT_CTRL).unwrap();
        let mut w = World::new(25.0);
        for curvature in [0.2, -0.2] {
            for _ in 0..300 {
                let out = c.update(&w.input(true, curvature));
                assert!(out.steer.abs() <= 0.5, "{kind}: {}", out.steer);
                assert!(out.steer.is_finite());
                w.prior.steer = out.steer;
                w.prior.steering_angle_deg = out.steering_angle_deg;
                w.prior.lateral_debug = out.debug;
            }
        }
    }
}

#[test]
fn debug_state_matches_variant() {
    for kind in KINDS {
        let mut c = build(kind);
        let w = World::new(15.0);
        let out = c.update(&w.input(true, 0.001));
        assert_eq!(out.debug.kind(), Some(kind));
    }
}

// ─── Through the core ───────────────────────────────────────────────

#[test]
fn angle_rack_commands_angle_only() {
    let mut c = core_with(|cfg| {
        cfg.lateral.controller = LateralKind::Angle;
        cfg.vehicle.steer_control = SteerControlType::Angle;
    });
    engage(&mut c, 20.0);
    let mut inputs = cruise(20.0);
    inputs.lat_plan.curvature = 0.001;
    let mut last = 0.0;
    for _ in 0..200 {
        let r = c.tick(&inputs);
        assert_eq!(r.command.steer, 0.0);
        assert!(matches!(r.command.lateral_debug, LateralDebugState::Angle(_)));
        last = r.command.steering_angle_deg;
    }
    assert!(last < 0.0, "left curvature turns the wheel to negative angles");
}

#[test]
fn torque_rack_steers_into_left_curve() {
    let mut c = core_with(|cfg| cfg.lateral.controller = LateralKind::Torque);
    engage(&mut c, 20.0);
    let mut inputs = cruise(20.0);
    inputs.lat_plan.curvature = 0.002;
    let mut r = c.tick(&inputs);
    for _ in 0..100 {
        r = c.tick(&inputs);
    }
    assert!(r.lat_active);
    assert!(r.command.steer != 0.0);
    assert!(matches!(r.command.lateral_debug, LateralDebugState::Torque(_)));
}
