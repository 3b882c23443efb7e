//! Composition of lateral controllers.
//!
//! Every member is updated every tick. Threshold methods hand the command to
//! one member, chosen by a selector (speed or absolute steering angle) that is
//! sampled on the first active tick and then re-sampled on a slow timer.
//! Interpolation methods blend member outputs continuously across the
//! breakpoints.

use heapless::Vec as HVec;
use pilot_common::consts::MAX_BLEND_MEMBERS;
use pilot_common::controls::command::{BlendDebug, LateralDebugState, LateralKind};
use pilot_common::controls::config::{BlendMethod, LateralConfig};
use pilot_common::controls::interp::interp;
use tracing::debug;

use super::{
    LateralControl, LateralController, LateralError, LateralInput, LateralOutput, SaturationCheck,
};

#[derive(Debug, Clone)]
pub struct BlendLateral {
    members: Vec<LateralController>,
    method: BlendMethod,
    breakpoints: Vec<f64>,
    reselect_ticks: u32,
    ticks_since_sample: u32,
    held_selector: Option<f64>,
    /// Index of the member in charge on the last active tick.
    selected: usize,
    steer_max: f64,
}

impl BlendLateral {
    pub fn new(cfg: &LateralConfig, dt: f64) -> Result<Self, LateralError> {
        let blend = &cfg.blend;
        if blend.members.len() < 2 {
            return Err(LateralError::TooFewBlendMembers(blend.members.len()));
        }
        let members = blend
            .members
            .iter()
            .take(MAX_BLEND_MEMBERS)
            .map(|kind| LateralController::member(*kind, cfg, dt))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            members,
            method: blend.method,
            breakpoints: blend.breakpoints.clone(),
            reselect_ticks: blend.reselect_ticks().max(1),
            ticks_since_sample: 0,
            held_selector: None,
            selected: 0,
            steer_max: cfg.steer_max,
        })
    }

    pub fn members(&self) -> &[LateralController] {
        &self.members
    }

    /// Selector value currently held by a threshold method.
    pub fn held_selector(&self) -> Option<f64> {
        self.held_selector
    }

    /// Member index in charge for a threshold method: the first band whose
    /// upper breakpoint lies above the selector.
    fn threshold_index(&self, selector: f64) -> usize {
        let idx = self.breakpoints.iter().take_while(|bp| selector >= **bp).count();
        idx.min(self.members.len() - 1)
    }

    /// Member with the largest interpolation weight.
    fn interp_index(&self, selector: f64) -> usize {
        let n = self.breakpoints.len().min(self.members.len());
        if n == 0 {
            return 0;
        }
        let bp = &self.breakpoints[..n];
        match bp.iter().position(|b| selector < *b) {
            Some(0) => 0,
            None => n - 1,
            Some(i) => {
                let t = (selector - bp[i - 1]) / (bp[i] - bp[i - 1]);
                if t < 0.5 { i - 1 } else { i }
            }
        }
    }
}

impl LateralControl for BlendLateral {
    fn kind(&self) -> LateralKind {
        LateralKind::Blend
    }

    fn saturation_check(&self) -> SaturationCheck {
        self.members
            .get(self.selected)
            .map_or(SaturationCheck::PathDeviation, |m| m.saturation_check())
    }

    fn update(&mut self, input: &LateralInput<'_>) -> LateralOutput {
        if !input.active {
            self.reset();
            return LateralOutput {
                steer: 0.0,
                steering_angle_deg: 0.0,
                debug: LateralDebugState::Blend(BlendDebug::default()),
            };
        }

        let mut outputs: HVec<LateralOutput, MAX_BLEND_MEMBERS> = HVec::new();
        for member in &mut self.members {
            let _ = outputs.push(member.update(input));
        }

        let vs = input.vehicle;
        let live_selector = if self.method.keyed_on_speed() {
            vs.v_ego
        } else {
            vs.steering_angle_deg.abs()
        };

        let (steer, angle, index, selector) = if self.method.is_interp() {
            let n = outputs.len().min(self.breakpoints.len());
            let bp = &self.breakpoints[..n];
            let mut steers: HVec<f64, MAX_BLEND_MEMBERS> = HVec::new();
            let mut angles: HVec<f64, MAX_BLEND_MEMBERS> = HVec::new();
            for out in outputs.iter().take(n) {
                let _ = steers.push(out.steer);
                let _ = angles.push(out.steering_angle_deg);
            }
            (
                interp(live_selector, bp, &steers),
                interp(live_selector, bp, &angles),
                self.interp_index(live_selector),
                live_selector,
            )
        } else {
            self.ticks_since_sample += 1;
            let held = match self.held_selector {
                Some(held) if self.ticks_since_sample < self.reselect_ticks => held,
                _ => {
                    self.ticks_since_sample = 0;
                    self.held_selector = Some(live_selector);
                    live_selector
                }
            };
            let index = self.threshold_index(held);
            let out = &outputs[index];
            (out.steer, out.steering_angle_deg, index, held)
        };

        let steer = steer.clamp(-self.steer_max, self.steer_max);
        self.selected = index;
        let selected = self.members[index].kind();
        let saturated = outputs[index].saturated();
        let (desired_lateral_accel, actual_lateral_accel) =
            outputs[index].debug.lateral_accel().unwrap_or_default();
        debug!(member = %selected, selector, steer, "blend output");

        LateralOutput {
            steer,
            steering_angle_deg: angle,
            debug: LateralDebugState::Blend(BlendDebug {
                active: true,
                selected,
                selector,
                output: steer,
                saturated,
                desired_lateral_accel,
                actual_lateral_accel,
            }),
        }
    }

    fn reset(&mut self) {
        for member in &mut self.members {
            member.reset();
        }
        self.ticks_since_sample = 0;
        self.held_selector = None;
        self.selected = 0;
    }

    fn steer_max(&self) -> f64 {
        self.steer_max
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lateral::tests::Fixture;
    use pilot_common::consts::DT_CTRL;
    use pilot_common::controls::config::BlendConfig;

    fn config(method: BlendMethod, members: &[LateralKind], breakpoints: &[f64]) -> LateralConfig {
        LateralConfig {
            controller: LateralKind::Blend,
            blend: BlendConfig {
                method,
                members: members.to_vec(),
                breakpoints: breakpoints.to_vec(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn selected(out: &LateralOutput) -> LateralKind {
        match out.debug {
            LateralDebugState::Blend(d) => d.selected,
            other => panic!("unexpected debug {other:?}"),
        }
    }

    #[test]
    fn speed_threshold_selects_band() {
        let cfg = LateralConfig {
            controller: LateralKind::Blend,
            ..Default::default()
        };
        for (v, kind) in [
            (5.0, LateralKind::Pid),
            (12.0, LateralKind::Lqr),
            (25.0, LateralKind::Torque),
        ] {
            let f = Fixture::new(v);
            let mut c = BlendLateral::new(&cfg, DT_CTRL).unwrap();
            let out = c.update(&f.input(true, 0.001));
            assert_eq!(selected(&out), kind, "v = {v}");
        }
    }

    #[test]
    fn threshold_selection_holds_until_reselect() {
        let cfg = LateralConfig {
            controller: LateralKind::Blend,
            ..Default::default()
        };
        let mut c = BlendLateral::new(&cfg, DT_CTRL).unwrap();
        let mut f = Fixture::new(5.0);
        c.update(&f.input(true, 0.0));
        assert_eq!(c.held_selector(), Some(5.0));

        f.vehicle.v_ego = 25.0;
        for _ in 1..cfg.blend.speed_reselect_ticks {
            let out = c.update(&f.input(true, 0.0));
            assert_eq!(selected(&out), LateralKind::Pid);
        }
        let out = c.update(&f.input(true, 0.0));
        assert_eq!(selected(&out), LateralKind::Torque);
        assert_eq!(c.held_selector(), Some(25.0));
    }

    #[test]
    fn output_matches_selected_member() {
        let cfg = LateralConfig {
            controller: LateralKind::Blend,
            ..Default::default()
        };
        let f = Fixture::new(5.0);
        let mut blend = BlendLateral::new(&cfg, DT_CTRL).unwrap();
        let mut alone = LateralController::member(LateralKind::Pid, &cfg, DT_CTRL).unwrap();
        for _ in 0..20 {
            let b = blend.update(&f.input(true, 0.01));
            let a = alone.update(&f.input(true, 0.01));
            assert_eq!(b.steer, a.steer);
            assert_eq!(b.steering_angle_deg, a.steering_angle_deg);
        }
    }

    #[test]
    fn speed_interp_blends_between_members() {
        let cfg = config(
            BlendMethod::SpeedInterp,
            &[LateralKind::Pid, LateralKind::Torque],
            &[10.0, 20.0],
        );
        let f = Fixture::new(15.0);
        let mut blend = BlendLateral::new(&cfg, DT_CTRL).unwrap();
        let mut pid = LateralController::member(LateralKind::Pid, &cfg, DT_CTRL).unwrap();
        let mut torque = LateralController::member(LateralKind::Torque, &cfg, DT_CTRL).unwrap();

        let b = blend.update(&f.input(true, 0.002));
        let p = pid.update(&f.input(true, 0.002));
        let t = torque.update(&f.input(true, 0.002));
        assert!((b.steer - 0.5 * (p.steer + t.steer)).abs() < 1e-12);
        assert_eq!(selected(&b), LateralKind::Torque);
    }

    #[test]
    fn angle_interp_picks_largest_weight() {
        let cfg = config(
            BlendMethod::AngleInterp,
            &[LateralKind::Pid, LateralKind::Indi, LateralKind::Lqr],
            &[0.0, 10.0, 20.0],
        );
        let c = BlendLateral::new(&cfg, DT_CTRL).unwrap();
        assert_eq!(c.interp_index(2.0), 0);
        assert_eq!(c.interp_index(6.0), 1);
        assert_eq!(c.interp_index(30.0), 2);
    }

    #[test]
    fn saturation_check_follows_selected_member() {
        let cfg = LateralConfig {
            controller: LateralKind::Blend,
            ..Default::default()
        };
        let mut c = BlendLateral::new(&cfg, DT_CTRL).unwrap();
        let out = c.update(&Fixture::new(25.0).input(true, 0.02));
        assert_eq!(selected(&out), LateralKind::Torque);
        assert_eq!(c.saturation_check(), SaturationCheck::LateralAccel);
        let LateralDebugState::Blend(d) = out.debug else {
            panic!("unexpected debug {:?}", out.debug);
        };
        assert!((d.desired_lateral_accel - 0.02 * 25.0 * 25.0).abs() < 1e-9);
        assert_eq!(
            out.debug.lateral_accel(),
            Some((d.desired_lateral_accel, d.actual_lateral_accel))
        );

        let mut c = BlendLateral::new(&cfg, DT_CTRL).unwrap();
        c.update(&Fixture::new(5.0).input(true, 0.02));
        assert_eq!(c.saturation_check(), SaturationCheck::PathDeviation);
    }

    #[test]
    fn rejects_nested_blend() {
        let cfg = config(
            BlendMethod::SpeedThreshold,
            &[LateralKind::Pid, LateralKind::Blend],
            &[10.0],
        );
        assert!(BlendLateral::new(&cfg, DT_CTRL).is_err());
    }

    #[test]
    fn reset_resets_every_member() {
        let cfg = LateralConfig {
            controller: LateralKind::Blend,
            ..Default::default()
        };
        let f = Fixture::new(12.0);
        let mut c = BlendLateral::new(&cfg, DT_CTRL).unwrap();
        for _ in 0..50 {
            c.update(&f.input(true, 0.005));
        }
        c.reset();
        assert_eq!(c.held_selector(), None);
        let fresh = BlendLateral::new(&cfg, DT_CTRL)
            .unwrap()
            .update(&f.input(true, 0.005));
        assert_eq!(c.update(&f.input(true, 0.005)), fresh);
    }
}
