//! Steady-state dynamic bicycle model.
//!
//! Maps between path curvature and steering wheel angle at a given speed,
//! including understeer (slip factor) and road-roll compensation. Tire
//! stiffness is scaled from a reference compact sedan by mass and axle load
//! distribution.

use pilot_common::consts::ACCELERATION_DUE_TO_GRAVITY;
use pilot_common::controls::config::VehicleConfig;

// ─── Reference Vehicle ──────────────────────────────────────────────

/// Reference vehicle the tire stiffness values were identified on.
mod reference {
    pub const MASS: f64 = 1326.0 + 136.0;
    pub const WHEELBASE: f64 = 2.70;
    pub const CENTER_TO_FRONT: f64 = WHEELBASE * 0.4;
    pub const CENTER_TO_REAR: f64 = WHEELBASE - CENTER_TO_FRONT;
    pub const TIRE_STIFFNESS_FRONT: f64 = 192_150.0;
    pub const TIRE_STIFFNESS_REAR: f64 = 202_500.0;
}

/// Lower bound applied to live steer ratio and stiffness factor.
pub const MIN_LIVE_PARAM: f64 = 0.1;

/// Front and rear cornering stiffness [N/rad] scaled to this vehicle.
pub fn scale_tire_stiffness(
    mass: f64,
    wheelbase: f64,
    center_to_front: f64,
    tire_stiffness_factor: f64,
) -> (f64, f64) {
    let center_to_rear = wheelbase - center_to_front;
    let front = reference::TIRE_STIFFNESS_FRONT * tire_stiffness_factor * mass / reference::MASS
        * (center_to_rear / wheelbase)
        / (reference::CENTER_TO_REAR / reference::WHEELBASE);
    let rear = reference::TIRE_STIFFNESS_REAR * tire_stiffness_factor * mass / reference::MASS
        * (center_to_front / wheelbase)
        / (reference::CENTER_TO_FRONT / reference::WHEELBASE);
    (front, rear)
}

// ─── Model ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleModel {
    mass: f64,
    wheelbase: f64,
    center_to_front: f64,
    center_to_rear: f64,
    stiffness_front_base: f64,
    stiffness_rear_base: f64,
    stiffness_front: f64,
    stiffness_rear: f64,
    steer_ratio: f64,
    slip_factor: f64,
}

impl VehicleModel {
    pub fn new(cfg: &VehicleConfig) -> Self {
        let center_to_front = cfg.center_to_front();
        let (front, rear) = scale_tire_stiffness(
            cfg.mass,
            cfg.wheelbase,
            center_to_front,
            cfg.tire_stiffness_factor,
        );
        let mut vm = Self {
            mass: cfg.mass,
            wheelbase: cfg.wheelbase,
            center_to_front,
            center_to_rear: cfg.wheelbase - center_to_front,
            stiffness_front_base: front,
            stiffness_rear_base: rear,
            stiffness_front: front,
            stiffness_rear: rear,
            steer_ratio: cfg.steer_ratio,
            slip_factor: 0.0,
        };
        vm.update_params(1.0, cfg.steer_ratio);
        vm
    }

    /// Apply live stiffness factor and steer ratio. Both are floored at
    /// [`MIN_LIVE_PARAM`]; returns true when either was floored.
    pub fn update_params(&mut self, stiffness_factor: f64, steer_ratio: f64) -> bool {
        let sf = stiffness_factor.max(MIN_LIVE_PARAM);
        let sr = steer_ratio.max(MIN_LIVE_PARAM);
        self.stiffness_front = sf * self.stiffness_front_base;
        self.stiffness_rear = sf * self.stiffness_rear_base;
        self.steer_ratio = sr;
        self.slip_factor = self.calc_slip_factor();
        sf != stiffness_factor || sr != steer_ratio
    }

    #[inline]
    pub fn steer_ratio(&self) -> f64 {
        self.steer_ratio
    }

    #[inline]
    pub fn wheelbase(&self) -> f64 {
        self.wheelbase
    }

    #[inline]
    pub fn slip_factor(&self) -> f64 {
        self.slip_factor
    }

    fn calc_slip_factor(&self) -> f64 {
        self.mass
            * (self.stiffness_front * self.center_to_front
                - self.stiffness_rear * self.center_to_rear)
            / (self.wheelbase * self.wheelbase * self.stiffness_front * self.stiffness_rear)
    }

    /// Steady-state curvature per unit road wheel angle at speed `u` [1/m].
    #[inline]
    pub fn curvature_factor(&self, u: f64) -> f64 {
        1.0 / (1.0 - self.slip_factor * u * u) / self.wheelbase
    }

    /// Curvature induced by road roll at speed `u`.
    #[inline]
    pub fn roll_compensation(&self, roll: f64, u: f64) -> f64 {
        if self.slip_factor.abs() < 1e-6 {
            0.0
        } else {
            ACCELERATION_DUE_TO_GRAVITY * roll / (1.0 / self.slip_factor - u * u)
        }
    }

    /// Steering wheel angle [rad] that yields curvature `curv` [1/m].
    #[inline]
    pub fn get_steer_from_curvature(&self, curv: f64, u: f64, roll: f64) -> f64 {
        (curv - self.roll_compensation(roll, u)) * self.steer_ratio / self.curvature_factor(u)
    }

    /// Path curvature [1/m] for steering wheel angle `sa` [rad].
    #[inline]
    pub fn calc_curvature(&self, sa: f64, u: f64, roll: f64) -> f64 {
        self.curvature_factor(u) * sa / self.steer_ratio + self.roll_compensation(roll, u)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> VehicleModel {
        VehicleModel::new(&VehicleConfig::default())
    }

    #[test]
    fn reference_vehicle_keeps_reference_stiffness() {
        let (f, r) = scale_tire_stiffness(
            reference::MASS,
            reference::WHEELBASE,
            reference::CENTER_TO_FRONT,
            1.0,
        );
        assert!((f - reference::TIRE_STIFFNESS_FRONT).abs() < 1e-6);
        assert!((r - reference::TIRE_STIFFNESS_REAR).abs() < 1e-6);
    }

    #[test]
    fn standstill_curvature_factor_is_geometric() {
        let vm = model();
        assert!((vm.curvature_factor(0.0) - 1.0 / vm.wheelbase()).abs() < 1e-12);
    }

    #[test]
    fn curvature_and_steer_are_inverse() {
        let vm = model();
        for &(k, u, roll) in &[(0.01, 10.0, 0.0), (-0.002, 30.0, 0.05), (0.05, 3.0, -0.02)] {
            let sa = vm.get_steer_from_curvature(k, u, roll);
            assert!((vm.calc_curvature(sa, u, roll) - k).abs() < 1e-12);
        }
    }

    #[test]
    fn understeer_needs_more_angle_at_speed() {
        let vm = model();
        // Default geometry puts the CG forward of center: understeer.
        assert!(vm.slip_factor() < 0.0);
        let slow = vm.get_steer_from_curvature(0.01, 5.0, 0.0);
        let fast = vm.get_steer_from_curvature(0.01, 30.0, 0.0);
        assert!(fast > slow);
    }

    #[test]
    fn flat_road_has_no_roll_term() {
        assert_eq!(model().roll_compensation(0.0, 20.0), 0.0);
    }

    #[test]
    fn live_params_are_floored() {
        let mut vm = model();
        assert!(!vm.update_params(1.0, 14.0));
        assert_eq!(vm.steer_ratio(), 14.0);
        assert!(vm.update_params(0.0, -3.0));
        assert_eq!(vm.steer_ratio(), MIN_LIVE_PARAM);
    }
}
