//! Speed-scheduled PID controller with conditional integration.
//!
//! Proportional and integral gains are breakpoint tables keyed on vehicle
//! speed. The integrator only accepts a step that does not push an already
//! limited output further into its limit, unwinds toward zero while the
//! driver overrides, and can be frozen. The derivative acts on a first-order
//! filtered error derivative. Output is always clamped to the limits.

use pilot_common::controls::interp::BreakpointTable;

/// Integrator unwind rate while overridden, per second.
const I_UNWIND_RATE: f64 = 0.3;

/// Internal state of the PID controller.
///
/// Zeroed by [`PidState::reset`] whenever the owning axis deactivates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    /// Last proportional term.
    pub p: f64,
    /// Integral accumulator.
    pub i: f64,
    /// Last derivative term.
    pub d: f64,
    /// Last feedforward term.
    pub f: f64,
    /// Last clamped output.
    pub control: f64,
    prev_error: f64,
    derivative_filtered: f64,
    has_prev_error: bool,
}

impl PidState {
    /// Reset all internal state to zero.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// PID gains.
#[derive(Debug, Clone, PartialEq)]
pub struct PidGains {
    /// Proportional gain keyed on speed.
    pub kp: BreakpointTable,
    /// Integral gain keyed on speed.
    pub ki: BreakpointTable,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
    /// Feedforward gain.
    pub kf: f64,
    /// Derivative filter time constant [s] (0 = unfiltered).
    pub derivative_rc: f64,
}

impl PidGains {
    /// Constant P/I gains with no derivative.
    pub fn constant(kp: f64, ki: f64, kf: f64) -> Self {
        Self {
            kp: BreakpointTable::constant(kp),
            ki: BreakpointTable::constant(ki),
            kd: 0.0,
            kf,
            derivative_rc: 0.0,
        }
    }
}

/// PID controller owning its gains, limits and state.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    state: PidState,
    pos_limit: f64,
    neg_limit: f64,
    dt: f64,
}

impl PidController {
    pub fn new(gains: PidGains, neg_limit: f64, pos_limit: f64, dt: f64) -> Self {
        Self {
            gains,
            state: PidState::default(),
            pos_limit,
            neg_limit,
            dt,
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.state.reset();
    }

    #[inline]
    pub fn state(&self) -> &PidState {
        &self.state
    }

    #[inline]
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// Replace the gains. The integrator is kept.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Update output limits for this tick.
    #[inline]
    pub fn set_limits(&mut self, neg_limit: f64, pos_limit: f64) {
        self.neg_limit = neg_limit;
        self.pos_limit = pos_limit;
    }

    /// Compute one PID step.
    ///
    /// # Arguments
    /// - `error`: setpoint − measurement.
    /// - `speed`: vehicle speed [m/s] for gain scheduling.
    /// - `feedforward`: feedforward input, scaled by `kf`.
    /// - `override_active`: driver override; the integrator unwinds.
    /// - `freeze_integrator`: hold the integrator at its current value.
    pub fn update(
        &mut self,
        error: f64,
        speed: f64,
        feedforward: f64,
        override_active: bool,
        freeze_integrator: bool,
    ) -> f64 {
        let kp = self.gains.kp.eval(speed);
        let ki = self.gains.ki.eval(speed);
        let s = &mut self.state;

        s.p = error * kp;
        s.f = feedforward * self.gains.kf;

        s.d = if self.gains.kd != 0.0 && self.dt > 0.0 {
            let raw = if s.has_prev_error {
                (error - s.prev_error) / self.dt
            } else {
                0.0
            };
            let alpha = self.dt / (self.gains.derivative_rc + self.dt);
            s.derivative_filtered += alpha * (raw - s.derivative_filtered);
            self.gains.kd * s.derivative_filtered
        } else {
            s.derivative_filtered = 0.0;
            0.0
        };
        s.prev_error = error;
        s.has_prev_error = true;

        if override_active {
            let step = I_UNWIND_RATE * self.dt;
            s.i = if s.i.abs() <= step {
                0.0
            } else {
                s.i - step * s.i.signum()
            };
        } else if !freeze_integrator {
            let i = s.i + error * ki * self.dt;
            let control = s.p + i + s.d + s.f;
            let accept = (error >= 0.0 && (control <= self.pos_limit || i < 0.0))
                || (error <= 0.0 && (control >= self.neg_limit || i > 0.0));
            if accept {
                s.i = i;
            }
        }

        s.control = (s.p + s.i + s.d + s.f).clamp(self.neg_limit, self.pos_limit);
        s.control
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
