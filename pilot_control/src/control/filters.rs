//! Signal conditioning helpers.
//!
//! First-order low-pass filter with a time constant that may change between
//! samples, plus the rate limit and center deadzone used by the lateral
//! controllers.

// ─── Low-Pass Filter (1st-order) ────────────────────────────────────

/// First-order low-pass filter.
///
/// ```text
/// alpha = dt / (rc + dt)
/// y[n]  = (1 - alpha) · y[n-1] + alpha · x[n]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FirstOrderFilter {
    x: f64,
    alpha: f64,
    dt: f64,
}

impl FirstOrderFilter {
    pub fn new(x0: f64, rc: f64, dt: f64) -> Self {
        let mut f = Self { x: x0, alpha: 1.0, dt };
        f.update_alpha(rc);
        f
    }

    /// Recompute the smoothing factor for a new time constant [s].
    /// `rc <= 0` passes the input straight through.
    #[inline]
    pub fn update_alpha(&mut self, rc: f64) {
        self.alpha = if rc > 0.0 && self.dt > 0.0 {
            self.dt / (rc + self.dt)
        } else {
            1.0
        };
    }

    /// Apply one sample.
    #[inline]
    pub fn update(&mut self, x: f64) -> f64 {
        self.x = (1.0 - self.alpha) * self.x + self.alpha * x;
        self.x
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Force the filter output.
    #[inline]
    pub fn reset(&mut self, x: f64) {
        self.x = x;
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Clamp `new` to `[last + down_step, last + up_step]`.
#[inline]
pub fn rate_limit(new: f64, last: f64, down_step: f64, up_step: f64) -> f64 {
    new.clamp(last + down_step, last + up_step)
}

/// Zero `error` inside the open interval `(-deadzone, deadzone)`.
#[inline]
pub fn apply_center_deadzone(error: f64, deadzone: f64) -> f64 {
    if error > -deadzone && error < deadzone {
        0.0
    } else {
        error
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
