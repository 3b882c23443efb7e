//! Piecewise-linear breakpoint interpolation.
//!
//! Outside the breakpoint range the end values are held. Breakpoints must be
//! ascending; [`BreakpointTable::validate`] enforces it for configured tables.

use serde::{Deserialize, Serialize};

/// Interpolate `x` over ascending breakpoints `bp` with values `v`.
///
/// Returns 0 for empty tables. Extra entries in the longer slice are ignored.
pub fn interp(x: f64, bp: &[f64], v: &[f64]) -> f64 {
    let n = bp.len().min(v.len());
    if n == 0 {
        return 0.0;
    }
    if x <= bp[0] {
        return v[0];
    }
    if x >= bp[n - 1] {
        return v[n - 1];
    }
    for i in 1..n {
        if x < bp[i] {
            let span = bp[i] - bp[i - 1];
            if span <= 0.0 {
                return v[i];
            }
            let t = (x - bp[i - 1]) / span;
            return v[i - 1] + t * (v[i] - v[i - 1]);
        }
    }
    v[n - 1]
}

/// Breakpoint/value table, typically keyed on speed [m/s].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointTable {
    pub bp: Vec<f64>,
    pub v: Vec<f64>,
}

impl BreakpointTable {
    /// Table with a single constant value.
    pub fn constant(value: f64) -> Self {
        Self {
            bp: vec![0.0],
            v: vec![value],
        }
    }

    pub fn new(bp: &[f64], v: &[f64]) -> Self {
        Self {
            bp: bp.to_vec(),
            v: v.to_vec(),
        }
    }

    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        interp(x, &self.bp, &self.v)
    }

    /// Check shape and ordering. `name` prefixes the error message.
    pub fn validate(&self, name: &str) -> Result<(), String> {
        if self.bp.is_empty() {
            return Err(format!("{name}: breakpoint table is empty"));
        }
        if self.bp.len() != self.v.len() {
            return Err(format!(
                "{name}: {} breakpoints but {} values",
                self.bp.len(),
                self.v.len()
            ));
        }
        if self.bp.iter().chain(self.v.iter()).any(|x| !x.is_finite()) {
            return Err(format!("{name}: non-finite entry"));
        }
        if self.bp.windows(2).any(|w| w[1] <= w[0]) {
            return Err(format!("{name}: breakpoints must be strictly ascending"));
        }
        Ok(())
    }
}
