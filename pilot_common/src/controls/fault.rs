//! Per-tick local fault flags.
//!
//! Arithmetic faults never propagate as `Err`; the tick clamps or replaces
//! the offending value and records a flag here for diagnostics.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Local, recoverable faults observed during one tick.
    ///
    /// CRITICAL flags indicate an input the core had to discard entirely.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ControlFault: u16 {
        /// An actuator value was NaN or infinite and replaced with 0.
        const NON_FINITE_OUTPUT   = 0x0001;
        /// A vehicle-state input was NaN or infinite. **CRITICAL**.
        const NON_FINITE_INPUT    = 0x0002;
        /// Event set overflowed; some events were dropped. **CRITICAL**.
        const EVENT_OVERFLOW      = 0x0004;
        /// Live parameters were out of range and floored.
        const LIVE_PARAMS_CLAMPED = 0x0008;
        /// Desired curvature was rate limited this tick.
        const CURVATURE_LIMITED   = 0x0010;
        /// Transport reported a limited steering command.
        const STEER_LIMITED       = 0x0020;
    }
}

impl ControlFault {
    pub const CRITICAL_MASK: Self = Self::from_bits_truncate(
        Self::NON_FINITE_INPUT.bits() | Self::EVENT_OVERFLOW.bits(),
    );

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }
}

impl Default for ControlFault {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_mask() {
        assert!(ControlFault::NON_FINITE_INPUT.has_critical());
        assert!(ControlFault::EVENT_OVERFLOW.has_critical());
        assert!(!ControlFault::NON_FINITE_OUTPUT.has_critical());
        assert!(!ControlFault::default().has_critical());
    }
}
