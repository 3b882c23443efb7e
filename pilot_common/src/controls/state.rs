//! Engagement and longitudinal control state enums.

use serde::{Deserialize, Serialize};

/// Top-level engagement state. Exactly one value at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum EngagementState {
    #[default]
    Disabled = 0,
    PreEnabled = 1,
    Enabled = 2,
    SoftDisabling = 3,
    Overriding = 4,
}

impl EngagementState {
    /// Engaged in any form, including PreEnabled.
    #[inline]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Actuation permitted.
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::Enabled | Self::SoftDisabling | Self::Overriding
        )
    }
}

/// Longitudinal control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LongControlState {
    #[default]
    Off = 0,
    Pid = 1,
    Stopping = 2,
    Starting = 3,
}

impl LongControlState {
    /// Short tag for log lines.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Pid => "PID",
            Self::Stopping => "STP",
            Self::Starting => "STR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_and_active_sets() {
        use EngagementState::*;
        assert!(!Disabled.is_enabled());
        assert!(!Disabled.is_active());
        assert!(PreEnabled.is_enabled());
        assert!(!PreEnabled.is_active());
        for s in [Enabled, SoftDisabling, Overriding] {
            assert!(s.is_enabled());
            assert!(s.is_active());
        }
    }

    #[test]
    fn defaults_are_off_and_disabled() {
        assert_eq!(EngagementState::default(), EngagementState::Disabled);
        assert_eq!(LongControlState::default(), LongControlState::Off);
    }
}
