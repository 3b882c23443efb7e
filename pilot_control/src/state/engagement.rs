//! Engagement state machine.
//!
//! Evaluated once per tick against the event set, in fixed precedence:
//!
//! 1. From any non-Disabled state, a user or immediate disable goes to
//!    Disabled with no grace period.
//! 2. Otherwise, per state:
//!
//! | From          | Condition                        | To            |
//! |---------------|----------------------------------|---------------|
//! | Enabled       | soft disable                     | SoftDisabling |
//! | Enabled       | override                         | Overriding    |
//! | SoftDisabling | soft disable cleared             | Enabled       |
//! | SoftDisabling | timer expired                    | Disabled      |
//! | PreEnabled    | pre-enable cleared               | Enabled       |
//! | Overriding    | soft disable                     | SoftDisabling |
//! | Overriding    | no override                      | Enabled       |
//! | Disabled      | enable, no-entry                 | Disabled      |
//! | Disabled      | enable, pre-enable               | PreEnabled    |
//! | Disabled      | enable, override                 | Overriding    |
//! | Disabled      | enable                           | Enabled       |
//!
//! The soft-disable timer is decremented (saturating) at the start of every
//! update and re-armed on each entry into SoftDisabling.

use pilot_common::controls::events::{EventSet, EventType};
use pilot_common::controls::state::EngagementState;
use tracing::{info, warn};

/// Outcome of one engagement update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementUpdate {
    pub previous: EngagementState,
    pub current: EngagementState,
}

impl EngagementUpdate {
    #[inline]
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }

    /// Actuation permission was withdrawn this tick.
    #[inline]
    pub fn deactivated(&self) -> bool {
        self.previous.is_active() && !self.current.is_active()
    }

    /// Entered Disabled from an engaged state this tick.
    #[inline]
    pub fn disengaged(&self) -> bool {
        self.previous != EngagementState::Disabled && self.current == EngagementState::Disabled
    }
}

#[derive(Debug, Clone)]
pub struct EngagementMachine {
    state: EngagementState,
    soft_disable_timer: u32,
    soft_disable_ticks: u32,
}

impl EngagementMachine {
    /// New machine in Disabled.
    pub const fn new(soft_disable_ticks: u32) -> Self {
        Self {
            state: EngagementState::Disabled,
            soft_disable_timer: 0,
            soft_disable_ticks,
        }
    }

    #[inline]
    pub const fn state(&self) -> EngagementState {
        self.state
    }

    /// Remaining soft-disable ticks.
    #[inline]
    pub const fn soft_disable_timer(&self) -> u32 {
        self.soft_disable_timer
    }

    #[inline]
    pub const fn soft_disable_ticks(&self) -> u32 {
        self.soft_disable_ticks
    }

    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    #[inline]
    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// New countdown length, effective on the next entry into SoftDisabling.
    pub fn set_soft_disable_ticks(&mut self, ticks: u32) {
        self.soft_disable_ticks = ticks;
    }

    /// Back to Disabled at session start.
    pub fn reset(&mut self) {
        self.state = EngagementState::Disabled;
        self.soft_disable_timer = 0;
    }

    /// Evaluate one tick.
    pub fn update(&mut self, events: &EventSet) -> EngagementUpdate {
        use EngagementState::*;

        let previous = self.state;
        self.soft_disable_timer = self.soft_disable_timer.saturating_sub(1);

        let ev = events.types();
        let soft = ev.contains(EventType::SOFT_DISABLE);
        let overriding = ev.intersects(EventType::OVERRIDE_MASK);

        let next = if previous != Disabled {
            if ev.intersects(EventType::DISABLE_MASK) {
                Disabled
            } else {
                match previous {
                    Enabled | Overriding if soft => {
                        self.soft_disable_timer = self.soft_disable_ticks;
                        SoftDisabling
                    }
                    Enabled if overriding => Overriding,
                    Enabled => Enabled,
                    SoftDisabling if !soft => Enabled,
                    SoftDisabling if self.soft_disable_timer > 0 => SoftDisabling,
                    SoftDisabling => Disabled,
                    PreEnabled if !ev.contains(EventType::PRE_ENABLE) => Enabled,
                    PreEnabled => PreEnabled,
                    Overriding if !overriding => Enabled,
                    Overriding => Overriding,
                    Disabled => Disabled,
                }
            }
        } else if ev.contains(EventType::ENABLE) {
            if ev.contains(EventType::NO_ENTRY) {
                Disabled
            } else if ev.contains(EventType::PRE_ENABLE) {
                PreEnabled
            } else if overriding {
                Overriding
            } else {
                Enabled
            }
        } else {
            Disabled
        };

        self.state = next;
        let update = EngagementUpdate {
            previous,
            current: next,
        };
        if update.changed() {
            if next == SoftDisabling {
                warn!(
                    from = ?previous,
                    ticks = self.soft_disable_timer,
                    "engagement: soft disable started"
                );
            } else {
                info!(from = ?previous, to = ?next, "engagement transition");
            }
        }
        update
    }
}

impl Default for EngagementMachine {
    fn default() -> Self {
        Self::new(pilot_common::consts::SOFT_DISABLE_TICKS)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
