//! Longitudinal control state transitions.
//!
//! ```text
//!            should_stop
//!   Off/PID ───────────► Stopping ──(released, starting_state)──► Starting
//!      ▲                    │  ▲                                    │
//!      │   released, no     │  └──────────── should_stop ───────────┤
//!      │   starting_state   │                                       │
//!      └────────────────────┘◄──────── v_ego > v_ego_starting ──────┘
//! ```
//!
//! "Released" means no stop request, no cruise standstill and no brake.
//! Inactive always maps to Off.

use pilot_common::controls::config::LongitudinalConfig;
use pilot_common::controls::state::LongControlState;

/// Inputs of one longitudinal transition evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongTransitionInput {
    pub active: bool,
    pub v_ego: f64,
    pub should_stop: bool,
    pub brake_pressed: bool,
    pub cruise_standstill: bool,
}

/// Compute the next longitudinal state.
pub fn long_control_state_trans(
    cfg: &LongitudinalConfig,
    state: LongControlState,
    input: &LongTransitionInput,
) -> LongControlState {
    use LongControlState::*;

    if !input.active {
        return Off;
    }

    let stopping = input.should_stop;
    let starting = !input.should_stop && !input.cruise_standstill && !input.brake_pressed;
    let started = input.v_ego > cfg.v_ego_starting;

    match state {
        Off | Pid => {
            if stopping {
                Stopping
            } else {
                Pid
            }
        }
        Stopping if starting && cfg.starting_state => Starting,
        Stopping if starting => Pid,
        Stopping => Stopping,
        Starting if stopping => Stopping,
        Starting if started => Pid,
        Starting => Starting,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
