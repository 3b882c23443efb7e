//! Engagement scenarios through the full tick.

use pilot_common::controls::events::EventName;
use pilot_common::controls::state::EngagementState;
use pilot_control::cycle::ControlsCore;

use super::{core, cruise, cruise_with, engage};

// ─── Helpers ────────────────────────────────────────────────────────

const V: f64 = 20.0;

/// Core sitting in `target` after at most two ticks.
fn drive_to(target: EngagementState) -> ControlsCore {
    use EngagementState::*;
    let mut c = core();
    match target {
        Disabled => {}
        PreEnabled => {
            c.tick(&cruise_with(
                V,
                &[EventName::ButtonEnable, EventName::PreEnableStandstill],
            ));
        }
        Enabled => {
            engage(&mut c, V);
        }
        SoftDisabling => {
            engage(&mut c, V);
            c.tick(&cruise_with(V, &[EventName::SteerTempUnavailable]));
        }
        Overriding => {
            engage(&mut c, V);
            c.tick(&cruise_with(V, &[EventName::SteerOverride]));
        }
    }
    assert_eq!(c.engagement_state(), target);
    c
}

const ALL_STATES: [EngagementState; 5] = [
    EngagementState::Disabled,
    EngagementState::PreEnabled,
    EngagementState::Enabled,
    EngagementState::SoftDisabling,
    EngagementState::Overriding,
];

// ─── Scenarios ──────────────────────────────────────────────────────

#[test]
fn enable_from_disabled_goes_straight_to_enabled() {
    let mut c = core();
    let r = engage(&mut c, V);
    assert_eq!(r.engagement, EngagementState::Enabled);
    assert!(r.enabled && r.active);
}

#[test]
fn soft_disable_lasts_exactly_the_window() {
    let mut c = drive_to(EngagementState::Enabled);
    let soft = cruise_with(V, &[EventName::SteerTempUnavailable]);

    for tick in 1..=300 {
        let r = c.tick(&soft);
        assert_eq!(r.engagement, EngagementState::SoftDisabling, "tick {tick}");
        assert!(r.active);
    }
    let r = c.tick(&soft);
    assert_eq!(r.engagement, EngagementState::Disabled);
    assert!(!r.active);
    assert_eq!(r.command.steer, 0.0);
    assert_eq!(r.command.accel, 0.0);
}

#[test]
fn soft_disable_recovers_when_condition_clears() {
    let mut c = drive_to(EngagementState::SoftDisabling);
    for _ in 0..100 {
        c.tick(&cruise_with(V, &[EventName::SteerTempUnavailable]));
    }
    let r = c.tick(&cruise(V));
    assert_eq!(r.engagement, EngagementState::Enabled);

    // A new soft disable re-arms the full window.
    let soft = cruise_with(V, &[EventName::SteerTempUnavailable]);
    for _ in 0..300 {
        assert_eq!(c.tick(&soft).engagement, EngagementState::SoftDisabling);
    }
    assert_eq!(c.tick(&soft).engagement, EngagementState::Disabled);
}

#[test]
fn user_and_immediate_disable_win_from_every_state() {
    for disable in [EventName::ButtonCancel, EventName::PcmDisable, EventName::CruiseDisabled] {
        for state in ALL_STATES {
            let mut c = drive_to(state);
            // Every other category present at once; disable still wins.
            let r = c.tick(&cruise_with(
                V,
                &[
                    disable,
                    EventName::ButtonEnable,
                    EventName::SteerTempUnavailable,
                    EventName::SteerOverride,
                ],
            ));
            assert_eq!(r.engagement, EngagementState::Disabled, "{disable:?} from {state:?}");
            assert!(!r.enabled && !r.active);
        }
    }
}

#[test]
fn no_entry_blocks_engagement() {
    let mut c = core();
    let r = c.tick(&cruise_with(
        V,
        &[EventName::ButtonEnable, EventName::BelowEngageSpeed],
    ));
    assert_eq!(r.engagement, EngagementState::Disabled);
}

#[test]
fn pre_enable_holds_then_releases() {
    let mut c = drive_to(EngagementState::PreEnabled);
    let r = c.tick(&cruise_with(V, &[EventName::PreEnableStandstill]));
    assert_eq!(r.engagement, EngagementState::PreEnabled);
    assert!(r.enabled && !r.active);
    assert_eq!(r.command.steer, 0.0);

    let r = c.tick(&cruise(V));
    assert_eq!(r.engagement, EngagementState::Enabled);
}

#[test]
fn override_returns_to_enabled() {
    let mut c = drive_to(EngagementState::Overriding);
    let r = c.tick(&cruise_with(V, &[EventName::SteerOverride]));
    assert_eq!(r.engagement, EngagementState::Overriding);
    assert!(r.active);
    assert_eq!(c.tick(&cruise(V)).engagement, EngagementState::Enabled);
}

#[test]
fn override_with_soft_disable_starts_countdown() {
    let mut c = drive_to(EngagementState::Overriding);
    let r = c.tick(&cruise_with(
        V,
        &[EventName::SteerOverride, EventName::SteerTempUnavailable],
    ));
    assert_eq!(r.engagement, EngagementState::SoftDisabling);
    assert_eq!(c.engagement().soft_disable_timer(), 300);
}

#[test]
fn enable_with_override_enters_overriding() {
    let mut c = core();
    let r = c.tick(&cruise_with(
        V,
        &[EventName::ButtonEnable, EventName::GasPressedOverride],
    ));
    assert_eq!(r.engagement, EngagementState::Overriding);
    assert!(!r.long_active);
}
