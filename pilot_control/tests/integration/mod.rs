//! Shared helpers for the integration scenarios.

mod engagement;
mod hot_reload;
mod lateral;
mod longitudinal;
mod replay;
mod saturation;

use pilot_common::controls::config::ControlsConfig;
use pilot_common::controls::events::EventName;
use pilot_common::controls::snapshot::TickInputs;
use pilot_control::config::ConfigSnapshot;
use pilot_control::cycle::{ControlsCore, TickReport};

/// Core built from the default configuration.
pub fn core() -> ControlsCore {
    ControlsCore::new(ConfigSnapshot::default()).unwrap()
}

/// Core built from a modified default configuration.
pub fn core_with(edit: impl FnOnce(&mut ControlsConfig)) -> ControlsCore {
    let mut cfg = ControlsConfig::default();
    edit(&mut cfg);
    ControlsCore::new(ConfigSnapshot::new(cfg, 0).unwrap()).unwrap()
}

/// Quiet tick at constant speed.
pub fn cruise(v_ego: f64) -> TickInputs {
    let mut inputs = TickInputs::default();
    inputs.vehicle.v_ego = v_ego;
    inputs
}

/// Tick at constant speed carrying the given events.
pub fn cruise_with(v_ego: f64, events: &[EventName]) -> TickInputs {
    let mut inputs = cruise(v_ego);
    for e in events {
        inputs.events.add(*e);
    }
    inputs
}

/// Engage from Disabled with a plain enable press.
pub fn engage(core: &mut ControlsCore, v_ego: f64) -> TickReport {
    core.tick(&cruise_with(v_ego, &[EventName::ButtonEnable]))
}
