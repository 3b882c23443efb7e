//! Configuration hot reload: stage while engaged, apply once disabled.

use std::fs;

use pilot_common::controls::command::LateralKind;
use pilot_common::controls::events::EventName;
use pilot_common::controls::snapshot::TickInputs;
use pilot_control::config::{ConfigRefresher, ReloadResult, load_config, load_config_from_str};
use pilot_control::cycle::{ControlsCore, CycleRunner};
use pilot_control::ingest::IterSource;
use pilot_control::publish::MemorySink;
use tempfile::NamedTempFile;

use super::{cruise, cruise_with, engage};

const PID_DOC: &str = "[lateral]\ncontroller = \"pid\"\n";
const TORQUE_DOC: &str = "[lateral]\ncontroller = \"torque\"\n";

fn config_file(content: &str) -> NamedTempFile {
    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    fs::write(file.path(), content).unwrap();
    file
}

/// Engage on tick 1, cancel on `cancel_at`, cruise until `len`.
fn drive(cancel_at: usize, len: usize) -> impl Iterator<Item = TickInputs> {
    (1..=len).map(move |tick| match tick {
        1 => cruise_with(15.0, &[EventName::ButtonEnable]),
        t if t == cancel_at => cruise_with(15.0, &[EventName::ButtonCancel]),
        _ => cruise(15.0),
    })
}

#[test]
fn staged_config_waits_for_disabled() {
    let mut c = ControlsCore::new(load_config_from_str(PID_DOC).unwrap()).unwrap();
    engage(&mut c, 15.0);

    let staged = load_config_from_str(TORQUE_DOC).unwrap();
    c.stage_config(staged).unwrap();
    assert!(c.has_staged_config());
    assert_eq!(c.latest_config().config().lateral.controller, LateralKind::Torque);

    for _ in 0..50 {
        let r = c.tick(&cruise(15.0));
        assert_eq!(r.command.lateral_debug.kind(), Some(LateralKind::Pid));
    }
    assert_eq!(c.config().config().lateral.controller, LateralKind::Pid);

    // The cancel tick itself still runs on the old tables.
    c.tick(&cruise_with(15.0, &[EventName::ButtonCancel]));
    assert!(c.has_staged_config());

    let r = c.tick(&cruise(15.0));
    assert!(!c.has_staged_config());
    assert_eq!(c.config().config().lateral.controller, LateralKind::Torque);
    assert_eq!(r.command.lateral_debug.kind(), Some(LateralKind::Torque));
}

#[test]
fn runner_picks_up_file_change_after_disengage() {
    let file = config_file(PID_DOC);
    let snapshot = load_config(file.path()).unwrap();
    fs::write(file.path(), TORQUE_DOC).unwrap();

    let core = ControlsCore::new(snapshot).unwrap();
    let mut runner = CycleRunner::new(core, IterSource(drive(40, 60)), MemorySink::new())
        .with_refresher(ConfigRefresher::new(file.path(), 5));
    runner.run().unwrap();

    let kinds: Vec<_> = runner
        .sink()
        .published
        .iter()
        .map(|p| p.command.lateral_debug.kind())
        .collect();
    assert!(kinds[..40].iter().all(|k| *k == Some(LateralKind::Pid)));
    assert!(kinds[40..].iter().all(|k| *k == Some(LateralKind::Torque)));

    let report = runner.last_report().unwrap();
    assert_eq!(report.config_generation, 1);
}

#[test]
fn refresher_compares_against_staged_snapshot() {
    let file = config_file(TORQUE_DOC);
    let mut c = ControlsCore::new(load_config_from_str(PID_DOC).unwrap()).unwrap();
    engage(&mut c, 15.0);

    let refresher = ConfigRefresher::new(file.path(), 1);
    let ReloadResult::Staged(snapshot) = refresher.reload_now(c.latest_config()) else {
        panic!("expected a staged reload");
    };
    assert_eq!(snapshot.generation(), 1);
    c.stage_config(snapshot).unwrap();

    assert_eq!(refresher.reload_now(c.latest_config()), ReloadResult::Unchanged);
}

#[test]
fn invalid_document_keeps_active_config() {
    let file = config_file(PID_DOC);
    let snapshot = load_config(file.path()).unwrap();
    fs::write(file.path(), "[lateral]\nsteer_max = 5.0\n").unwrap();

    let core = ControlsCore::new(snapshot).unwrap();
    let mut runner = CycleRunner::new(core, IterSource(drive(10, 30)), MemorySink::new())
        .with_refresher(ConfigRefresher::new(file.path(), 3));
    runner.run().unwrap();

    assert!(!runner.core().has_staged_config());
    assert_eq!(runner.core().config().generation(), 0);
    assert_eq!(runner.last_report().unwrap().config_generation, 0);
}

#[test]
fn tick_period_change_is_denied() {
    let file = config_file("[timing]\ntick_period_us = 20000\n");
    let active = load_config_from_str("").unwrap();
    let refresher = ConfigRefresher::new(file.path(), 1);
    assert!(matches!(refresher.reload_now(&active), ReloadResult::Denied(_)));

    let mut c = ControlsCore::new(active).unwrap();
    let other = load_config(file.path()).unwrap();
    assert!(c.stage_config(other).is_err());
    assert!(!c.has_staged_config());
}

#[test]
fn missing_file_is_a_failed_reload() {
    let file = config_file(PID_DOC);
    let path = file.path().to_path_buf();
    drop(file);

    let active = load_config_from_str(PID_DOC).unwrap();
    let refresher = ConfigRefresher::new(path, 1);
    assert!(matches!(
        refresher.reload_now(&active),
        ReloadResult::ValidationFailed(_)
    ));
}
