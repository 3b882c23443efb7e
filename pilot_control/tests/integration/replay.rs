//! End-to-end replay: JSON-lines inputs in, JSON-lines commands out.

use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;

use pilot_common::controls::command::LateralKind;
use pilot_common::controls::state::LongControlState;
use pilot_control::config::{ConfigSnapshot, load_config};
use pilot_control::cycle::{ControlsCore, CycleRunner};
use pilot_control::ingest::JsonLinesSource;
use pilot_control::publish::{JsonLinesSink, PublishedCommand};

const SAMPLE_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/pilot.toml");

/// Engage, follow a gentle left bend with mild acceleration, then cancel.
fn recording(cruise_ticks: usize) -> String {
    let mut text = String::from("# pilot replay\n");
    text.push_str(r#"{"vehicle":{"v_ego":12.0},"events":["buttonEnable"]}"#);
    text.push('\n');
    for i in 0..cruise_ticks {
        let v = 12.0 + 0.005 * i as f64;
        writeln!(
            text,
            r#"{{"vehicle":{{"v_ego":{v}}},"long_plan":{{"a_target":0.5}},"lat_plan":{{"curvature":0.002}}}}"#
        )
        .unwrap();
    }
    text.push('\n');
    text.push_str(r#"{"vehicle":{"v_ego":13.0},"events":["buttonCancel"]}"#);
    text.push('\n');
    text
}

fn replay(snapshot: ConfigSnapshot, text: &str) -> Vec<PublishedCommand> {
    let core = ControlsCore::new(snapshot).unwrap();
    let mut runner = CycleRunner::new(
        core,
        JsonLinesSource::new(Cursor::new(text.to_owned())),
        JsonLinesSink::new(Vec::new()),
    );
    runner.run().unwrap();

    let out = String::from_utf8(runner.sink().get_ref().clone()).unwrap();
    out.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn sample_config_loads() {
    let snapshot = load_config(Path::new(SAMPLE_CONFIG)).unwrap();
    let cfg = snapshot.config();
    assert_eq!(cfg.lateral.controller, LateralKind::Torque);
    assert_eq!(cfg.timing.tick_period_us, 10_000);
    assert_eq!(snapshot.generation(), 0);
}

#[test]
fn replay_publishes_one_command_per_tick() {
    let snapshot = load_config(Path::new(SAMPLE_CONFIG)).unwrap();
    let published = replay(snapshot, &recording(100));

    assert_eq!(published.len(), 102);
    for (i, p) in published.iter().enumerate() {
        assert_eq!(p.tick, i as u64 + 1);
        assert!(p.command.steer.is_finite());
        assert!(p.command.accel.is_finite());
    }

    let cruising = &published[100];
    assert_eq!(cruising.command.long_control_state, LongControlState::Pid);
    assert!(cruising.command.accel > 0.0);
    assert!(cruising.command.steer != 0.0);
    assert_eq!(cruising.command.lateral_debug.kind(), Some(LateralKind::Torque));

    let cancelled = published.last().unwrap();
    assert_eq!(cancelled.command.steer, 0.0);
    assert_eq!(cancelled.command.accel, 0.0);
    assert_eq!(cancelled.command.long_control_state, LongControlState::Off);
}

#[test]
fn replay_is_deterministic() {
    let text = recording(50);
    let a = replay(ConfigSnapshot::default(), &text);
    let b = replay(ConfigSnapshot::default(), &text);
    assert_eq!(a, b);
}

#[test]
fn malformed_line_stops_replay_with_error() {
    let text = "{\"vehicle\":{\"v_ego\":10.0}}\nnot json\n{}\n";
    let core = ControlsCore::new(ConfigSnapshot::default()).unwrap();
    let mut runner = CycleRunner::new(
        core,
        JsonLinesSource::new(Cursor::new(text)),
        JsonLinesSink::new(Vec::new()),
    );
    let err = runner.run().unwrap_err();
    assert!(err.to_string().contains("line 2"));
    assert_eq!(runner.stats().cycle_count, 1);
}
