//! Trace files through the full replay path: write JSONL, read it back,
//! replay it, and inspect the emitted event lines.
//!
//! Run:
//!   cargo test -p pinchpoint-harness --test trace_replay

use std::io::Write;
use std::path::{Path, PathBuf};

use pinchpoint_core::fixtures::{HandPose, observation_at_screen};
use pinchpoint_core::{InteractionMode, Point, PointerConfig, TargetSet, Viewport};
use pinchpoint_harness::HarnessError;
use pinchpoint_harness::replay::replay;
use pinchpoint_harness::trace::{TraceRecord, parse_trace, read_targets, read_trace};
use proptest::prelude::*;
use serde_json::Value;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn frame(ts_ms: u64, pose: HandPose, x: f32, y: f32) -> TraceRecord {
    TraceRecord::Frame {
        ts_ms,
        hands: vec![observation_at_screen(pose, Point::new(x, y), Viewport::default())],
    }
}

fn write_trace(records: &[TraceRecord]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
    writeln!(file, "# synthetic session").unwrap();
    for record in records {
        writeln!(file, "{}", serde_json::to_string(record).unwrap()).unwrap();
    }
    file
}

fn run(records: &[TraceRecord]) -> Vec<Value> {
    let file = write_trace(records);
    let trace = read_trace(file.path()).unwrap();
    let targets = read_targets(&fixture("whiteboard_targets.json")).unwrap();
    let mut out = Vec::new();
    replay(&trace, PointerConfig::default(), targets, &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn events<'a>(lines: &'a [Value], name: &str) -> Vec<&'a Value> {
    lines.iter().filter(|v| v["event"] == name).collect()
}

#[test]
fn targets_fixture_loads_all_kinds() {
    let targets = read_targets(&fixture("whiteboard_targets.json")).unwrap();
    assert_eq!(targets.len(), 4);
    assert!(targets.get(&"note1".into()).unwrap().is_draggable());
}

#[test]
fn click_session_round_trips_through_file() {
    let mut records = Vec::new();
    for i in 0..5 {
        records.push(frame(i * 16, HandPose::Open, 100.0, 180.0));
    }
    for i in 5..10 {
        records.push(frame(i * 16, HandPose::Pinch, 100.0, 180.0));
    }
    let lines = run(&records);

    let hovers = events(&lines, "hover_changed");
    assert_eq!(hovers[0]["target"], "btn1");
    let clicks = events(&lines, "click");
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0]["ts_ms"], 80);
}

#[test]
fn drag_session_emits_well_formed_drag() {
    let mut records = Vec::new();
    let mut ts = 0;
    let mut push = |pose, x, y, n: u32| {
        for _ in 0..n {
            records.push(frame(ts, pose, x, y));
            ts += 16;
        }
    };
    push(HandPose::Open, 450.0, 350.0, 4);
    push(HandPose::Fist, 450.0, 350.0, 2);
    push(HandPose::Fist, 600.0, 500.0, 20);
    push(HandPose::Open, 600.0, 500.0, 10);

    let lines = run(&records);
    let names: Vec<&str> = lines
        .iter()
        .filter_map(|v| v["event"].as_str())
        .filter(|n| n.starts_with("drag_"))
        .collect();
    assert_eq!(names.first(), Some(&"drag_start"));
    assert_eq!(names.last(), Some(&"drag_end"));
    assert_eq!(names.iter().filter(|n| **n == "drag_start").count(), 1);
    assert!(names.contains(&"drag_move"));

    let start = events(&lines, "drag_start")[0];
    assert_eq!(start["target"], "note1");
}

#[test]
fn mode_and_end_edit_records_drive_host_actions() {
    let mut records = vec![frame(0, HandPose::Open, 450.0, 350.0)];
    for i in 1..40 {
        records.push(frame(i * 16, HandPose::Pinch, 450.0, 350.0));
    }
    records.push(TraceRecord::EndEdit { ts_ms: 640 });
    records.push(TraceRecord::Mode {
        ts_ms: 656,
        mode: InteractionMode::Draw,
    });

    let lines = run(&records);
    assert_eq!(events(&lines, "edit_start").len(), 1);
    let end = events(&lines, "edit_end");
    assert_eq!(end.len(), 1);
    assert_eq!(end[0]["ts_ms"], 640);
    assert_eq!(events(&lines, "mode_changed")[0]["mode"], "draw");
}

#[test]
fn malformed_line_is_reported_with_line_number() {
    let mut file = write_trace(&[frame(0, HandPose::Open, 10.0, 10.0)]);
    writeln!(file, "{{\"kind\":\"frame\",\"ts_ms\":\"soon\"}}").unwrap();
    let err = read_trace(file.path()).unwrap_err();
    match &err {
        HarnessError::Trace { line, .. } => assert_eq!(*line, 3),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn malformed_hands_degrade_to_no_hand() {
    let records = vec![
        frame(0, HandPose::Open, 100.0, 180.0),
        TraceRecord::Frame {
            ts_ms: 16,
            hands: vec![pinchpoint_core::HandObservation::new(
                vec![],
                Default::default(),
                0.9,
            )],
        },
    ];
    let file = write_trace(&records);
    let trace = read_trace(file.path()).unwrap();
    let mut out = Vec::new();
    let summary = replay(&trace, PointerConfig::default(), TargetSet::default(), &mut out).unwrap();
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.rejected, 1);
}

proptest! {
    #[test]
    fn arbitrary_lines_never_panic(lines in proptest::collection::vec(".{0,80}", 0..20)) {
        let text = lines.join("\n");
        let _ = parse_trace(text.as_bytes(), Path::new("fuzz.jsonl"));
    }

    #[test]
    fn timestamps_out_of_order_are_rejected(a in 1u64..10_000, b in 0u64..10_000) {
        prop_assume!(b < a);
        let text = format!(
            "{{\"kind\":\"end_edit\",\"ts_ms\":{a}}}\n{{\"kind\":\"end_edit\",\"ts_ms\":{b}}}\n"
        );
        let result = parse_trace(text.as_bytes(), Path::new("t.jsonl"));
        let is_trace_error = matches!(result, Err(HarnessError::Trace { line: 2, .. }));
        prop_assert!(is_trace_error);
    }
}
