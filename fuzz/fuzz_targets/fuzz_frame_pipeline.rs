#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pinchpoint_core::fixtures::{HandPose, observation};
use pinchpoint_core::hand::Keypoint;
use pinchpoint_core::{
    FramePipeline, HandObservation, Handedness, InteractionEvent, InteractionMode, Rect, Target,
    TargetSet, ToolbarAction,
};
use web_time::{Duration, Instant};

#[derive(Debug, Arbitrary)]
enum Step {
    Hand { pose: u8, x: u8, y: u8, score: u8 },
    Garbage { count: u8, value: f32 },
    Lost,
    Mode(bool),
    EndEdit,
}

#[derive(Debug, Arbitrary)]
struct Session {
    steps: Vec<(u8, Step)>,
}

fn targets() -> TargetSet {
    TargetSet::new(vec![
        Target::button("b", Rect::new(0.0, 0.0, 400.0, 300.0)),
        Target::note("n", Rect::new(300.0, 200.0, 400.0, 300.0)),
        Target::toolbar("clear", ToolbarAction::Clear, Rect::new(1000.0, 0.0, 280.0, 200.0)),
        Target::toolbar("exit", ToolbarAction::Exit, Rect::new(1000.0, 200.0, 280.0, 200.0)),
    ])
}

/// Drags must be well-formed and committed strokes non-trivial.
fn check(events: &[InteractionEvent], dragging: &mut bool) {
    for event in events {
        match event {
            InteractionEvent::DragStart { .. } => {
                assert!(!*dragging, "nested drag");
                *dragging = true;
            }
            InteractionEvent::DragMove { .. } => assert!(*dragging, "move outside drag"),
            InteractionEvent::DragEnd { .. } => {
                assert!(*dragging, "end without start");
                *dragging = false;
            }
            InteractionEvent::StrokeCommit { points, .. } => assert!(points.len() >= 2),
            _ => {}
        }
    }
}

fuzz_target!(|session: Session| {
    let mut pipeline = FramePipeline::default();
    pipeline.set_targets(targets());
    let mut now = Instant::now();
    let mut dragging = false;

    for (dt, step) in session.steps.into_iter().take(2000) {
        now += Duration::from_millis(u64::from(dt));
        let out = match step {
            Step::Hand { pose, x, y, score } => {
                let pose = match pose % 4 {
                    0 => HandPose::Open,
                    1 => HandPose::Pinch,
                    2 => HandPose::Fist,
                    _ => HandPose::FistPinching,
                };
                let mut obs = observation(pose, f32::from(x) / 255.0, f32::from(y) / 255.0);
                obs.score = f32::from(score) / 255.0;
                pipeline.process(&[obs], now)
            }
            Step::Garbage { count, value } => {
                let obs = HandObservation::new(
                    vec![Keypoint::new(value, value, value); usize::from(count % 32)],
                    Handedness::Left,
                    value,
                );
                pipeline.process(&[obs], now)
            }
            Step::Lost => pipeline.process(&[], now),
            Step::Mode(draw) => pipeline.set_mode(if draw {
                InteractionMode::Draw
            } else {
                InteractionMode::Pointer
            }),
            Step::EndEdit => pipeline.end_edit(),
        };
        check(&out.events, &mut dragging);
    }

    let out = pipeline.teardown();
    check(&out.events, &mut dragging);
    assert!(!dragging, "drag survived teardown");
    assert_eq!(pipeline.machine().pending_timers(), 0);

    now += Duration::from_secs(5);
    assert!(pipeline.process(&[], now).is_empty());
});
