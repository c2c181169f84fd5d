//! Feed a recorded trace through a [`FramePipeline`] and emit its events.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use pinchpoint_core::{FrameOutput, FramePipeline, InteractionEvent, PointerConfig, TargetSet};
use serde::Serialize;
use tracing::info;
use web_time::{Duration, Instant};

use crate::error::{HarnessError, Result};
use crate::trace::{TraceLine, TraceRecord, read_targets, read_trace};

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// JSONL trace of frames and host actions.
    #[arg(long)]
    pub trace: PathBuf,

    /// JSON array of targets to hit-test against.
    #[arg(long)]
    pub targets: Option<PathBuf>,

    /// Pointer configuration (TOML, or JSON by extension).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Totals for one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: u64,
    pub events: u64,
    pub clicks: u64,
    pub rejected: u64,
}

#[derive(Serialize)]
struct EventLine<'a> {
    ts_ms: u64,
    #[serde(flatten)]
    event: &'a InteractionEvent,
}

pub fn run_replay(args: ReplayArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PointerConfig::default(),
    };
    let targets = match &args.targets {
        Some(path) => read_targets(path)?,
        None => TargetSet::default(),
    };
    let trace = read_trace(&args.trace)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = replay(&trace, config, targets, &mut out)?;
    out.flush()?;

    info!(
        frames = summary.frames,
        events = summary.events,
        clicks = summary.clicks,
        rejected = summary.rejected,
        "replay finished"
    );
    Ok(())
}

pub(crate) fn load_config(path: &std::path::Path) -> Result<PointerConfig> {
    PointerConfig::from_file(path).map_err(|source| HarnessError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Replay `trace`, writing one JSON object per event to `out`. The pipeline
/// is torn down after the last record.
pub fn replay(
    trace: &[TraceLine],
    config: PointerConfig,
    targets: TargetSet,
    out: &mut impl Write,
) -> Result<ReplaySummary> {
    let mut pipeline = FramePipeline::new(config);
    let mut summary = ReplaySummary::default();
    let start = Instant::now();

    emit(0, &pipeline.set_targets(targets), &mut summary, out)?;

    let mut last_ts = 0;
    for TraceLine { line, record } in trace {
        let ts_ms = record.ts_ms();
        let now = start + Duration::from_millis(ts_ms);
        last_ts = ts_ms;
        let output = match record {
            TraceRecord::Frame { hands, .. } => {
                summary.frames += 1;
                pipeline.process(hands, now)
            }
            TraceRecord::Mode { mode, .. } => pipeline.set_mode(*mode),
            TraceRecord::EndEdit { .. } => pipeline.end_edit(),
        };
        tracing::trace!(line, ts_ms, events = output.events.len(), "replayed record");
        emit(ts_ms, &output, &mut summary, out)?;
    }

    emit(last_ts, &pipeline.teardown(), &mut summary, out)?;
    summary.rejected = pipeline.rejected();
    Ok(summary)
}

fn emit(
    ts_ms: u64,
    output: &FrameOutput,
    summary: &mut ReplaySummary,
    out: &mut impl Write,
) -> Result<()> {
    for event in &output.events {
        serde_json::to_writer(&mut *out, &EventLine { ts_ms, event })?;
        out.write_all(b"\n")?;
        summary.events += 1;
        if matches!(event, InteractionEvent::Click { .. }) {
            summary.clicks += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinchpoint_core::fixtures::{HandPose, observation_at_screen};
    use pinchpoint_core::{Point, Rect, Target, Viewport};

    fn frame(ts_ms: u64, pose: HandPose, x: f32, y: f32) -> TraceLine {
        TraceLine {
            line: 1,
            record: TraceRecord::Frame {
                ts_ms,
                hands: vec![observation_at_screen(pose, Point::new(x, y), Viewport::default())],
            },
        }
    }

    #[test]
    fn replay_writes_one_json_object_per_event() {
        let trace = vec![
            frame(0, HandPose::Pinch, 100.0, 180.0),
            frame(16, HandPose::Open, 100.0, 180.0),
        ];
        let targets = TargetSet::new(vec![Target::button("btn1", Rect::new(50.0, 150.0, 160.0, 80.0))]);
        let mut buf = Vec::new();
        let summary = replay(&trace, PointerConfig::default(), targets, &mut buf).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.clicks, 1);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len() as u64, summary.events);
        let click = lines.iter().find(|v| v["event"] == "click").unwrap();
        assert_eq!(click["ts_ms"], 0);
        assert_eq!(click["target"], "btn1");
    }

    #[test]
    fn replay_ends_with_teardown() {
        let trace = vec![frame(0, HandPose::Open, 100.0, 180.0)];
        let mut buf = Vec::new();
        replay(&trace, PointerConfig::default(), TargetSet::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let last: serde_json::Value = serde_json::from_str(text.lines().last().unwrap()).unwrap();
        assert_eq!(last["event"], "pointer_update");
        assert_eq!(last["visible"], false);
    }
}
