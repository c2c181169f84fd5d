//! JSONL frame traces.
//!
//! One record per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"frame","ts_ms":0,"hands":[{"keypoints":[{"x":0.5,"y":0.5,"z":0.0}, ...],"score":0.9}]}
//! {"kind":"mode","ts_ms":120,"mode":"draw"}
//! {"kind":"end_edit","ts_ms":400}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Timestamps are
//! milliseconds from the start of the recording and must not decrease.

use std::io::BufRead;
use std::path::Path;

use pinchpoint_core::{HandObservation, InteractionMode, Target, TargetSet};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// One recorded host action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceRecord {
    /// Detector output for one display frame.
    Frame {
        ts_ms: u64,
        #[serde(default)]
        hands: Vec<HandObservation>,
    },
    /// The host switched interaction mode.
    Mode { ts_ms: u64, mode: InteractionMode },
    /// The host closed the note editor.
    EndEdit { ts_ms: u64 },
}

impl TraceRecord {
    #[must_use]
    pub fn ts_ms(&self) -> u64 {
        match self {
            Self::Frame { ts_ms, .. } | Self::Mode { ts_ms, .. } | Self::EndEdit { ts_ms } => *ts_ms,
        }
    }
}

/// A record with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceLine {
    pub line: usize,
    pub record: TraceRecord,
}

/// Parse a trace. `origin` is only used in error messages.
pub fn parse_trace(reader: impl BufRead, origin: &Path) -> Result<Vec<TraceLine>> {
    let mut lines = Vec::new();
    let mut last_ts = 0;
    for (idx, text) in reader.lines().enumerate() {
        let line = idx + 1;
        let text = text?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: TraceRecord = serde_json::from_str(trimmed)
            .map_err(|e| HarnessError::trace(origin, line, e.to_string()))?;
        if record.ts_ms() < last_ts {
            return Err(HarnessError::trace(
                origin,
                line,
                format!("timestamp {} is before previous {last_ts}", record.ts_ms()),
            ));
        }
        last_ts = record.ts_ms();
        lines.push(TraceLine { line, record });
    }
    tracing::debug!(path = %origin.display(), records = lines.len(), "parsed trace");
    Ok(lines)
}

/// Read and parse a trace file.
pub fn read_trace(path: &Path) -> Result<Vec<TraceLine>> {
    let file = std::fs::File::open(path).map_err(|e| HarnessError::open(path, e))?;
    parse_trace(std::io::BufReader::new(file), path)
}

/// Read a JSON array of targets.
pub fn read_targets(path: &Path) -> Result<TargetSet> {
    let content = std::fs::read_to_string(path).map_err(|e| HarnessError::open(path, e))?;
    let targets: Vec<Target> = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), targets = targets.len(), "loaded targets");
    Ok(TargetSet::new(targets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<TraceLine>> {
        parse_trace(text.as_bytes(), Path::new("t.jsonl"))
    }

    #[test]
    fn parses_all_record_kinds() {
        let lines = parse(
            "# recorded by hand\n\
             {\"kind\":\"frame\",\"ts_ms\":0}\n\
             \n\
             {\"kind\":\"mode\",\"ts_ms\":16,\"mode\":\"draw\"}\n\
             {\"kind\":\"end_edit\",\"ts_ms\":32}\n",
        )
        .unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line, 2);
        assert_eq!(
            lines[0].record,
            TraceRecord::Frame {
                ts_ms: 0,
                hands: vec![]
            }
        );
        assert_eq!(
            lines[1].record,
            TraceRecord::Mode {
                ts_ms: 16,
                mode: InteractionMode::Draw
            }
        );
        assert_eq!(lines[2].line, 5);
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let err = parse("{\"kind\":\"frame\",\"ts_ms\":0}\n{\"kind\":\"warp\",\"ts_ms\":1}\n").unwrap_err();
        match err {
            HarnessError::Trace { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decreasing_timestamp_is_rejected() {
        let err = parse("{\"kind\":\"frame\",\"ts_ms\":50}\n{\"kind\":\"frame\",\"ts_ms\":10}\n")
            .unwrap_err();
        assert!(err.to_string().contains("t.jsonl:2"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn hand_fields_deserialize() {
        let keypoints = vec![serde_json::json!({"x": 0.1, "y": 0.2, "z": 0.0}); 21];
        let text = serde_json::json!({
            "kind": "frame",
            "ts_ms": 5,
            "hands": [{"keypoints": keypoints, "score": 0.9}],
        })
        .to_string();
        let lines = parse(&text).unwrap();
        let TraceRecord::Frame { hands, .. } = &lines[0].record else {
            panic!("expected frame");
        };
        assert_eq!(hands[0].keypoints.len(), 21);
        assert!(hands[0].landmarks().is_ok());
    }
}
