#![forbid(unsafe_code)]

//! Offline driver for `pinchpoint-core`.
//!
//! Replays JSONL traces of detector output and host actions through a
//! [`FramePipeline`](pinchpoint_core::FramePipeline), printing each emitted
//! event as a JSON line. Useful for regression-testing tuning changes against
//! recorded sessions without a camera.

pub mod cli;
pub mod error;
pub mod replay;
pub mod trace;

pub use cli::{run, run_from_env};
pub use error::{HarnessError, Result};
