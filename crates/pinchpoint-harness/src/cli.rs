use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::replay::{ReplayArgs, load_config, run_replay};

#[derive(Debug, Parser)]
#[command(
    name = "pinchpoint",
    about = "Replay recorded hand traces through the pinchpoint interaction pipeline",
    version
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a JSONL trace and print one JSON event per line.
    Replay(ReplayArgs),

    /// Load and validate a pointer configuration file.
    #[command(name = "check-config")]
    CheckConfig {
        /// TOML or JSON configuration file.
        path: PathBuf,
    },
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Replay(args) => run_replay(args),
        Commands::CheckConfig { path } => {
            let config = load_config(&path)?;
            println!("{}: ok", path.display());
            tracing::debug!(?config, "configuration accepted");
            Ok(())
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `warn`
/// level.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::{Cli, Commands, run};
    use crate::error::HarnessError;

    #[test]
    fn parses_replay_with_global_flag() {
        let cli = Cli::parse_from([
            "pinchpoint",
            "replay",
            "--trace",
            "run.jsonl",
            "--targets",
            "ui.json",
            "--log-json",
        ]);
        assert!(cli.log_json);
        let Commands::Replay(args) = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(args.trace.to_str(), Some("run.jsonl"));
        assert!(args.config.is_none());
    }

    #[test]
    fn check_config_accepts_valid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "min_confidence = 0.7\n[timing]\nclick_cooldown = 300").unwrap();
        let result = run(Cli {
            log_json: false,
            command: Commands::CheckConfig {
                path: file.path().to_path_buf(),
            },
        });
        assert!(result.is_ok());
    }

    #[test]
    fn check_config_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"stabilizer": {{"smoothing": 0.0}}}}"#).unwrap();
        let err = run(Cli {
            log_json: false,
            command: Commands::CheckConfig {
                path: file.path().to_path_buf(),
            },
        })
        .unwrap_err();
        assert!(matches!(err, HarnessError::Config { .. }));
        assert!(err.to_string().contains("stabilizer.smoothing"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_trace_is_an_open_error() {
        let err = run(Cli {
            log_json: false,
            command: Commands::Replay(crate::replay::ReplayArgs {
                trace: "/nonexistent/trace.jsonl".into(),
                targets: None,
                config: None,
            }),
        })
        .unwrap_err();
        assert!(matches!(err, HarnessError::Open { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
