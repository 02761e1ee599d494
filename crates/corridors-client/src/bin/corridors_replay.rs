//! `corridors-replay`: replay a client transcript and print the result.
//!
//! Usage:
//!   corridors-replay [--config <file.toml>] < transcript
//!
//! The transcript is read from stdin; see `corridors_client::replay` for
//! its format. The final state tree, outbound messages and warnings are
//! printed to stdout as JSON.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use corridors_client::config::ClientConfig;
use corridors_client::logging;
use corridors_client::replay::{replay_transcript, ReplayError};

const USAGE: &str = "usage: corridors-replay [--config <file.toml>] < transcript";

/// The config file named on the command line, `Some(None)` for none, or
/// `None` when the arguments do not match the usage.
fn parse_args(args: &[String]) -> Option<Option<&str>> {
    match args {
        [] => Some(None),
        [flag, path] if flag == "--config" => Some(Some(path.as_str())),
        _ => None,
    }
}

fn run(config_path: Option<&str>) -> Result<usize, ReplayError> {
    let config = match config_path {
        Some(path) => ClientConfig::from_toml_file(path)?,
        None => ClientConfig::default(),
    };
    logging::init(&config.log_level);

    let mut transcript = String::new();
    io::stdin().read_to_string(&mut transcript)?;

    let report = replay_transcript(&transcript, config)?;
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report.to_json())?;
    stdout.write_all(b"\n")?;
    Ok(report.warnings.len())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(config_path) = parse_args(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    match run(config_path) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(warnings) => {
            tracing::warn!(warnings, "transcript replayed with warnings");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
