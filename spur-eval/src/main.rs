// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A front-end for measuring the routing waste of connectivity matrices.
//!
//! For example, run using:
//!   cargo run --bin spur-eval -- --matrix net.json --evaluation both
//! --assignment clustered --report-format both --stdout --stdout-level debug

use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use spur_platform::config::EvalConfig;
use spur_platform::run::Runner;
use spur_track::Track;
use spur_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};
use spur_track::entity::toplevel;

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Measure the routing waste of multicast spikes on core trees")]
struct Cli {
    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,

    /// Write the log to this file.
    #[arg(long)]
    log_file: Option<String>,

    /// Level of log message written to the log file.
    #[arg(long, default_value = "Debug")]
    log_level: log::Level,

    /// Set a regular expression for which entites should have log file level
    /// set to `--log-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    log_filter_regex: String,

    /// Show a progress bar over the matrices.
    #[arg(long)]
    progress: bool,

    #[command(flatten)]
    config: EvalConfig,
}

fn setup_all_trackers(args: &Cli) -> Result<Rc<dyn Track>> {
    let config = TrackersConfig {
        stdout: TrackerConfig {
            enable: args.stdout,
            level: args.stdout_level,
            filter_regex: &args.stdout_filter_regex,
            file: None,
        },
        log_file: TrackerConfig {
            enable: args.log_file.is_some(),
            level: args.log_level,
            filter_regex: &args.log_filter_regex,
            file: args.log_file.as_deref(),
        },
    };
    Ok(setup_trackers(&config)?)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let tracker = setup_all_trackers(&args)?;

    let settings = EvalConfig::load(&args.config)?.settings()?;
    let top = toplevel(&tracker, "spur");
    let runner = Runner::new(&top, settings);

    let matrices = runner.settings().matrices.clone();
    let progress_bar = args
        .progress
        .then(|| ProgressBar::new(matrices.len() as u64));

    let mut result = Ok(());
    for matrix in &matrices {
        let summaries = match runner.run_matrix(matrix) {
            Ok(summaries) => summaries,
            Err(e) => {
                result = Err(e);
                break;
            }
        };
        for summary in summaries {
            let mut lines = vec![summary.to_string()];
            lines.extend(
                summary
                    .written
                    .iter()
                    .map(|path| format!("  wrote {}", path.display())),
            );
            for line in lines {
                match &progress_bar {
                    Some(progress_bar) => progress_bar.println(line),
                    None => println!("{line}"),
                }
            }
        }
        if let Some(progress_bar) = &progress_bar {
            progress_bar.inc(1);
        }
    }

    if let Some(progress_bar) = progress_bar {
        progress_bar.finish();
    }
    tracker.shutdown();

    Ok(result?)
}
