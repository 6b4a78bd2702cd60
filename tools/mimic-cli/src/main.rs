//! Mimic CLI: headless driver for the avatar rig.
//!
//! Usage:
//!   mimic simulate [OPTIONS]        Run the rig and write per-frame weights (JSONL)
//!   mimic timeline <FILE>           Show how a durations report maps to visemes
//!   mimic visemes                   List the rig's blend-shape channels
//!   mimic check-config [FILE]       Validate a rig tuning file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mimic_common::config::{AppConfig, LoggingConfig};
use mimic_rig_model::TimingMode;

mod commands;

#[derive(Parser)]
#[command(
    name = "mimic",
    about = "Autonomous gaze, blinking and lip-sync for virtual avatars",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rig at a fixed frame rate and write one JSON record per frame
    Simulate {
        /// Rig tuning file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frames per second
        #[arg(long)]
        fps: Option<u32>,

        /// Simulated duration (seconds)
        #[arg(long)]
        duration_secs: Option<f64>,

        /// Blink RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Gaze cue SECS=X,Y,Z (look at a point) or SECS=none (look away); repeatable
        #[arg(long = "gaze", value_parser = commands::simulate::parse_gaze_cue)]
        gaze: Vec<commands::simulate::GazeCue>,

        /// Realized-durations report to speak
        #[arg(long)]
        speak: Option<PathBuf>,

        /// When to start speaking (seconds)
        #[arg(long, default_value = "0.0")]
        speak_at: f64,

        /// Keep the neck still; eyes alone follow the target
        #[arg(long)]
        no_neck: bool,

        /// Pace frames against the wall clock instead of running flat out
        #[arg(long)]
        realtime: bool,

        /// Scale weights to the configured host blend-shape range
        #[arg(long)]
        host_range: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a durations report and print the resulting timeline
    Timeline {
        /// Path to the realized-durations report
        path: PathBuf,

        /// Treat times as per-phoneme durations instead of end times
        #[arg(long)]
        segment: bool,

        /// Custom viseme set (JSON)
        #[arg(long)]
        visemes: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List eye, eyelid and mouth channel names
    Visemes {
        /// Custom viseme set (JSON)
        #[arg(long)]
        visemes: Option<PathBuf>,

        /// File with the mesh's blend-shape names, one per line; reports
        /// channels the mesh lacks
        #[arg(long)]
        mesh: Option<PathBuf>,
    },

    /// Validate a rig tuning file, or print the defaults when none is given
    CheckConfig {
        /// Path to the rig tuning file
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let app = AppConfig::load();

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        app.logging.level.clone()
    };
    mimic_common::logging::init_logging(&LoggingConfig {
        level,
        json: app.logging.json,
    });

    match cli.command {
        Commands::Simulate {
            config,
            fps,
            duration_secs,
            seed,
            gaze,
            speak,
            speak_at,
            no_neck,
            realtime,
            host_range,
            output,
        } => {
            let defaults = &app.simulation;
            commands::simulate::run(commands::simulate::SimulateArgs {
                config: config.or_else(|| defaults.rig_config.clone()),
                fps: fps.unwrap_or(defaults.fps),
                duration_secs: duration_secs.unwrap_or(defaults.duration_secs),
                seed: seed.or(defaults.seed),
                gaze,
                speak,
                speak_at,
                neck: !no_neck,
                realtime,
                host_range,
                output,
            })
            .await
        }
        Commands::Timeline {
            path,
            segment,
            visemes,
            json,
        } => {
            let timing = if segment {
                TimingMode::Segment
            } else {
                TimingMode::Cumulative
            };
            commands::timeline::run(path, timing, visemes, json)
        }
        Commands::Visemes { visemes, mesh } => commands::visemes::run(visemes, mesh),
        Commands::CheckConfig { path } => commands::check_config::run(path),
    }
}
