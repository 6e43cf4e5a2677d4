//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "refresher", version, about = "Drink dispensing controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults apply when absent
    #[arg(long, value_name = "FILE", default_value = "etc/refresher.toml")]
    pub config: PathBuf,

    /// Recipe table CSV (strict header); overrides recipes from the TOML
    #[arg(long, value_name = "FILE")]
    pub recipes: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dispensing controller loop
    Run {
        /// Serial device carrying the button node's commands (hardware
        /// builds); defaults to the keyboard on stdin
        #[arg(long, value_name = "DEV")]
        serial: Option<String>,
        /// Override the input poll rate in Hz (takes precedence over config)
        #[arg(long, value_name = "HZ")]
        poll_hz: Option<u32>,
        /// Enable real-time mode (SCHED_FIFO + mlockall, Linux only)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux builds with the `rt` feature.\n\nAttempts SCHED_FIFO priority and calls mlockall(MCL_CURRENT|MCL_FUTURE) so page faults cannot stretch a timed pour. May require elevated privileges or ulimits (e.g., memlock). Use with care on shared systems."
        )]
        rt: bool,
        /// SCHED_FIFO priority when --rt is enabled (Linux only)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
    },
    /// Compute pour volumes and run times without touching the pumps
    Plan {
        /// Recipe selector letter (A-D)
        #[arg(long, value_name = "LETTER")]
        recipe: char,
        /// Size selector letter (W-Z)
        #[arg(long, value_name = "LETTER")]
        size: char,
    },
    /// Quick health check (simulated stack exercise)
    SelfCheck,
}
