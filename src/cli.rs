//! Command-line interface for adhop
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Radio ad detection and automatic station hopping
#[derive(Parser, Debug)]
#[command(
    name = "adhop",
    version,
    about = "Radio ad detection and automatic station hopping"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress per-window and per-transition output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// WAV file to replay instead of a live receiver
    #[arg(long, value_name = "PATH")]
    pub wav: Option<PathBuf>,

    /// Replay the WAV file forever instead of stopping at the end
    #[arg(long = "loop", requires = "wav")]
    pub loop_replay: bool,

    /// Primary station frequency in Hz (e.g. 100.3e6)
    #[arg(long, value_name = "HZ")]
    pub primary: Option<f64>,

    /// Secondary station frequency in Hz, hopped to during ad breaks
    #[arg(long, value_name = "HZ")]
    pub secondary: Option<f64>,

    /// Listen address for the live feed server
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Classification window duration (default: 10s). Examples: 10s, 1m
    #[arg(long, value_name = "DURATION", value_parser = parse_window_secs)]
    pub window: Option<u32>,

    /// Audio batch duration (default: 100ms). Examples: 100ms, 1s
    #[arg(long, value_name = "DURATION", value_parser = parse_batch_ms)]
    pub batch: Option<u32>,
}

/// Parse a window duration string into whole seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`10s`, `1m`), and compound (`1m30s`).
fn parse_window_secs(s: &str) -> Result<u32, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u32>() {
        return Ok(secs);
    }
    let duration = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    u32::try_from(duration.as_secs()).map_err(|_| "window too long".to_string())
}

/// Parse a batch duration string into milliseconds.
fn parse_batch_ms(s: &str) -> Result<u32, String> {
    let s = s.trim();
    // Bare number → milliseconds
    if let Ok(ms) = s.parse::<u32>() {
        return Ok(ms);
    }
    let duration = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    u32::try_from(duration.as_millis()).map_err(|_| "batch too long".to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
