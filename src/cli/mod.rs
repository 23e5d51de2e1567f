//! CLI module for EventCut
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::LogFormat;

pub mod args;
pub mod commands;

/// EventCut
///
/// Extract frames or clips around annotated events of a football match corpus.
#[derive(Parser)]
#[command(name = "eventcut")]
#[command(about = "EventCut - Extract annotated events from match videos")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level or filter directive (overridden by RUST_LOG)
    #[arg(long, default_value = "info", env = "EVENTCUT_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// Configuration file (default: eventcut.toml, then config/eventcut.toml)
    #[arg(long, env = "EVENTCUT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Extract frames or clips for the selected event
    Extract(args::ExtractArgs),
    /// Show what one match would produce, without writing anything
    Plan(args::PlanArgs),
    /// Show frame rate, frame count and duration of a match's halves
    Inspect(args::InspectArgs),
}
