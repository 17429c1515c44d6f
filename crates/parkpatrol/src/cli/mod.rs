//! Command-line interface for parkpatrol.
//!
//! This module provides the CLI structure and command handlers for the
//! `parkpatrol` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AlertCommand, AlertTarget, ClearCommand, ConfigCommand, DeleteCommand, HistoryCommand,
    OutputFormat, ProfileCommand, ProfileFieldArg, StatusCommand, WatchCommand,
};

/// parkpatrol - Report parking enforcement sightings
///
/// Drop a pin on the map, send an alert, and keep a local history of
/// every sighting you have reported.
#[derive(Debug, Parser)]
#[command(name = "parkpatrol")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pin a spot and send an alert for it
    Alert(AlertCommand),

    /// List sent alerts, most recent first
    History(HistoryCommand),

    /// Delete alerts from the history
    Delete(DeleteCommand),

    /// Delete the whole alert history
    Clear(ClearCommand),

    /// Follow the alert history as it changes
    Watch(WatchCommand),

    /// View or edit the user profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Show storage status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
