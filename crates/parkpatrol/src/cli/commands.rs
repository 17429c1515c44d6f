//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};

use crate::geo::{Coordinate, ScreenPoint};
use crate::profile::ProfileField;

/// Alert command arguments.
#[derive(Debug, Args)]
pub struct AlertCommand {
    /// Latitude of the sighting
    #[arg(
        allow_negative_numbers = true,
        required_unless_present = "screen",
        requires = "longitude"
    )]
    pub latitude: Option<f64>,

    /// Longitude of the sighting
    #[arg(allow_negative_numbers = true, requires = "latitude")]
    pub longitude: Option<f64>,

    /// Tap the map view at X Y (points from the top-left corner) instead
    #[arg(
        long,
        num_args = 2,
        value_names = ["X", "Y"],
        conflicts_with_all = ["latitude", "longitude"]
    )]
    pub screen: Option<Vec<f64>>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Where an alert should be placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertTarget {
    /// An explicit coordinate.
    Coordinate(Coordinate),
    /// A tap on the map view.
    Screen(ScreenPoint),
}

impl AlertCommand {
    /// The pin location requested on the command line.
    #[must_use]
    pub fn target(&self) -> Option<AlertTarget> {
        if let Some(screen) = &self.screen {
            return match screen.as_slice() {
                [x, y] => Some(AlertTarget::Screen(ScreenPoint::new(*x, *y))),
                _ => None,
            };
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(AlertTarget::Coordinate(Coordinate::new(
                latitude, longitude,
            ))),
            _ => None,
        }
    }
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Maximum number of reports to show
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Include reports with a zero latitude or longitude (no position fix)
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// IDs of the reports to delete
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<i64>,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Number of reports to print on each change
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// How often to check for reports written by other processes, in milliseconds
    #[arg(long, default_value = "500", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_ms: u64,
}

impl WatchCommand {
    /// Interval between checks for commits from other processes.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Profile commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the current profile
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Change one profile field
    Set {
        /// Field to change
        #[arg(value_enum)]
        field: ProfileFieldArg,

        /// New value
        value: String,
    },

    /// Log out and restore the default profile
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Profile field argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileFieldArg {
    /// First name
    FirstName,
    /// Last name
    LastName,
    /// Username
    Username,
    /// Email address
    Email,
}

impl From<ProfileFieldArg> for ProfileField {
    fn from(arg: ProfileFieldArg) -> Self {
        match arg {
            ProfileFieldArg::FirstName => Self::FirstName,
            ProfileFieldArg::LastName => Self::LastName,
            ProfileFieldArg::Username => Self::Username,
            ProfileFieldArg::Email => Self::Email,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_field_arg_conversion() {
        assert_eq!(
            ProfileField::from(ProfileFieldArg::FirstName),
            ProfileField::FirstName
        );
        assert_eq!(
            ProfileField::from(ProfileFieldArg::LastName),
            ProfileField::LastName
        );
        assert_eq!(
            ProfileField::from(ProfileFieldArg::Username),
            ProfileField::Username
        );
        assert_eq!(ProfileField::from(ProfileFieldArg::Email), ProfileField::Email);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_alert_target_coordinate() {
        let cmd = AlertCommand {
            latitude: Some(33.88),
            longitude: Some(-117.88),
            screen: None,
            json: false,
        };
        assert_eq!(
            cmd.target(),
            Some(AlertTarget::Coordinate(Coordinate::new(33.88, -117.88)))
        );
    }

    #[test]
    fn test_alert_target_screen() {
        let cmd = AlertCommand {
            latitude: None,
            longitude: None,
            screen: Some(vec![10.0, 20.0]),
            json: false,
        };
        assert_eq!(
            cmd.target(),
            Some(AlertTarget::Screen(ScreenPoint::new(10.0, 20.0)))
        );
    }

    #[test]
    fn test_alert_target_missing() {
        let cmd = AlertCommand {
            latitude: Some(33.88),
            longitude: None,
            screen: None,
            json: false,
        };
        assert!(cmd.target().is_none());
    }
}
