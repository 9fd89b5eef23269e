//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the gooddata binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::ReportExportFormat;

/// GoodData API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "gooddata", about = "GoodData API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Give up waiting for asynchronous operations after this many seconds.
    ///
    /// Overrides `GOODDATA_POLL_TIMEOUT_SECS`, which the client reads itself.
    #[arg(long, global = true)]
    pub poll_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Export reports.
    #[command(subcommand)]
    Report(ReportCommand),

    /// Run data load schedules.
    #[command(subcommand)]
    Schedule(ScheduleCommand),
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Get a project by ID.
    Get {
        /// The project ID.
        id: String,
    },

    /// Create a project and wait until it is enabled.
    Create {
        /// Project title.
        #[arg(long)]
        title: String,

        /// Authorization token the project is billed to.
        #[arg(long)]
        token: String,

        /// Project summary.
        #[arg(long)]
        summary: Option<String>,

        /// Database driver.
        #[arg(long, default_value = "Pg")]
        driver: String,

        /// Project environment.
        #[arg(long, default_value = "PRODUCTION")]
        environment: String,
    },

    /// Delete a project.
    Remove {
        /// The project ID.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Execute a report and write the exported file.
    Export {
        /// URI of the report (or report definition with --definition).
        uri: String,

        /// Export format (pdf, xls, xlsx, png, csv, html).
        #[arg(long, default_value = "csv")]
        format: ReportExportFormat,

        /// Treat the URI as a report definition.
        #[arg(long)]
        definition: bool,

        /// Where to write the file.
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ScheduleCommand {
    /// Start a schedule execution and wait for it to finish.
    Execute {
        /// The schedule URI.
        uri: String,
    },
}
