//! CLI argument structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mirror tagged report sheets into a governed folder tree and confirm the
/// downstream index picked them up
#[derive(Parser)]
#[command(name = "tagsync")]
#[command(about = "tagsync - Extract, mask and index tagged report sheets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter for the verbosity level, unless `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and validate a project document
    #[command(name = "validate")]
    Validate {
        /// Project document (JSON)
        config: PathBuf,
    },

    /// Show the tasks a run would perform, in order
    #[command(name = "plan")]
    Plan {
        /// Project document (JSON)
        config: PathBuf,
    },

    /// Execute a run against the configured collaborators
    #[command(name = "run")]
    Run {
        /// Project document (JSON)
        config: PathBuf,

        /// Credentials document (JSON)
        #[arg(short = 'c', long)]
        credentials: PathBuf,

        /// Run settings (TOML); defaults to the user settings file if present
        #[arg(short = 's', long)]
        settings: Option<PathBuf>,

        /// Write the audit log as CSV
        #[arg(long, value_name = "FILE")]
        audit: Option<PathBuf>,

        /// Write the full run report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Print the index instructions for dashboards with an index profile
    #[command(name = "instructions")]
    Instructions {
        /// Project document (JSON)
        config: PathBuf,

        /// Only this dashboard
        #[arg(short = 'd', long)]
        dashboard: Option<String>,
    },

    /// Print the index overview for every dashboard
    #[command(name = "metadata")]
    Metadata {
        /// Project document (JSON)
        config: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
