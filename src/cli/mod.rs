//! CLI handlers
//!
//! - `args`: clap argument structures
//! - `router`: dispatches a parsed command to its handler

pub mod args;
pub mod router;

pub use args::{Cli, Commands};
pub use router::{execute_command, CommandStatus};
