//! Command-line interface definition.
//!
//! - `kiln dev` - development server with live reload
//! - `kiln build` - one-shot release build

mod commands;

use clap::Parser;

pub use commands::{BuildArgs, Command, DevArgs};

/// Kiln - live-reload development loop for web front ends
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Live-reload development loop for web front ends",
    long_about = "Kiln bundles your front end with esbuild, compiles styles with sass,\n\
                  and pushes a reload to every open browser tab after each rebuild."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
