//! Kiln CLI - live-reload development loop for web front ends.
//!
//! `kiln dev` bundles the front end with esbuild, runs sass in watch mode,
//! rebuilds whenever the source tree changes, and tells every open browser
//! tab to reload (or to show the build errors). `kiln build` produces a
//! minified release.
//!
//! # Architecture
//!
//! - [`dev`] - the live-reload core: watcher, rebuild trigger, client hub and server
//! - [`commands`] - `dev` and `build` command implementations
//! - [`config`] - layered configuration (defaults, file, environment, flags)
//! - [`error`] - error types with actionable messages
//! - [`logger`] - structured logging with tracing
//! - [`ui`] - terminal status lines and spinners
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::dev::{Hub, ReloadMessage};
//!
//! # async fn run() -> kiln_cli::Result<()> {
//! let (hub, _task) = Hub::spawn();
//! let report = hub.broadcast(ReloadMessage::Reload).await?;
//! println!("reloaded {} tab(s)", report.delivered);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

// Re-export commonly used types
pub use error::{BuildError, CliError, ConfigError, Result, ResultExt};
