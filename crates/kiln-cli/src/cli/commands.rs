use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// Available kiln subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the development server with live reload
    ///
    /// Builds once, then watches the source directory, rebuilds on change
    /// and tells every connected browser tab to reload or show the errors.
    Dev(DevArgs),

    /// Produce a minified release build
    ///
    /// Compiles styles, bundles with minification and copies index.html
    /// into the release directory.
    Build(BuildArgs),
}

/// Arguments for the dev command
#[derive(Args, Debug, Default)]
pub struct DevArgs {
    /// Port for the development server
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Interface to listen on
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Directory to watch for changes
    #[arg(short, long, value_name = "DIR")]
    pub watch: Option<PathBuf>,

    /// Quiet period in milliseconds before a rebuild starts
    #[arg(long, value_name = "MS")]
    pub debounce: Option<u64>,

    /// Do not start the sass watcher
    #[arg(long)]
    pub no_styles: bool,

    /// Path to the config file (defaults to ./kiln.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root; relative paths are resolved against it
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Open the browser once the server is up
    #[arg(long)]
    pub open: bool,
}

impl DevArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            watch_dir: self.watch.clone(),
            debounce_ms: self.debounce,
            styles: self.no_styles.then_some(false),
            ..ConfigOverrides::default()
        }
    }
}

/// Arguments for the build command
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Output directory (defaults to "dist")
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Skip the sass step
    #[arg(long)]
    pub no_styles: bool,

    /// Path to the config file (defaults to ./kiln.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root; relative paths are resolved against it
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

impl BuildArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            release_out_dir: self.out_dir.clone(),
            styles: self.no_styles.then_some(false),
            ..ConfigOverrides::default()
        }
    }
}
