//! Configuration for kiln with multi-source loading.
//!
//! Merges settings from defaults, `kiln.config.json`, `KILN_*` environment
//! variables and command-line flags.
//! Priority: CLI > Environment > File > Defaults

mod defaults;
mod loading;
mod validation;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use defaults::*;
pub use loading::{CONFIG_FILE_NAME, ConfigOverrides, project_root};

/// Project configuration, loaded from kiln.config.json or defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KilnConfig {
    /// Entry points to bundle (e.g., ["src/app.tsx"])
    #[serde(default = "default_entry")]
    pub entry: Vec<String>,

    /// Directory holding index.html
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Style sheets compiled by sass
    #[serde(default = "default_styles_dir")]
    pub styles_dir: PathBuf,

    /// Output directory for `kiln dev`, also the static root
    #[serde(default = "default_dev_out_dir")]
    pub dev_out_dir: PathBuf,

    /// Output directory for `kiln build`
    #[serde(default = "default_release_out_dir")]
    pub release_out_dir: PathBuf,

    /// Directory watched for source changes
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,

    /// Interface the dev server listens on
    #[serde(default = "default_host")]
    pub host: String,

    /// Dev server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Modules injected into every entry (esbuild --inject)
    #[serde(default = "default_inject")]
    pub inject: Vec<String>,

    /// JavaScript target
    #[serde(default = "default_target")]
    pub target: String,

    /// Quiet window after the last file change before rebuilding
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Outbound messages buffered per browser tab
    #[serde(default = "default_client_queue")]
    pub client_queue: usize,

    /// Upper bound on one WebSocket send
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// esbuild executable
    #[serde(default = "default_esbuild")]
    pub esbuild: PathBuf,

    /// sass executable
    #[serde(default = "default_sass")]
    pub sass: PathBuf,

    /// Run the style compiler
    #[serde(default = "default_styles")]
    pub styles: bool,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            public_dir: default_public_dir(),
            styles_dir: default_styles_dir(),
            dev_out_dir: default_dev_out_dir(),
            release_out_dir: default_release_out_dir(),
            watch_dir: default_watch_dir(),
            host: default_host(),
            port: default_port(),
            inject: default_inject(),
            target: default_target(),
            debounce_ms: default_debounce_ms(),
            client_queue: default_client_queue(),
            send_timeout_ms: default_send_timeout_ms(),
            esbuild: default_esbuild(),
            sass: default_sass(),
            styles: default_styles(),
        }
    }
}

impl KilnConfig {
    /// Resolve a configured path against the project root.
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    /// Generate example kiln.config.json content.
    pub fn example_config() -> String {
        serde_json::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}
