//! Development server configuration.
//!
//! Resolves a [`KilnConfig`] against the project root into the absolute
//! paths, socket address and timings the dev loop needs.

use crate::cli::DevArgs;
use crate::config::{KilnConfig, project_root};
use crate::error::{ConfigError, Result};
use kiln_bundler::{BuildOptions, StyleCompiler};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Development server configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Project root; every path below is absolute
    pub root: PathBuf,
    pub entry: Vec<String>,
    pub inject: Vec<String>,
    pub target: String,
    pub esbuild: PathBuf,
    pub sass: PathBuf,
    pub public_dir: PathBuf,
    pub styles_dir: PathBuf,
    /// Build output and static root
    pub out_dir: PathBuf,
    pub watch_dir: PathBuf,
    pub addr: SocketAddr,
    pub debounce: Duration,
    pub client_queue: usize,
    pub send_timeout: Duration,
    pub styles: bool,
    pub open: bool,
}

impl DevConfig {
    /// Load configuration for `kiln dev`.
    pub fn from_args(args: &DevArgs) -> Result<Self> {
        let root = project_root(args.cwd.as_deref())?;
        let config = KilnConfig::load(&root, args.config.as_deref(), &args.overrides())?;
        Self::from_config(config, root, args.open)
    }

    pub fn from_config(config: KilnConfig, root: PathBuf, open: bool) -> Result<Self> {
        let addr = resolve_addr(&config.host, config.port)?;
        let resolve = |path: &PathBuf| normalize(&KilnConfig::resolve(&root, path));

        let out_dir = resolve(&config.dev_out_dir);
        let watch_dir = resolve(&config.watch_dir);
        // Writing into the watched tree would retrigger the build forever.
        if out_dir.starts_with(&watch_dir) {
            return Err(ConfigError::InvalidValue {
                field: "watchDir".to_string(),
                value: config.watch_dir.display().to_string(),
                hint: format!(
                    "The watched directory must not contain the output directory '{}'",
                    config.dev_out_dir.display()
                ),
            }
            .into());
        }

        Ok(Self {
            public_dir: resolve(&config.public_dir),
            styles_dir: resolve(&config.styles_dir),
            out_dir,
            watch_dir,
            addr,
            debounce: Duration::from_millis(config.debounce_ms),
            client_queue: config.client_queue,
            send_timeout: Duration::from_millis(config.send_timeout_ms),
            styles: config.styles,
            open,
            entry: config.entry,
            inject: config.inject,
            target: config.target,
            esbuild: config.esbuild,
            sass: config.sass,
            root,
        })
    }

    /// Bundler options for development builds into `<out_dir>/js`.
    pub fn build_options(&self) -> BuildOptions {
        let mut options = BuildOptions::development(&self.entry, self.out_dir.join("js"))
            .target(&self.target)
            .cwd(&self.root)
            .esbuild(&self.esbuild);
        for module in &self.inject {
            options = options.inject(module);
        }
        options
    }

    /// `sass --watch` from the styles directory into `<out_dir>/css`.
    pub fn style_compiler(&self) -> StyleCompiler {
        StyleCompiler::new(&self.styles_dir, self.out_dir.join("css"))
            .program(&self.sass)
            .cwd(&self.root)
    }

    /// URL printed to the terminal and opened with `--open`.
    pub fn server_url(&self) -> String {
        server_url(self.addr)
    }
}

/// Lexically drop `.` and fold `..` so `starts_with` compares real nesting.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn server_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}", addr.port())
    } else {
        format!("http://{}", addr)
    }
}

fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "host".to_string(),
                value: host.to_string(),
                hint: "Use an IP address or 'localhost'".to_string(),
            }
            .into()
        })
}
