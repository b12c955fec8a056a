//! Build options passed to the external bundler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Source map generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    /// Separate `.map` file referenced by a `//# sourceMappingURL` comment
    Linked,
    /// Source map embedded in the bundle
    Inline,
    /// Separate `.map` file without a reference comment
    External,
}

impl SourceMapMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceMapMode::Linked => "linked",
            SourceMapMode::Inline => "inline",
            SourceMapMode::External => "external",
        }
    }
}

/// Target platform environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Browser,
    Node,
    Neutral,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Browser => "browser",
            Platform::Node => "node",
            Platform::Neutral => "neutral",
        }
    }
}

/// Options for a bundler run.
///
/// Use [`BuildOptions::development`] or [`BuildOptions::release`] for the
/// two presets the CLI needs, then adjust with the builder-style setters.
///
/// # Example
///
/// ```
/// use kiln_bundler::{BuildOptions, Platform};
///
/// let options = BuildOptions::development(["src/app.tsx"], "build/js")
///     .inject("./node_modules/react/index.js")
///     .platform(Platform::Browser)
///     .target("es2021");
///
/// assert!(options.bundle);
/// assert!(!options.minify);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Entry points to bundle
    pub entry_points: Vec<String>,
    /// Output directory for bundles
    pub out_dir: PathBuf,
    /// Output naming pattern, relative to `out_dir`
    pub entry_names: String,
    /// Modules injected into every entry point
    pub inject: Vec<String>,
    /// Source map mode, `None` disables source maps
    pub sourcemap: Option<SourceMapMode>,
    /// Global constant replacements (identifier -> JS expression)
    pub define: BTreeMap<String, String>,
    /// Target platform
    pub platform: Platform,
    /// JavaScript language target (e.g. `es2021`)
    pub target: String,
    /// Inline imported dependencies into the bundle
    pub bundle: bool,
    /// Minify whitespace, identifiers and syntax
    pub minify: bool,
    /// Where to write the build metafile; enables artifact reporting
    pub metafile: Option<PathBuf>,
    /// Working directory for the bundler process
    pub cwd: Option<PathBuf>,
    /// Bundler executable
    pub esbuild: PathBuf,
}

impl BuildOptions {
    /// Bare options with bundling on and every optional feature off.
    pub fn new<I, S>(entry_points: I, out_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entry_points: entry_points.into_iter().map(Into::into).collect(),
            out_dir: out_dir.into(),
            entry_names: "[dir]/[name]".to_string(),
            inject: Vec::new(),
            sourcemap: None,
            define: BTreeMap::new(),
            platform: Platform::Browser,
            target: "es2021".to_string(),
            bundle: true,
            minify: false,
            metafile: None,
            cwd: None,
            esbuild: PathBuf::from("esbuild"),
        }
    }

    /// Development preset: linked source maps, `NODE_ENV=development`, and a
    /// metafile next to the output directory so rebuilt artifacts can be listed.
    pub fn development<I, S>(entry_points: I, out_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let out_dir = out_dir.into();
        let metafile = out_dir.with_file_name(".kiln-meta.json");
        Self::new(entry_points, out_dir)
            .sourcemap(SourceMapMode::Linked)
            .define("process.env.NODE_ENV", "\"development\"")
            .metafile(metafile)
    }

    /// Release preset: minified output and `NODE_ENV=production`.
    pub fn release<I, S>(entry_points: I, out_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(entry_points, out_dir)
            .define("process.env.NODE_ENV", "\"production\"")
            .minify(true)
    }

    pub fn entry_names(mut self, pattern: impl Into<String>) -> Self {
        self.entry_names = pattern.into();
        self
    }

    pub fn inject(mut self, module: impl Into<String>) -> Self {
        self.inject.push(module.into());
        self
    }

    pub fn sourcemap(mut self, mode: SourceMapMode) -> Self {
        self.sourcemap = Some(mode);
        self
    }

    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.define.insert(key.into(), value.into());
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn bundle(mut self, bundle: bool) -> Self {
        self.bundle = bundle;
        self
    }

    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn metafile(mut self, path: impl Into<PathBuf>) -> Self {
        self.metafile = Some(path.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn esbuild(mut self, program: impl Into<PathBuf>) -> Self {
        self.esbuild = program.into();
        self
    }
}
