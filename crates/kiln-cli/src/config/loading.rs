use crate::config::KilnConfig;
use crate::error::{CliError, ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "kiln.config.json";

/// Fields that may be set through `KILN_*` environment variables.
const ENV_FIELDS: &[&str] = &[
    "entry",
    "publicDir",
    "stylesDir",
    "devOutDir",
    "releaseOutDir",
    "watchDir",
    "host",
    "port",
    "inject",
    "target",
    "debounceMs",
    "clientQueue",
    "sendTimeoutMs",
    "esbuild",
    "sass",
    "styles",
];

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<bool>,
}

impl KilnConfig {
    /// Load configuration from multiple sources and validate it.
    ///
    /// `config_path` must exist when given; otherwise `root/kiln.config.json`
    /// is used if present.
    pub fn load(root: &Path, config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        Self::figment(root, config_path, overrides)?
            .extract::<Self>()
            .map_err(figment_error)
            .and_then(|config| {
                config.validate()?;
                Ok(config)
            })
    }

    fn figment(root: &Path, config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) => {
                let path = Self::resolve(root, path);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let default_path = root.join(CONFIG_FILE_NAME);
                default_path.is_file().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "Loading config file");
            figment = figment.merge(Json::file(path));
        }

        // KILN_DEBOUNCE_MS -> debounceMs
        figment = figment.merge(
            Env::prefixed("KILN_")
                .filter_map(|key| env_field(key.as_str()).map(Into::into))
                .lowercase(false),
        );

        Ok(figment.merge(Serialized::defaults(overrides)))
    }
}

/// Resolve the project root from `--cwd`, defaulting to the current directory.
pub fn project_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let root = match cwd {
        Some(dir) => KilnConfig::resolve(&current, dir),
        None => return Ok(current),
    };

    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }
    Ok(root)
}

/// Map an environment key (prefix already stripped) onto a config field.
fn env_field(key: &str) -> Option<String> {
    let mut field = String::with_capacity(key.len());
    for (i, part) in key.split('_').filter(|p| !p.is_empty()).enumerate() {
        let part = part.to_ascii_lowercase();
        if i == 0 {
            field.push_str(&part);
        } else {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                field.push(first.to_ascii_uppercase());
                field.push_str(chars.as_str());
            }
        }
    }

    ENV_FIELDS.contains(&field.as_str()).then_some(field)
}

fn figment_error(e: figment::Error) -> CliError {
    let field = if e.path.is_empty() {
        "configuration".to_string()
    } else {
        e.path.join(".")
    };

    ConfigError::InvalidValue {
        field,
        value: e.kind.to_string(),
        hint: format!("Check {CONFIG_FILE_NAME} syntax, field names and types"),
    }
    .into()
}
