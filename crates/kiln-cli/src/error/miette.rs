//! Miette report conversion for CLI errors.

use crate::config::{CONFIG_FILE_NAME, KilnConfig};
use crate::error::{BuildError, CliError, ConfigError};
use ::miette::{MietteDiagnostic, Report};

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e @ ConfigError::InvalidValue { .. }) => Report::new(
            MietteDiagnostic::new(format!("Configuration error: {e}")).with_help(format!(
                "A complete {CONFIG_FILE_NAME} with every default:\n{}",
                KilnConfig::example_config()
            )),
        ),
        CliError::Config(e) => ::miette::miette!("Configuration error: {}", e),
        CliError::Bundler(e) => bundler_error_to_miette(e),
        CliError::Watch(e) => Report::new(
            MietteDiagnostic::new(format!("File watcher error: {e}"))
                .with_help("Check that 'watchDir' exists and is readable"),
        ),
        _ => ::miette::miette!("{}", err),
    }
}

/// Convert BuildError to miette Report
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::InitialBuildFailed { count } => Report::new(
            MietteDiagnostic::new(format!("Initial build failed with {count} error(s)"))
                .with_help("Fix the errors above and run `kiln dev` again"),
        ),
        _ => ::miette::miette!("{}", err),
    }
}

/// Convert kiln-bundler Error to miette Report
pub fn bundler_error_to_miette(err: kiln_bundler::Error) -> Report {
    match &err {
        kiln_bundler::Error::Spawn { program, .. } => Report::new(
            MietteDiagnostic::new(err.to_string()).with_help(format!(
                "Install '{program}' or point kiln.config.json at it (\"esbuild\" / \"sass\")"
            )),
        ),
        _ => ::miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_spawn_error_has_help() {
        let err = kiln_bundler::Error::Spawn {
            program: "esbuild".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let report = bundler_error_to_miette(err);

        let help = report.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("esbuild"));
    }

    #[test]
    fn test_invalid_config_help_shows_example() {
        let err = CliError::Config(ConfigError::InvalidValue {
            field: "port".to_string(),
            value: "invalid type".to_string(),
            hint: "Check kiln.config.json".to_string(),
        });
        let report = cli_error_to_miette(err);

        let help = report.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("\"debounceMs\": 100"));
    }

    #[test]
    fn test_generic_error_keeps_message() {
        let report = cli_error_to_miette(CliError::FileNotFound(PathBuf::from("src")));
        assert_eq!(report.to_string(), "File not found: src");
    }
}
