use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};

impl KilnConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.entry.is_empty() {
            return Err(ConfigError::MissingField {
                field: "entry".to_string(),
                hint: "Provide at least one entry point".to_string(),
            }
            .into());
        }

        if self.entry.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "entry".to_string(),
                value: format!("{:?}", self.entry),
                hint: "Entry points cannot be empty strings".to_string(),
            }
            .into());
        }

        if self.target.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "target".to_string(),
                value: String::new(),
                hint: "Use an esbuild target such as 'es2021'".to_string(),
            }
            .into());
        }

        for (field, value) in [
            ("debounceMs", self.debounce_ms),
            ("clientQueue", self.client_queue as u64),
            ("sendTimeoutMs", self.send_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    hint: "Must be greater than zero".to_string(),
                }
                .into());
            }
        }

        if self.public_dir == self.dev_out_dir || self.public_dir == self.release_out_dir {
            return Err(ConfigError::InvalidValue {
                field: "publicDir".to_string(),
                value: self.public_dir.display().to_string(),
                hint: "The public directory must differ from the output directories".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
