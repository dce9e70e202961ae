//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (TABLE_GATE_*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::GateConfig;
use crate::error::ConfigError;
use crate::policy::PolicyLocation;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "table-gate.toml",
    ".table-gate.toml",
    "~/.config/table-gate/config.toml",
    "/etc/table-gate/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<GateConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let gate_config: GateConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&gate_config)?;

    Ok(gate_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<GateConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g. TABLE_GATE_ADMIN__FILE, TABLE_GATE_POLICY__QUIESCENCE_MS
    builder = builder.add_source(
        Environment::with_prefix("TABLE_GATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let gate_config: GateConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&gate_config)?;

    Ok(gate_config)
}

/// Validate configuration values
fn validate_config(config: &GateConfig) -> Result<(), ConfigError> {
    if let Some(file) = &config.admin.file {
        if file.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "admin.file must not be empty when set".to_string(),
            });
        }
        PolicyLocation::parse(file)?;
    }

    if config.policy.default_resource.trim().is_empty() {
        return Err(ConfigError::Invalid {
            message: "policy.default_resource must not be empty".to_string(),
        });
    }

    if let Some(prefix) = config.gate.exempt_prefixes.iter().find(|p| p.is_empty()) {
        // An empty prefix would exempt every table
        return Err(ConfigError::Invalid {
            message: format!("gate.exempt_prefixes contains an empty entry: {:?}", prefix),
        });
    }

    Ok(())
}
