//! Configuration types for table-gate
//!
//! This module defines the gate configuration that can be loaded from
//! TOML files and/or environment variables. The policy resource itself
//! (admin users, protected tables) is a separate file, see [`crate::policy`].

use serde::Deserialize;

/// Default policy resource name looked up on the search path
pub const DEFAULT_POLICY_RESOURCE: &str = "table-admin.toml";

/// Minimum age of a policy modification before it is trusted
pub const DEFAULT_QUIESCENCE_MS: u64 = 60_000;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Policy file override (`admin.file`)
    pub admin: AdminConfig,

    /// Policy resource discovery and reload timing
    pub policy: PolicyConfig,

    /// Decision rules
    pub gate: RulesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// `[admin]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Explicit policy file path or `file://` URL
    pub file: Option<String>,
}

/// `[policy]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Resource name resolved against `search_paths` when `admin.file` is unset
    pub default_resource: String,

    /// Directories searched in order for `default_resource`
    pub search_paths: Vec<String>,

    /// Milliseconds a modification must age before a reload trusts it
    pub quiescence_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_resource: DEFAULT_POLICY_RESOURCE.to_string(),
            search_paths: vec![
                ".".to_string(),
                "~/.config/table-gate".to_string(),
                "/etc/table-gate".to_string(),
            ],
            quiescence_ms: DEFAULT_QUIESCENCE_MS,
        }
    }
}

/// `[gate]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Table name prefixes anyone may create, delete or modify
    pub exempt_prefixes: Vec<String>,

    /// Administrator contact shown in denial messages
    pub contact: String,

    /// Table names treated as the system metadata table on create
    pub metadata_tables: Vec<String>,

    /// How the acting identity is resolved for modify
    pub identity_resolution: IdentityResolution,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            exempt_prefixes: vec!["temp_".to_string(), "test_".to_string()],
            contact: "the cluster administrator".to_string(),
            metadata_tables: vec!["hbase:meta".to_string(), ".META.".to_string()],
            identity_resolution: IdentityResolution::Unified,
        }
    }
}

/// Identity resolution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityResolution {
    /// Request principal first, then process identity, for every operation
    #[default]
    Unified,
    /// Modify checks only the process identity (older deployments)
    Legacy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
