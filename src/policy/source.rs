//! Policy resource discovery and parsing
//!
//! The policy resource is a TOML key/value file:
//!
//! ```toml
//! [admin]
//! users = ["alice", "bob"]        # or "alice, bob"
//!
//! [admin.white]
//! tables = ["archive_*", "finance"]
//! ```

use crate::config::GateConfig;
use crate::error::PolicyError;
use crate::policy::clock::duration_millis;
use crate::policy::snapshot::PolicySnapshot;
use config::{Config, File, FileFormat};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use url::Url;

/// Key holding the admin identity short names
pub const ADMIN_USERS_KEY: &str = "admin.users";

/// Key holding the protected-table patterns
pub const WHITE_TABLES_KEY: &str = "admin.white.tables";

/// Resolved resource and its last modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStat {
    /// Resolved location, kept as a path so non-UTF-8 names survive to `load`
    pub location: PathBuf,
    /// Milliseconds since the Unix epoch
    pub modified_ms: u64,
}

impl ResourceStat {
    pub fn new(location: impl Into<PathBuf>, modified_ms: u64) -> Self {
        Self {
            location: location.into(),
            modified_ms,
        }
    }

    /// Location for logs and error messages
    pub fn display_location(&self) -> String {
        self.location.display().to_string()
    }
}

/// External source of the policy resource
pub trait PolicySource: Send + Sync {
    /// Resolve the resource and fetch its modification time.
    ///
    /// Returns `Ok(None)` when no resource can be found.
    fn stat(&self) -> Result<Option<ResourceStat>, PolicyError>;

    /// Read and parse the resource previously returned by [`stat`](Self::stat)
    fn load(&self, stat: &ResourceStat) -> Result<PolicyDocument, PolicyError>;
}

impl<T: PolicySource + ?Sized> PolicySource for Arc<T> {
    fn stat(&self) -> Result<Option<ResourceStat>, PolicyError> {
        (**self).stat()
    }

    fn load(&self, stat: &ResourceStat) -> Result<PolicyDocument, PolicyError> {
        (**self).load(stat)
    }
}

/// Parsed key/value policy resource
#[derive(Debug)]
pub struct PolicyDocument {
    values: Config,
}

impl PolicyDocument {
    /// Parse a TOML policy document
    pub fn from_toml_str(content: &str, location: &str) -> Result<Self, PolicyError> {
        let values = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .map_err(|e| PolicyError::Parse {
                location: location.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { values })
    }

    /// Get a single string value
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get_string(key).ok()
    }

    /// Get a collection of strings.
    ///
    /// Accepts either an array or a comma-separated string. Entries are
    /// trimmed and empty entries dropped; a missing key yields an empty list.
    pub fn get_string_collection(&self, key: &str) -> Vec<String> {
        let raw: Vec<String> = match self.values.get_array(key) {
            Ok(values) => values
                .into_iter()
                .filter_map(|v| v.into_string().ok())
                .collect(),
            Err(_) => match self.values.get_string(key) {
                Ok(joined) => joined.split(',').map(str::to_string).collect(),
                Err(_) => Vec::new(),
            },
        };

        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Build the snapshot this document describes
    pub fn to_snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::new(
            self.get_string_collection(ADMIN_USERS_KEY),
            self.get_string_collection(WHITE_TABLES_KEY),
        )
    }
}

/// Where the policy resource is looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyLocation {
    /// Explicit `admin.file` path (or `file://` URL)
    Explicit(PathBuf),
    /// Default resource name searched in the given directories, first hit wins
    Search { name: String, dirs: Vec<PathBuf> },
}

impl PolicyLocation {
    /// Parse an explicit location given as a path or `file://` URL
    pub fn parse(location: &str) -> Result<Self, PolicyError> {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(PolicyLocation::Explicit)
                .map_err(|_| PolicyError::UnsupportedLocation(location.to_string())),
            // Single-letter schemes are Windows drive letters
            Ok(url) if url.scheme().len() > 1 => {
                Err(PolicyError::UnsupportedLocation(location.to_string()))
            }
            _ => Ok(PolicyLocation::Explicit(PathBuf::from(
                shellexpand::tilde(location).as_ref(),
            ))),
        }
    }

    /// Resolve to a concrete path, if one exists
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            PolicyLocation::Explicit(path) => Some(path.clone()),
            PolicyLocation::Search { name, dirs } => dirs
                .iter()
                .map(|dir| dir.join(name))
                .find(|candidate| candidate.is_file()),
        }
    }
}

/// Policy source backed by the local filesystem
#[derive(Debug, Clone)]
pub struct FilePolicySource {
    location: PolicyLocation,
}

impl FilePolicySource {
    pub fn new(location: PolicyLocation) -> Self {
        Self { location }
    }

    /// Build from gate configuration: `admin.file` if set, else the search path
    pub fn from_config(config: &GateConfig) -> Result<Self, PolicyError> {
        let location = match &config.admin.file {
            Some(file) => PolicyLocation::parse(file)?,
            None => PolicyLocation::Search {
                name: config.policy.default_resource.clone(),
                dirs: config
                    .policy
                    .search_paths
                    .iter()
                    .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
                    .collect(),
            },
        };

        Ok(Self::new(location))
    }

    pub fn location(&self) -> &PolicyLocation {
        &self.location
    }
}

impl PolicySource for FilePolicySource {
    fn stat(&self) -> Result<Option<ResourceStat>, PolicyError> {
        let Some(path) = self.location.resolve() else {
            return Ok(None);
        };

        let io_error = |source| PolicyError::Io {
            location: path.display().to_string(),
            source,
        };
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            // A missing explicit file behaves like an unresolved resource
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(source)),
        };

        let modified = metadata.modified().map_err(io_error)?;
        let modified_ms = modified
            .duration_since(UNIX_EPOCH)
            .map(duration_millis)
            .unwrap_or(0);

        Ok(Some(ResourceStat::new(path, modified_ms)))
    }

    fn load(&self, stat: &ResourceStat) -> Result<PolicyDocument, PolicyError> {
        let content =
            std::fs::read_to_string(&stat.location).map_err(|source| PolicyError::Io {
                location: stat.display_location(),
                source,
            })?;

        PolicyDocument::from_toml_str(&content, &stat.display_location())
    }
}
