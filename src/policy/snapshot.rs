//! Policy snapshot and protected-table matching
//!
//! A snapshot is built once per successful reload and never mutated
//! afterwards; the store swaps whole snapshots.

use serde::Serialize;
use std::collections::BTreeSet;

/// Trailing marker turning a protected-table entry into a prefix match
pub const WILDCARD: char = '*';

/// Admin set and protected-table patterns in effect at a given moment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicySnapshot {
    admin_identities: BTreeSet<String>,
    protected_tables: ProtectedTables,
}

impl PolicySnapshot {
    pub fn new<A, P>(admins: A, protected: P) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            admin_identities: admins.into_iter().map(Into::into).collect(),
            protected_tables: ProtectedTables::new(protected),
        }
    }

    /// Empty snapshot: no admins, nothing protected
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_admin(&self, short_name: &str) -> bool {
        self.admin_identities.contains(short_name)
    }

    pub fn admin_identities(&self) -> &BTreeSet<String> {
        &self.admin_identities
    }

    pub fn protected_tables(&self) -> &ProtectedTables {
        &self.protected_tables
    }
}

/// Ordered list of protected-table patterns
///
/// An entry matches a table name when it is equal to it, or when the entry
/// ends with [`WILDCARD`] and the table name starts with the entry minus the
/// marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProtectedTables {
    patterns: Vec<String>,
}

impl ProtectedTables {
    pub fn new<P>(patterns: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Check if a table name is protected
    pub fn matches(&self, table: &str) -> bool {
        self.find_match(table).is_some()
    }

    /// Return the first pattern protecting `table`, if any
    pub fn find_match(&self, table: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| pattern_matches(p, table))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }
}

fn pattern_matches(pattern: &str, table: &str) -> bool {
    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => table.starts_with(prefix),
        None => pattern == table,
    }
}
