//! Gate types
//!
//! Host-side values passed into the checks.

use std::fmt;

/// Gated table-lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOperation {
    Create,
    Delete,
    Modify,
}

impl TableOperation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TableOperation::Create => "create",
            TableOperation::Delete => "delete",
            TableOperation::Modify => "modify",
        }
    }

    /// Progressive form used in audit lines
    pub const fn verb(&self) -> &'static str {
        match self {
            TableOperation::Create => "creating",
            TableOperation::Delete => "deleting",
            TableOperation::Modify => "modifying",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(TableOperation::Create),
            "delete" => Some(TableOperation::Delete),
            "modify" => Some(TableOperation::Modify),
            _ => None,
        }
    }
}

impl fmt::Display for TableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Table descriptor as handed over by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: Vec<u8>,
    meta: bool,
}

impl TableDescriptor {
    pub fn new(name: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            meta: false,
        }
    }

    /// Descriptor of the system metadata table
    pub fn meta(name: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            meta: true,
        }
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn is_meta_table(&self) -> bool {
        self.meta
    }
}

/// Initial region of a table being created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionInfo {
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
}

/// Printable table name; invalid UTF-8 is replaced
pub fn display_name(table: &[u8]) -> String {
    String::from_utf8_lossy(table).into_owned()
}
