//! Admin-only table access gate
//!
//! Decision order for every operation:
//! 1. Exempt prefix (`temp_`, `test_` by default): allow, no reload, no audit
//! 2. Create only: system metadata table is allowed
//! 3. Conditional policy reload
//! 4. Delete only: protected tables are refused, even for admins
//! 5. Acting identity must be in the admin set

use crate::config::{GateConfig, IdentityResolution, RulesConfig};
use crate::error::{AccessDeniedError, GateResult, ProtectedTableError};
use crate::gate::observer::TableAccessObserver;
use crate::gate::types::{RegionInfo, TableDescriptor, TableOperation, display_name};
use crate::identity::{BoxedIdentityProvider, Identity, ProcessIdentityProvider};
use crate::policy::{PolicySnapshot, PolicyStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Authorization gate for table create/delete/modify
pub struct AccessGate {
    store: Arc<PolicyStore>,
    identities: BoxedIdentityProvider,
    rules: RulesConfig,
}

impl AccessGate {
    pub fn new(
        store: Arc<PolicyStore>,
        identities: BoxedIdentityProvider,
        rules: RulesConfig,
    ) -> Self {
        Self {
            store,
            identities,
            rules,
        }
    }

    /// Create a gate using the process environment for identities
    pub fn from_config(config: &GateConfig, store: Arc<PolicyStore>) -> Self {
        Self::new(
            store,
            Box::new(ProcessIdentityProvider::from_env()),
            config.gate.clone(),
        )
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Whether the table is a sandbox table anyone may manage
    pub fn is_exempt(&self, table_name: &[u8]) -> bool {
        self.rules
            .exempt_prefixes
            .iter()
            .any(|prefix| table_name.starts_with(prefix.as_bytes()))
    }

    fn is_metadata_table(&self, desc: &TableDescriptor) -> bool {
        desc.is_meta_table()
            || self
                .rules
                .metadata_tables
                .iter()
                .any(|name| name.as_bytes() == desc.name())
    }

    /// Check table creation
    pub fn check_create(&self, desc: &TableDescriptor, regions: &[RegionInfo]) -> GateResult<()> {
        if self.is_exempt(desc.name()) || self.is_metadata_table(desc) {
            return Ok(());
        }

        let snapshot = self.refreshed_snapshot();
        let table = display_name(desc.name());
        let identity = self.resolve_identity(TableOperation::Create);
        self.check_admin(&snapshot, identity.as_ref(), TableOperation::Create, &table)?;

        debug!(table = %table, regions = regions.len(), "Create permitted");
        Ok(())
    }

    /// Check table deletion
    pub fn check_delete(&self, table_name: &[u8]) -> GateResult<()> {
        if self.is_exempt(table_name) {
            return Ok(());
        }

        let snapshot = self.refreshed_snapshot();
        let table = display_name(table_name);
        self.check_protected(&snapshot, &table)?;

        let identity = self.resolve_identity(TableOperation::Delete);
        self.check_admin(&snapshot, identity.as_ref(), TableOperation::Delete, &table)
    }

    /// Check table schema modification
    pub fn check_modify(&self, table_name: &[u8], _desc: &TableDescriptor) -> GateResult<()> {
        if self.is_exempt(table_name) {
            return Ok(());
        }

        let snapshot = self.refreshed_snapshot();
        let table = display_name(table_name);
        let identity = self.resolve_identity(TableOperation::Modify);
        self.check_admin(&snapshot, identity.as_ref(), TableOperation::Modify, &table)
    }

    fn refreshed_snapshot(&self) -> Arc<PolicySnapshot> {
        self.store.maybe_reload();
        self.store.snapshot()
    }

    fn resolve_identity(&self, operation: TableOperation) -> Option<Identity> {
        match (self.rules.identity_resolution, operation) {
            (IdentityResolution::Legacy, TableOperation::Modify) => {
                self.identities.current_user()
            }
            _ => self.identities.active_user(),
        }
    }

    fn check_protected(&self, snapshot: &PolicySnapshot, table: &str) -> GateResult<()> {
        if let Some(pattern) = snapshot.protected_tables().find_match(table) {
            let err = ProtectedTableError::new(table, pattern, &self.rules.contact);
            warn!(table = %table, pattern = %pattern, "{}", err);
            return Err(err.into());
        }
        Ok(())
    }

    fn check_admin(
        &self,
        snapshot: &PolicySnapshot,
        identity: Option<&Identity>,
        operation: TableOperation,
        table: &str,
    ) -> GateResult<()> {
        match identity {
            Some(identity) if snapshot.is_admin(identity.short_name()) => {
                info!(
                    identity = %identity,
                    operation = %operation,
                    table = %table,
                    "Admin user {} is {} table {}",
                    identity,
                    operation.verb(),
                    table
                );
                Ok(())
            }
            _ => {
                let err = AccessDeniedError::new(
                    identity.map(Identity::short_name),
                    table,
                    &self.rules.exempt_prefixes,
                    &self.rules.contact,
                );
                warn!(
                    identity = %err.identity,
                    operation = %operation,
                    table = %table,
                    "{}",
                    err
                );
                Err(err.into())
            }
        }
    }
}

impl TableAccessObserver for AccessGate {
    fn pre_create_table(&self, desc: &TableDescriptor, regions: &[RegionInfo]) -> GateResult<()> {
        self.check_create(desc, regions)
    }

    fn pre_delete_table(&self, table_name: &[u8]) -> GateResult<()> {
        self.check_delete(table_name)
    }

    fn pre_modify_table(&self, table_name: &[u8], desc: &TableDescriptor) -> GateResult<()> {
        self.check_modify(table_name, desc)
    }
}
