//! Host-facing intercept interface

use crate::error::GateResult;
use crate::gate::types::{RegionInfo, TableDescriptor};

/// Pre-operation hooks the host calls for table-lifecycle operations
///
/// `Ok(())` lets the operation proceed; an error aborts it and its message is
/// shown to the caller.
pub trait TableAccessObserver: Send + Sync {
    fn pre_create_table(&self, desc: &TableDescriptor, regions: &[RegionInfo]) -> GateResult<()>;

    fn pre_delete_table(&self, table_name: &[u8]) -> GateResult<()>;

    fn pre_modify_table(&self, table_name: &[u8], desc: &TableDescriptor) -> GateResult<()>;
}
