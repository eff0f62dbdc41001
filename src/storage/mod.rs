pub mod jsonl;
pub mod sqlite;

pub use jsonl::JsonlStore;
pub use sqlite::SqliteStore;

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{AuditEntry, Catalog, ClassifiedRecord, RawRecord};

/// Persistence for the four curation logs and the rebuilt catalog.
///
/// Logs keep insertion order. A record id lives in at most one of queue, problems and deleted.
pub trait CurationStore {
    fn load_queue(&self) -> Result<Vec<RawRecord>>;
    fn append_queue(&self, records: &[RawRecord]) -> Result<()>;
    /// Replace the whole queue, e.g. with the remainder after a batch.
    fn replace_queue(&self, records: &[RawRecord]) -> Result<()>;

    fn load_problems(&self) -> Result<Vec<ClassifiedRecord>>;
    fn append_problems(&self, records: &[ClassifiedRecord]) -> Result<()>;

    fn load_deleted(&self) -> Result<Vec<ClassifiedRecord>>;
    fn append_deleted(&self, records: &[ClassifiedRecord]) -> Result<()>;

    fn load_audit(&self) -> Result<Vec<AuditEntry>>;
    fn append_audit(&self, entries: &[AuditEntry]) -> Result<()>;

    fn write_catalog(&self, catalog: &Catalog) -> Result<()>;
    fn load_catalog(&self) -> Result<Catalog>;

    /// Every id already present in any log.
    fn known_ids(&self) -> Result<HashSet<String>> {
        let mut ids: HashSet<String> = self.load_queue()?.into_iter().map(|r| r.id).collect();
        ids.extend(self.load_problems()?.into_iter().map(|r| r.record.id));
        ids.extend(self.load_deleted()?.into_iter().map(|r| r.record.id));
        ids.extend(self.load_audit()?.into_iter().map(|a| a.id));
        Ok(ids)
    }
}
