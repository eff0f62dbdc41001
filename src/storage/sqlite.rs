use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::Result;
use crate::models::{AuditEntry, Catalog, ClassifiedRecord, Issue, RawRecord};
use crate::storage::CurationStore;

const PUBLISHED_TIER: &str = "published";
const CANDIDATE_TIER: &str = "candidate";

/// The curation logs as SQLite tables of JSON payloads, ordered by insertion.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_db()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS queue (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                payload TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS problems (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                payload TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS deleted (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                payload TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS audit (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                payload TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS catalog (
                tier TEXT NOT NULL,
                position INTEGER NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (tier, position)
            );
            "#,
        )?;

        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, payload FROM {} ORDER BY seq", table))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            match serde_json::from_str(&payload) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("Skipping corrupt {} row {}: {}", table, id, e),
            }
        }
        Ok(items)
    }

    fn append<T: Serialize>(&self, table: &str, items: &[(&str, &T)]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt =
                tx.prepare(&format!("INSERT OR IGNORE INTO {} (id, payload) VALUES (?1, ?2)", table))?;
            for &(id, item) in items {
                stmt.execute(params![id, serde_json::to_string(item)?])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_tier(&self, tier: &str) -> Result<Vec<Issue>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM catalog WHERE tier = ?1 ORDER BY position")?;
        let payloads = stmt
            .query_map(params![tier], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut issues = Vec::new();
        for (position, payload) in payloads.iter().enumerate() {
            match serde_json::from_str::<Issue>(payload) {
                Ok(issue) => issues.push(issue),
                Err(e) => tracing::warn!(
                    "Skipping corrupt {} catalog row {}: {}",
                    tier,
                    position,
                    e
                ),
            }
        }
        Ok(issues)
    }
}

fn keyed_records(records: &[RawRecord]) -> Vec<(&str, &RawRecord)> {
    records.iter().map(|r| (r.id.as_str(), r)).collect()
}

fn keyed_classified(records: &[ClassifiedRecord]) -> Vec<(&str, &ClassifiedRecord)> {
    records.iter().map(|r| (r.id(), r)).collect()
}

impl CurationStore for SqliteStore {
    fn load_queue(&self) -> Result<Vec<RawRecord>> {
        self.load("queue")
    }

    fn append_queue(&self, records: &[RawRecord]) -> Result<()> {
        self.append("queue", &keyed_records(records))
    }

    fn replace_queue(&self, records: &[RawRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM queue", [])?;
        {
            let mut stmt = tx.prepare("INSERT OR IGNORE INTO queue (id, payload) VALUES (?1, ?2)")?;
            for record in records {
                stmt.execute(params![record.id, serde_json::to_string(record)?])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_problems(&self) -> Result<Vec<ClassifiedRecord>> {
        self.load("problems")
    }

    fn append_problems(&self, records: &[ClassifiedRecord]) -> Result<()> {
        self.append("problems", &keyed_classified(records))
    }

    fn load_deleted(&self) -> Result<Vec<ClassifiedRecord>> {
        self.load("deleted")
    }

    fn append_deleted(&self, records: &[ClassifiedRecord]) -> Result<()> {
        self.append("deleted", &keyed_classified(records))
    }

    fn load_audit(&self) -> Result<Vec<AuditEntry>> {
        self.load("audit")
    }

    fn append_audit(&self, entries: &[AuditEntry]) -> Result<()> {
        let keyed: Vec<(&str, &AuditEntry)> = entries.iter().map(|e| (e.id.as_str(), e)).collect();
        self.append("audit", &keyed)
    }

    fn write_catalog(&self, catalog: &Catalog) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM catalog", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO catalog (tier, position, payload) VALUES (?1, ?2, ?3)")?;
            for (tier, issues) in [
                (PUBLISHED_TIER, &catalog.published),
                (CANDIDATE_TIER, &catalog.candidates),
            ] {
                for (position, issue) in issues.iter().enumerate() {
                    stmt.execute(params![tier, position as i64, serde_json::to_string(issue)?])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_catalog(&self) -> Result<Catalog> {
        Ok(Catalog {
            published: self.load_tier(PUBLISHED_TIER)?,
            candidates: self.load_tier(CANDIDATE_TIER)?,
        })
    }

    fn known_ids(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id FROM queue
            UNION SELECT id FROM problems
            UNION SELECT id FROM deleted
            UNION SELECT id FROM audit
            "#,
        )?;
        let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;
        ids.collect::<std::result::Result<HashSet<String>, _>>()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Label;
    use chrono::Utc;

    fn classified(id: &str) -> ClassifiedRecord {
        ClassifiedRecord {
            record: RawRecord::new(id, "invoices are late again", Utc::now()),
            label: Label::Problem,
            confidence: 0.6,
            reason: "complaint".to_string(),
            issue_title: "Invoices Late".to_string(),
            issue_key: "invoices-late".to_string(),
            roles: Vec::new(),
            classified_at: Utc::now(),
        }
    }

    #[test]
    fn test_queue_keeps_order_and_ignores_duplicates() {
        let store = SqliteStore::in_memory().unwrap();
        let records: Vec<RawRecord> = ["c2", "c1", "c3"]
            .iter()
            .map(|id| RawRecord::new(*id, "shipping labels misprint", Utc::now()))
            .collect();
        store.append_queue(&records).unwrap();
        store.append_queue(&records[..1]).unwrap();

        let ids: Vec<String> = store.load_queue().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c2", "c1", "c3"]);

        store.replace_queue(&records[2..]).unwrap();
        assert_eq!(store.load_queue().unwrap().len(), 1);
    }

    #[test]
    fn test_known_ids_span_all_logs() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .append_queue(&[RawRecord::new("q1", "text", Utc::now())])
            .unwrap();
        let problem = classified("p1");
        store.append_problems(std::slice::from_ref(&problem)).unwrap();
        store.append_deleted(&[classified("d1")]).unwrap();
        store.append_audit(&[AuditEntry::from(&problem)]).unwrap();

        let ids = store.known_ids().unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("q1") && ids.contains("p1") && ids.contains("d1"));
    }

    #[test]
    fn test_corrupt_payload_is_skipped() {
        let store = SqliteStore::in_memory().unwrap();
        store.append_problems(&[classified("p1")]).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO problems (id, payload) VALUES ('broken', '{oops')",
                [],
            )
            .unwrap();

        let problems = store.load_problems().unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].id(), "p1");
    }

    #[test]
    fn test_catalog_replaced_wholesale() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.load_catalog().unwrap().is_empty());
        store.write_catalog(&Catalog::default()).unwrap();
        assert_eq!(store.load_catalog().unwrap(), Catalog::default());
    }

    #[test]
    fn test_corrupt_catalog_row_is_skipped() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO catalog (tier, position, payload) VALUES ('published', 0, '{oops')",
                [],
            )
            .unwrap();

        let catalog = store.load_catalog().unwrap();
        assert!(catalog.published.is_empty());
        assert!(catalog.candidates.is_empty());
    }
}
