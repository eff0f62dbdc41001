use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::models::{AuditEntry, Catalog, ClassifiedRecord, Issue, RawRecord};
use crate::storage::CurationStore;

const QUEUE_FILE: &str = "queue.jsonl";
const PROBLEMS_FILE: &str = "problems.jsonl";
const DELETED_FILE: &str = "deleted.jsonl";
const AUDIT_FILE: &str = "audit.jsonl";
const PUBLISHED_FILE: &str = "issues.json";
const CANDIDATES_FILE: &str = "issues-candidates.json";

/// Line-delimited JSON logs in a data directory; catalog files in a separate directory.
pub struct JsonlStore {
    data_dir: PathBuf,
    catalog_dir: PathBuf,
}

impl JsonlStore {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(data_dir: P, catalog_dir: Q) -> Result<Self> {
        let store = Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            catalog_dir: catalog_dir.as_ref().to_path_buf(),
        };
        fs::create_dir_all(&store.data_dir)?;
        fs::create_dir_all(&store.catalog_dir)?;
        Ok(store)
    }

    pub fn published_path(&self) -> PathBuf {
        self.catalog_dir.join(PUBLISHED_FILE)
    }

    pub fn candidates_path(&self) -> PathBuf {
        self.catalog_dir.join(CANDIDATES_FILE)
    }

    fn log_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();
    let mut line = Vec::new();
    let mut line_no = 0usize;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_no += 1;
        if line.trim_ascii().is_empty() {
            continue;
        }
        // bytes, not str: an invalid UTF-8 line is one corrupt record, not a failed load
        match serde_json::from_slice(&line) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!(
                "Skipping corrupt line {} in {}: {}",
                line_no,
                path.display(),
                e
            ),
        }
    }
    Ok(items)
}

/// True when a non-empty file does not end in a newline, i.e. a previous append was cut short.
fn has_torn_tail(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn append_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    let torn = has_torn_tail(&mut file)?;

    let mut writer = BufWriter::new(file);
    if torn {
        tracing::warn!("Terminating partial last line in {}", path.display());
        writer.write_all(b"\n")?;
    }
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write to a sibling temp file, then rename over `path`.
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let mut buffer = Vec::new();
    for item in items {
        serde_json::to_writer(&mut buffer, item)?;
        buffer.push(b'\n');
    }
    replace_file(path, &buffer)
}

fn read_issues(path: &Path) -> Result<Vec<Issue>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

impl CurationStore for JsonlStore {
    fn load_queue(&self) -> Result<Vec<RawRecord>> {
        read_jsonl(&self.log_path(QUEUE_FILE))
    }

    fn append_queue(&self, records: &[RawRecord]) -> Result<()> {
        append_jsonl(&self.log_path(QUEUE_FILE), records)
    }

    fn replace_queue(&self, records: &[RawRecord]) -> Result<()> {
        write_jsonl(&self.log_path(QUEUE_FILE), records)
    }

    fn load_problems(&self) -> Result<Vec<ClassifiedRecord>> {
        read_jsonl(&self.log_path(PROBLEMS_FILE))
    }

    fn append_problems(&self, records: &[ClassifiedRecord]) -> Result<()> {
        append_jsonl(&self.log_path(PROBLEMS_FILE), records)
    }

    fn load_deleted(&self) -> Result<Vec<ClassifiedRecord>> {
        read_jsonl(&self.log_path(DELETED_FILE))
    }

    fn append_deleted(&self, records: &[ClassifiedRecord]) -> Result<()> {
        append_jsonl(&self.log_path(DELETED_FILE), records)
    }

    fn load_audit(&self) -> Result<Vec<AuditEntry>> {
        read_jsonl(&self.log_path(AUDIT_FILE))
    }

    fn append_audit(&self, entries: &[AuditEntry]) -> Result<()> {
        append_jsonl(&self.log_path(AUDIT_FILE), entries)
    }

    fn write_catalog(&self, catalog: &Catalog) -> Result<()> {
        replace_file(
            &self.published_path(),
            &serde_json::to_vec_pretty(&catalog.published)?,
        )?;
        replace_file(
            &self.candidates_path(),
            &serde_json::to_vec_pretty(&catalog.candidates)?,
        )?;
        Ok(())
    }

    fn load_catalog(&self) -> Result<Catalog> {
        Ok(Catalog {
            published: read_issues(&self.published_path())?,
            candidates: read_issues(&self.candidates_path())?,
        })
    }
}
