use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stubdex_api::models::{FileIdentity, IndexEntry, IndexHit, IndexStats};

/// Everything the index knows about one committed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub identity: FileIdentity,
    /// Unix seconds of the file's mtime when it was indexed.
    pub last_modified: u64,
    /// Version of every stub kind present in the file's stub tree.
    pub stamps: BTreeMap<String, u32>,
    pub stub_count: usize,
    pub kind_counts: BTreeMap<String, usize>,
    pub entries: Vec<IndexEntry>,
    /// Set when the file's index contribution failed; `entries` is then empty.
    pub index_error: Option<String>,
}

impl FileRecord {
    pub fn path(&self) -> &Path {
        self.identity.path()
    }

    pub fn uses_kind(&self, external_id: &str) -> bool {
        self.stamps.contains_key(external_id)
    }
}

/// Location of one entry: the owning file and the entry's position in its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub path: PathBuf,
    pub entry: u32,
}

/// Immutable state of the aggregate index as seen by readers.
///
/// Files are kept in commit order and postings per key are appended as files
/// are merged, so lookups return hits in file commit order and then in stub
/// pre-order within a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSnapshot {
    files: IndexMap<PathBuf, FileRecord>,
    keys: IndexMap<SmolStr, Vec<Posting>>,
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn file(&self, path: &Path) -> Option<&FileRecord> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.files.values()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Removes a file and every entry it contributed.
    pub fn retract(&mut self, path: &Path) -> Option<FileRecord> {
        let record = self.files.shift_remove(path)?;
        for entry in &record.entries {
            if let Some(postings) = self.keys.get_mut(&entry.key) {
                postings.retain(|p| p.path != path);
                if postings.is_empty() {
                    self.keys.shift_remove(&entry.key);
                }
            }
        }
        Some(record)
    }

    /// Replaces the file's previous record, if any, with `record`.
    pub fn merge(&mut self, record: FileRecord) {
        let path = record.path().to_path_buf();
        self.retract(&path);
        for (i, entry) in record.entries.iter().enumerate() {
            self.keys.entry(entry.key.clone()).or_default().push(Posting {
                path: path.clone(),
                entry: i as u32,
            });
        }
        self.files.insert(path, record);
    }

    pub fn lookup(&self, key: &str) -> Vec<IndexHit> {
        let Some(postings) = self.keys.get(key) else {
            return Vec::new();
        };
        postings
            .iter()
            .filter_map(|p| {
                let record = self.files.get(&p.path)?;
                let entry = record.entries.get(p.entry as usize)?;
                Some(IndexHit {
                    file: record.identity.clone(),
                    payload: entry.payload.clone(),
                    owner: entry.owner,
                })
            })
            .collect()
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .keys
            .keys()
            .filter(|k| k.starts_with(prefix))
            .map(|k| k.to_string())
            .collect();
        keys.sort();
        keys
    }

    /// Files whose stubs include any of `external_ids`.
    pub fn files_using(&self, external_ids: &[String]) -> Vec<PathBuf> {
        self.files
            .values()
            .filter(|r| external_ids.iter().any(|k| r.uses_kind(k)))
            .map(|r| r.path().to_path_buf())
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            file_count: self.files.len(),
            key_count: self.keys.len(),
            ..IndexStats::default()
        };
        for record in self.files.values() {
            stats.stub_count += record.stub_count;
            stats.entry_count += record.entries.len();
            if record.index_error.is_some() {
                stats.failed_files += 1;
            }
            for (kind, count) in &record.kind_counts {
                *stats.stubs_per_kind.entry(kind.clone()).or_default() += count;
            }
        }
        stats
    }
}
