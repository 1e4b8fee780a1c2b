use super::file::FileIdentity;
use super::stub::StubId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Minimal data a search consumer needs about a hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPayload {
    /// External id of the stub kind that contributed the entry.
    pub kind: SmolStr,
    pub flags: u32,
    pub detail: Option<String>,
}

impl EntryPayload {
    pub fn new(kind: impl Into<SmolStr>) -> Self {
        Self {
            kind: kind.into(),
            flags: 0,
            detail: None,
        }
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A key -> payload fact extracted from one stub node during a sink pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: SmolStr,
    pub payload: EntryPayload,
    pub owner: StubId,
}

/// Result of a key lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHit {
    pub file: FileIdentity,
    pub payload: EntryPayload,
    /// Stub node inside the file's stub tree, used for drill-down.
    pub owner: StubId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub file_count: usize,
    pub stub_count: usize,
    pub entry_count: usize,
    pub key_count: usize,
    /// Stub count per external id.
    pub stubs_per_kind: BTreeMap<String, usize>,
    /// Files whose index contribution failed.
    pub failed_files: usize,
}
