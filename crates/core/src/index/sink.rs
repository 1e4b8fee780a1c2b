use crate::stub::StubRegistry;
use stubdex_api::StubError;
use stubdex_api::models::{EntryPayload, IndexEntry, StubId, StubTree};
use stubdex_plugin::IndexSink;

/// Sink for one file's indexing pass. Entries are attributed to the stub
/// currently being visited.
#[derive(Debug)]
pub struct FileSink {
    entries: Vec<IndexEntry>,
    current: StubId,
}

impl FileSink {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            current: StubId::ROOT,
        }
    }

    pub(crate) fn set_owner(&mut self, owner: StubId) {
        self.current = owner;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<IndexEntry> {
        self.entries
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexSink for FileSink {
    fn put(&mut self, key: &str, payload: EntryPayload) {
        self.entries.push(IndexEntry {
            key: key.into(),
            payload,
            owner: self.current,
        });
    }
}

/// Runs every stub of `tree` through its type's indexer, in pre-order.
///
/// The first failing stub aborts the whole file's contribution.
pub fn collect_entries(
    tree: &StubTree,
    registry: &StubRegistry,
) -> Result<Vec<IndexEntry>, StubError> {
    let mut sink = FileSink::new();
    for node in tree.iter() {
        let ty = registry.type_of(node.kind())?;
        sink.set_owner(node.id());
        ty.index_stub(node, &mut sink)
            .map_err(|e| StubError::IndexContribution {
                external_id: ty.external_id().to_string(),
                reason: e.to_string(),
            })?;
    }
    Ok(sink.into_entries())
}
