use stubdex_api::models::EntryPayload;

/// Write-only collector handed to `StubElementType::index_stub`.
///
/// A sink is scoped to one file's indexing pass and attributes every entry to
/// the stub currently being indexed. Duplicate keys accumulate.
pub trait IndexSink {
    fn put(&mut self, key: &str, payload: EntryPayload);
}

impl IndexSink for Vec<(String, EntryPayload)> {
    fn put(&mut self, key: &str, payload: EntryPayload) {
        self.push((key.to_string(), payload));
    }
}
