//! Aggregate key index: per-file sink output, the snapshot readers see, and
//! its on-disk form.

pub mod sink;
pub mod snapshot;
pub mod storage;

pub use sink::{FileSink, collect_entries};
pub use snapshot::{FileRecord, IndexSnapshot, Posting};
pub use storage::{INDEX_FORMAT_VERSION, IndexStore, PersistedIndex, content_hash};
