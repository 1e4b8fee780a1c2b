use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable identity of an indexed file: its path plus a content version stamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub content_hash: u64,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>, content_hash: u64) -> Self {
        Self {
            path: path.into(),
            content_hash,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:016x}", self.path.display(), self.content_hash)
    }
}
