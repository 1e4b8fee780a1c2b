use super::snapshot::IndexSnapshot;
use crate::error::{Result, StubdexError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stubdex_api::StubError;
use xxhash_rust::xxh3::xxh3_64;

/// Bumped whenever the layout of [`PersistedIndex`] changes.
pub const INDEX_FORMAT_VERSION: u32 = 1;

const INDEX_FILE: &str = "index.bin";
const STUB_DIR: &str = "stubs";
const COMPRESSED: u8 = b'Z';
const PLAIN: u8 = b'M';

/// Content version stamp of a file: xxh3 of its bytes. Every
/// [`FileIdentity`](stubdex_api::models::FileIdentity) the manager compares
/// against disk is expected to carry this hash.
pub fn content_hash(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// On-disk form of the key index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedIndex {
    pub version: u32,
    /// Registry version of every kind when the index was saved.
    pub kind_stamps: BTreeMap<String, u32>,
    pub snapshot: IndexSnapshot,
}

/// The two artifacts of one corpus: a stub-byte store keyed by file path and
/// the key index file.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn stub_path(&self, file: &Path) -> PathBuf {
        let hash = xxh3_64(file.to_string_lossy().as_bytes());
        self.dir.join(STUB_DIR).join(format!("{:016x}.stub", hash))
    }

    /// Persists a file's stub stream, prefixed with the content hash it was
    /// built from.
    pub fn write_stub(&self, file: &Path, content_hash: u64, bytes: &[u8]) -> Result<()> {
        let mut data = Vec::with_capacity(bytes.len() + 8);
        data.extend_from_slice(&content_hash.to_le_bytes());
        data.extend_from_slice(bytes);
        write_atomic(&self.stub_path(file), &data)
    }

    /// Reads back a stub stream. A hash that differs from `content_hash`
    /// means the bytes belong to another version of the file.
    pub fn read_stub(&self, file: &Path, content_hash: u64) -> Result<Vec<u8>> {
        let path = self.stub_path(file);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StubdexError::Storage(format!(
                    "no persisted stub for {}",
                    file.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if data.len() < 8 {
            return Err(StubError::format("stub file shorter than its header").into());
        }
        let (head, body) = data.split_at(8);
        let mut stamp = [0u8; 8];
        stamp.copy_from_slice(head);
        if u64::from_le_bytes(stamp) != content_hash {
            return Err(StubError::format(format!(
                "stub of {} was built from other content",
                file.display()
            ))
            .into());
        }
        Ok(body.to_vec())
    }

    pub fn remove_stub(&self, file: &Path) -> Result<()> {
        match std::fs::remove_file(self.stub_path(file)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drops every persisted stub, keeping the key index file.
    pub fn clear_stubs(&self) -> Result<()> {
        match std::fs::remove_dir_all(self.dir.join(STUB_DIR)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_index(&self, index: &PersistedIndex, compress: bool) -> Result<()> {
        let bytes = rmp_serde::to_vec(index)
            .map_err(|e| StubdexError::Storage(format!("MSGPACK error: {}", e)))?;

        let mut data = Vec::with_capacity(bytes.len() + 1);
        if compress {
            data.push(COMPRESSED);
            let compressed = zstd::encode_all(&bytes[..], 0)
                .map_err(|e| StubdexError::Storage(format!("Zstd compression failed: {}", e)))?;
            data.extend_from_slice(&compressed);
        } else {
            data.push(PLAIN);
            data.extend_from_slice(&bytes);
        }

        let path = self.index_path();
        write_atomic(&path, &data)?;
        tracing::info!("Saved index to {}", path.display());
        Ok(())
    }

    /// Loads the key index. A missing file is `None`; a corrupt or outdated
    /// one is removed and also reported as `None` so the caller rebuilds.
    pub fn load_index(&self) -> Result<Option<PersistedIndex>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(&path)?;

        match decode_index(&data) {
            Ok(index) if index.version == INDEX_FORMAT_VERSION => {
                tracing::info!("Loaded index from {}", path.display());
                Ok(Some(index))
            }
            Ok(index) => {
                tracing::warn!(
                    "Index version mismatch at {} (found {}, expected {}). Will rebuild.",
                    path.display(),
                    index.version,
                    INDEX_FORMAT_VERSION
                );
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse index at {}: {}. Will rebuild.",
                    path.display(),
                    e
                );
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    /// Deletes both artifacts.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

fn decode_index(data: &[u8]) -> Result<PersistedIndex> {
    let (flag, body) = data
        .split_first()
        .ok_or_else(|| StubdexError::Storage("empty index file".to_string()))?;
    let bytes = match *flag {
        COMPRESSED => zstd::decode_all(body)
            .map_err(|e| StubdexError::Storage(format!("Zstd decompression failed: {}", e)))?,
        PLAIN => body.to_vec(),
        other => {
            return Err(StubdexError::Storage(format!(
                "unknown index encoding {:#04x}",
                other
            )));
        }
    };
    rmp_serde::from_slice(&bytes).map_err(|e| StubdexError::Storage(format!("MSGPACK error: {}", e)))
}

/// Write to a temp file, then rename over the target.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, data)?;
    std::fs::rename(temp_path, path)?;
    Ok(())
}
