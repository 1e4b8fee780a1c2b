use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_INDEX_DIR: &str = ".stubdex/indices";
pub const INDEX_DIR_ENV: &str = "STUBDEX_INDEX_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Base directory holding one sub-directory per indexed corpus.
    pub index_dir: PathBuf,
    /// Files per commit batch.
    pub batch_size: usize,
    /// Compress the persisted key index with zstd.
    pub compress: bool,
    pub watch_debounce_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: Self::base_index_dir(),
            batch_size: 256,
            compress: true,
            watch_debounce_ms: 500,
        }
    }
}

impl IndexConfig {
    /// Read a JSON config file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: IndexConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = dir.into();
        self
    }

    /// Gets the base directory for storing indices, supporting STUBDEX_INDEX_DIR env var.
    pub fn base_index_dir() -> PathBuf {
        if let Ok(env_dir) = std::env::var(INDEX_DIR_ENV) {
            return PathBuf::from(env_dir);
        }
        Self::home_dir().join(DEFAULT_INDEX_DIR)
    }

    pub fn home_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Index directory of one corpus root.
    pub fn corpus_dir(&self, root: &Path) -> PathBuf {
        let abs_path = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let hash = xxh3_64(abs_path.to_string_lossy().as_bytes());
        self.index_dir.join(format!("{:016x}", hash))
    }

    pub(crate) fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 { 256 } else { self.batch_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stubdex.json");
        std::fs::write(&path, r#"{ "batch_size": 8, "compress": false }"#).unwrap();

        let config = IndexConfig::load(&path).unwrap();
        assert_eq!(config.batch_size, 8);
        assert!(!config.compress);
        assert_eq!(config.watch_debounce_ms, 500);
    }

    #[test]
    fn corpus_dirs_differ_per_root() {
        let config = IndexConfig::default().with_index_dir("/tmp/stubdex-test");
        let a = config.corpus_dir(Path::new("/does/not/exist/a"));
        let b = config.corpus_dir(Path::new("/does/not/exist/b"));
        assert_ne!(a, b);
        assert!(a.starts_with("/tmp/stubdex-test"));
    }
}
