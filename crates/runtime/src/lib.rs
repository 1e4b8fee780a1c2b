use std::path::{Path, PathBuf};
use std::sync::Arc;
use stubdex_api::StubIndexEngine;
use stubdex_core::{IndexConfig, IndexManager, StubdexError};

/// Bootstraps an index manager for `path` with every bundled language plugin.
pub fn build_default_manager(path: PathBuf, config: IndexConfig) -> Result<Arc<IndexManager>, StubdexError> {
    let manager = IndexManager::builder(path)
        .with_config(config)
        .with_language_caps(stubdex_properties::properties_caps())
        .build()?;
    Ok(Arc::new(manager))
}

/// Same as [`build_default_manager`], behind the consumer-facing traits.
pub fn build_default_engine(path: PathBuf) -> Result<Arc<dyn StubIndexEngine>, StubdexError> {
    let manager: Arc<dyn StubIndexEngine> = build_default_manager(path, IndexConfig::default())?;
    Ok(manager)
}

/// Reads a JSON config file if given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> Result<IndexConfig, StubdexError> {
    match path {
        Some(path) => IndexConfig::load(path),
        None => Ok(IndexConfig::default()),
    }
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> Option<impl Drop> {
    Some(stubdex_core::logging::init_logging(component, to_stderr))
}

/// Removes the indices of every corpus under the configured base directory.
pub fn clear_all_indices(config: &IndexConfig) -> Result<(), StubdexError> {
    if config.index_dir.exists() {
        std::fs::remove_dir_all(&config.index_dir)?;
        tracing::info!("Removed all indices under {}", config.index_dir.display());
    }
    Ok(())
}
