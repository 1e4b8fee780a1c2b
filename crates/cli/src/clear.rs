use std::path::PathBuf;
use stubdex_core::IndexConfig;
use tracing::info;

pub async fn run(path: Option<PathBuf>, config: IndexConfig) -> crate::CliResult {
    if let Some(path) = path {
        let manager = stubdex_runtime::build_default_manager(path.clone(), config)?;
        info!("Clearing index for corpus at: {}...", path.display());
        manager.clear_index().await?;
        println!("Cleared {}", manager.index_dir().display());
    } else {
        info!("Clearing all indices at: {}...", config.index_dir.display());
        stubdex_runtime::clear_all_indices(&config)?;
        println!("Cleared {}", config.index_dir.display());
    }
    Ok(())
}
