use std::path::PathBuf;
use stubdex_core::IndexConfig;
use tracing::info;

pub async fn run(path: PathBuf, config: IndexConfig) -> crate::CliResult {
    let manager = crate::open(&path, config).await?;

    info!("Initializing: Indexing corpus at: {}...", path.display());
    let report = manager.refresh().await?;
    manager.save().await?;
    info!(
        "Initial indexing complete: {} indexed, {} unchanged",
        report.indexed.len(),
        report.unchanged
    );

    manager.clone().watch().await?;
    println!("Watching {}. Press Ctrl+C to stop.", manager.root_path().display());

    tokio::signal::ctrl_c().await?;
    manager.cancel_token().cancel();
    manager.save().await?;
    info!("Watcher stopped.");

    Ok(())
}
