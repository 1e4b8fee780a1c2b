use std::path::PathBuf;
use stubdex_core::IndexConfig;
use tracing::info;

pub async fn run(path: PathBuf, config: IndexConfig, rebuild: bool) -> crate::CliResult {
    let manager = crate::open(&path, config).await?;

    info!("Indexing corpus at: {}...", path.display());
    let report = if rebuild {
        manager.rebuild().await?
    } else {
        manager.refresh().await?
    };
    manager.save().await?;

    let stats = manager.stats().await;
    println!(
        "indexed {}, unchanged {}, removed {}, failed {}",
        report.indexed.len(),
        report.unchanged,
        report.removed.len(),
        report.failed.len()
    );
    for (file, reason) in &report.failed {
        println!("  failed {}: {}", file.display(), reason);
    }
    println!(
        "{} files, {} stubs, {} keys",
        stats.file_count, stats.stub_count, stats.key_count
    );
    info!("Indexing complete!");
    Ok(())
}
