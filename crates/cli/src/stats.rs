use std::path::PathBuf;
use stubdex_core::IndexConfig;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Stubs")]
    stubs: usize,
}

pub async fn run(path: PathBuf, config: IndexConfig) -> crate::CliResult {
    let manager = crate::open(&path, config).await?;
    let stats = manager.stats().await;

    println!("Corpus:        {}", manager.root_path().display());
    println!("Index Dir:     {}", manager.index_dir().display());
    println!("Files:         {}", stats.file_count);
    println!("Stubs:         {}", stats.stub_count);
    println!("Entries:       {}", stats.entry_count);
    println!("Keys:          {}", stats.key_count);
    println!("Failed Files:  {}", stats.failed_files);

    let versions = manager.registry().versions();
    let rows: Vec<KindRow> = versions
        .iter()
        .map(|(kind, version)| KindRow {
            kind: kind.clone(),
            version: version.to_string(),
            stubs: stats.stubs_per_kind.get(kind).copied().unwrap_or(0),
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
    Ok(())
}
