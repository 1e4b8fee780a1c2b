use std::path::PathBuf;
use stubdex_core::IndexConfig;
use stubdex_core::stub::render_tree;

pub async fn run(path: PathBuf, config: IndexConfig, file: PathBuf) -> crate::CliResult {
    let manager = crate::open(&path, config).await?;
    let file = if file.is_absolute() {
        file
    } else {
        std::env::current_dir()?.join(file)
    };
    let file = file.canonicalize().unwrap_or(file);

    let tree = manager.stub_tree(&file).await?;
    print!("{}", render_tree(&tree, manager.registry()));
    Ok(())
}
