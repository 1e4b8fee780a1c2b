use std::path::PathBuf;
use stubdex_core::IndexConfig;

pub async fn run(
    path: PathBuf,
    config: IndexConfig,
    key: &str,
    prefix: bool,
    json: bool,
) -> crate::CliResult {
    let manager = crate::open(&path, config).await?;

    if prefix {
        let keys = manager.keys_with_prefix(key).await;
        if json {
            println!("{}", serde_json::to_string_pretty(&keys)?);
        } else {
            keys.iter().for_each(|k| println!("{k}"));
        }
        return Ok(());
    }

    let hits = manager.lookup(key).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("no entries for '{key}'");
    }
    for hit in &hits {
        let relative = hit
            .file
            .path
            .strip_prefix(manager.root_path())
            .unwrap_or(&hit.file.path);
        match &hit.payload.detail {
            Some(detail) => println!(
                "{} #{} [{}] {}",
                relative.display(),
                hit.owner.0,
                hit.payload.kind,
                detail
            ),
            None => println!("{} #{} [{}]", relative.display(), hit.owner.0, hit.payload.kind),
        }
    }
    Ok(())
}
