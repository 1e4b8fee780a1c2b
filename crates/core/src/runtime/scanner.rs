use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use stubdex_plugin::LanguageCaps;

pub(crate) fn is_relevant_path(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if name.starts_with('.') {
            return false;
        }
        if name == "target" || name == "build" || name == "node_modules" {
            return false;
        }
    }
    true
}

pub(crate) fn caps_for<'a>(caps: &'a [LanguageCaps], path: &Path) -> Option<&'a LanguageCaps> {
    caps.iter().find(|c| c.matcher.supports_path(path))
}

/// Files under `root` claimed by one of the registered languages.
pub(crate) fn collect_paths(root: &Path, caps: &[LanguageCaps]) -> Vec<PathBuf> {
    WalkBuilder::new(root)
        .filter_entry(|entry| entry.depth() == 0 || is_relevant_path(entry.path()))
        .build()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if path.is_file() && caps_for(caps, path).is_some() {
                return Some(path.to_path_buf());
            }
            None
        })
        .collect()
}
