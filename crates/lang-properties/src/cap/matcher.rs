use crate::PropertiesPlugin;
use std::path::Path;
use stubdex_plugin::FileMatcherCap;

impl FileMatcherCap for PropertiesPlugin {
    fn supports_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("properties"))
            .unwrap_or(false)
    }
}
