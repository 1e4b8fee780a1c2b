use crate::PropertiesPlugin;
use std::sync::Arc;
use stubdex_api::models::Language;
use stubdex_plugin::LanguageCaps;

pub fn properties_caps() -> LanguageCaps {
    let plugin = Arc::new(PropertiesPlugin::new());
    LanguageCaps {
        language: Language::PROPERTIES,
        matcher: plugin.clone(),
        parser: plugin.clone(),
        stubs: plugin,
    }
}
