use crate::PropertiesPlugin;
use std::sync::Arc;
use stubdex_plugin::{StubElementType, StubTypesCap};

impl StubTypesCap for PropertiesPlugin {
    fn stub_types(&self) -> Vec<Arc<dyn StubElementType>> {
        crate::stubs::stub_types()
    }
}
