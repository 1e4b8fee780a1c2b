use crate::PropertiesPlugin;
use std::path::Path;
use stubdex_api::models::Element;
use stubdex_plugin::{BoxError, ParseCap};

impl ParseCap for PropertiesPlugin {
    fn parse_file(&self, source: &str, path: &Path) -> Result<Element, BoxError> {
        tracing::trace!("Parsing {}", path.display());
        Ok(crate::parser::parse(source)?)
    }
}
