use crate::BoxError;
use std::path::Path;
use stubdex_api::models::Element;

/// Entry point into the external parsing layer: full source -> full element tree.
pub trait ParseCap: Send + Sync {
    fn parse_file(&self, source: &str, path: &Path) -> Result<Element, BoxError>;
}
