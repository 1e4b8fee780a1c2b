use crate::stub_type::StubElementType;
use std::sync::Arc;

pub trait StubTypesCap: Send + Sync {
    /// Stub element types contributed by this plugin, in registration order.
    fn stub_types(&self) -> Vec<Arc<dyn StubElementType>>;
}
