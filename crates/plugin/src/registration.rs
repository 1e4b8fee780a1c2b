use crate::cap::{FileMatcherCap, ParseCap, StubTypesCap};
use std::sync::Arc;
use stubdex_api::models::Language;

#[derive(Clone)]
pub struct LanguageCaps {
    pub language: Language,
    pub matcher: Arc<dyn FileMatcherCap>,
    pub parser: Arc<dyn ParseCap>,
    pub stubs: Arc<dyn StubTypesCap>,
}
