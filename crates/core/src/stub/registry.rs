use crate::error::{Result, StubdexError};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use stubdex_api::StubError;
use stubdex_api::models::StubTypeId;
use stubdex_plugin::{LanguageCaps, StubElementType};

/// Collects stub element types before the registry is frozen.
#[derive(Default)]
pub struct StubRegistryBuilder {
    types: Vec<Arc<dyn StubElementType>>,
    by_external_id: HashMap<String, StubTypeId>,
    by_element: HashMap<String, HashMap<String, StubTypeId>>,
}

impl StubRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one kind. External ids are unique across the registry, and
    /// a language may bind each element kind to at most one stub type.
    pub fn register(&mut self, stub_type: Arc<dyn StubElementType>) -> Result<StubTypeId> {
        let external_id = stub_type.external_id().to_string();
        if external_id.is_empty() {
            return Err(StubdexError::Registry("empty external id".to_string()));
        }
        if self.by_external_id.contains_key(&external_id) {
            return Err(StubdexError::Registry(format!(
                "external id '{}' registered twice",
                external_id
            )));
        }
        let language = stub_type.language();
        let debug_name = stub_type.debug_name();
        if self
            .by_element
            .get(language)
            .is_some_and(|kinds| kinds.contains_key(debug_name))
        {
            return Err(StubdexError::Registry(format!(
                "element kind '{}' of language '{}' already has a stub type",
                debug_name, language
            )));
        }

        let id = u16::try_from(self.types.len())
            .map(StubTypeId)
            .map_err(|_| StubdexError::Registry("too many stub types".to_string()))?;

        tracing::debug!(
            "Registered stub type {} (v{}) as {:?}",
            external_id,
            stub_type.version(),
            id
        );
        self.by_external_id.insert(external_id, id);
        self.by_element
            .entry(language.to_string())
            .or_default()
            .insert(debug_name.to_string(), id);
        self.types.push(stub_type);
        Ok(id)
    }

    pub fn register_caps(&mut self, caps: &LanguageCaps) -> Result<()> {
        for stub_type in caps.stubs.stub_types() {
            self.register(stub_type)?;
        }
        Ok(())
    }

    pub fn build(self) -> StubRegistry {
        StubRegistry {
            types: self.types,
            by_external_id: self.by_external_id,
            by_element: self.by_element,
        }
    }
}

/// Frozen dispatch table from kinds to their element types.
///
/// In-memory ids are dense indices into `types`; on-disk data only ever
/// refers to kinds by external id.
pub struct StubRegistry {
    types: Vec<Arc<dyn StubElementType>>,
    by_external_id: HashMap<String, StubTypeId>,
    by_element: HashMap<String, HashMap<String, StubTypeId>>,
}

impl std::fmt::Debug for StubRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubRegistry")
            .field("kinds", &self.versions())
            .finish()
    }
}

impl StubRegistry {
    pub fn builder() -> StubRegistryBuilder {
        StubRegistryBuilder::new()
    }

    pub fn from_caps(caps: &[LanguageCaps]) -> Result<Self> {
        let mut builder = StubRegistryBuilder::new();
        for c in caps {
            builder.register_caps(c)?;
        }
        Ok(builder.build())
    }

    pub fn resolve(&self, external_id: &str) -> std::result::Result<StubTypeId, StubError> {
        self.by_external_id
            .get(external_id)
            .copied()
            .ok_or_else(|| StubError::UnknownKind {
                external_id: external_id.to_string(),
            })
    }

    /// Element type of a registered id. Ids only come from this registry, so
    /// a miss means the tree was built against another registry.
    pub fn type_of(&self, id: StubTypeId) -> std::result::Result<&dyn StubElementType, StubError> {
        self.types
            .get(id.index())
            .map(|t| &**t)
            .ok_or_else(|| StubError::format(format!("stub type {:?} is not registered", id)))
    }

    pub fn external_id(&self, id: StubTypeId) -> Option<&str> {
        self.types.get(id.index()).map(|t| t.external_id())
    }

    /// Stub type bound to an element kind of `language`, if any.
    pub fn for_element(&self, language: &str, debug_name: &str) -> Option<StubTypeId> {
        self.by_element
            .get(language)
            .and_then(|kinds| kinds.get(debug_name))
            .copied()
    }

    /// Current version of every registered kind, keyed by external id.
    pub fn versions(&self) -> BTreeMap<String, u32> {
        self.types
            .iter()
            .map(|t| (t.external_id().to_string(), t.version()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StubTypeId, &dyn StubElementType)> + '_ {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (StubTypeId(i as u16), &**t))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Kind {
        external_id: &'static str,
        debug_name: &'static str,
        language: &'static str,
    }

    impl StubElementType for Kind {
        fn debug_name(&self) -> &str {
            self.debug_name
        }

        fn external_id(&self) -> &str {
            self.external_id
        }

        fn language(&self) -> &str {
            self.language
        }
    }

    fn kind(
        external_id: &'static str,
        debug_name: &'static str,
        language: &'static str,
    ) -> Arc<dyn StubElementType> {
        Arc::new(Kind {
            external_id,
            debug_name,
            language,
        })
    }

    #[test]
    fn resolves_registered_kinds() {
        let mut builder = StubRegistry::builder();
        let a = builder.register(kind("a.file", "FILE", "a")).unwrap();
        let b = builder.register(kind("a.entry", "ENTRY", "a")).unwrap();
        let registry = builder.build();

        assert_eq!(registry.resolve("a.file").unwrap(), a);
        assert_eq!(registry.resolve("a.entry").unwrap(), b);
        assert_eq!(registry.for_element("a", "ENTRY"), Some(b));
        assert_eq!(registry.for_element("b", "ENTRY"), None);
        assert_eq!(registry.for_element("a", "MISSING"), None);
        assert_eq!(registry.versions().get("a.file"), Some(&1));
    }

    #[test]
    fn unknown_external_id() {
        let registry = StubRegistry::builder().build();
        assert_eq!(
            registry.resolve("missing"),
            Err(StubError::UnknownKind {
                external_id: "missing".to_string()
            })
        );
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut builder = StubRegistry::builder();
        builder.register(kind("a.file", "FILE", "a")).unwrap();
        assert!(builder.register(kind("a.file", "OTHER", "a")).is_err());
        assert!(builder.register(kind("a.file2", "FILE", "a")).is_err());
        // Same element kind in another language is fine.
        assert!(builder.register(kind("b.file", "FILE", "b")).is_ok());
    }
}
