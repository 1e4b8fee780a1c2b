#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use stubdex_api::models::{Element, StubPayload, StubRef};
use stubdex_core::{IndexConfig, IndexManager};
use stubdex_plugin::{
    BoxError, IndexSink, LanguageCaps, ParentStub, StubElementType, StubInputStream,
    StubOutputStream, StubTypesCap,
};
use stubdex_properties::{PropertyStub, properties_caps};
use stubdex_properties::stubs::PROPERTY_ID;
use tempfile::TempDir;

/// A corpus directory plus an isolated index directory.
pub struct Corpus {
    pub root: TempDir,
    pub index: TempDir,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            index: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().canonicalize().unwrap().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn config(&self) -> IndexConfig {
        IndexConfig::default().with_index_dir(self.index.path())
    }

    pub fn manager(&self) -> IndexManager {
        self.manager_with(properties_caps())
    }

    pub fn manager_with(&self, caps: LanguageCaps) -> IndexManager {
        IndexManager::builder(self.root.path().to_path_buf())
            .with_config(self.config())
            .with_language_caps(caps)
            .build()
            .unwrap()
    }
}

/// Properties caps whose `properties.property` kind has another version or
/// fails while indexing.
pub fn tweaked_caps(version: u32, fail_index: bool) -> LanguageCaps {
    tweak(Tweaked {
        inner: None,
        version,
        fail_index,
        undecodable_key: None,
    })
}

/// Properties caps that cannot read back the property stub named `key`.
pub fn decode_failing_caps(key: &'static str) -> LanguageCaps {
    tweak(Tweaked {
        inner: None,
        version: 1,
        fail_index: false,
        undecodable_key: Some(key),
    })
}

/// Properties caps that also keep comments as `properties.comment` stubs.
pub fn caps_with_comments() -> LanguageCaps {
    let base = properties_caps();
    let mut types = base.stubs.stub_types();
    types.push(Arc::new(CommentStubType));
    LanguageCaps {
        stubs: Arc::new(FixedStubs(types)),
        ..base
    }
}

fn tweak(template: Tweaked) -> LanguageCaps {
    let base = properties_caps();
    let types = base
        .stubs
        .stub_types()
        .into_iter()
        .map(|t| {
            if t.external_id() == PROPERTY_ID {
                Arc::new(Tweaked {
                    inner: Some(t),
                    ..template
                }) as Arc<dyn StubElementType>
            } else {
                t
            }
        })
        .collect();
    LanguageCaps {
        stubs: Arc::new(FixedStubs(types)),
        ..base
    }
}

struct CommentStubType;

impl StubElementType for CommentStubType {
    fn debug_name(&self) -> &str {
        "COMMENT"
    }

    fn external_id(&self) -> &str {
        "properties.comment"
    }

    fn language(&self) -> &str {
        "properties"
    }
}

struct FixedStubs(Vec<Arc<dyn StubElementType>>);

impl StubTypesCap for FixedStubs {
    fn stub_types(&self) -> Vec<Arc<dyn StubElementType>> {
        self.0.clone()
    }
}

#[derive(Clone)]
struct Tweaked {
    inner: Option<Arc<dyn StubElementType>>,
    version: u32,
    fail_index: bool,
    undecodable_key: Option<&'static str>,
}

impl Tweaked {
    fn inner(&self) -> &dyn StubElementType {
        self.inner.as_deref().unwrap()
    }
}

impl StubElementType for Tweaked {
    fn debug_name(&self) -> &str {
        self.inner().debug_name()
    }

    fn external_id(&self) -> &str {
        self.inner().external_id()
    }

    fn language(&self) -> &str {
        self.inner().language()
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn should_create_stub(&self, element: &Element) -> bool {
        self.inner().should_create_stub(element)
    }

    fn create_stub(
        &self,
        element: &Element,
        parent: Option<ParentStub<'_>>,
    ) -> Result<Arc<dyn StubPayload>, BoxError> {
        self.inner().create_stub(element, parent)
    }

    fn create_element(&self, stub: StubRef<'_>) -> Element {
        self.inner().create_element(stub)
    }

    fn serialize(
        &self,
        payload: &dyn StubPayload,
        out: &mut StubOutputStream,
    ) -> Result<(), BoxError> {
        self.inner().serialize(payload, out)
    }

    fn deserialize(
        &self,
        input: &mut StubInputStream<'_>,
        parent: Option<ParentStub<'_>>,
    ) -> Result<Arc<dyn StubPayload>, BoxError> {
        let payload = self.inner().deserialize(input, parent)?;
        let key = payload
            .as_any()
            .downcast_ref::<PropertyStub>()
            .map(|p| p.key.as_str());
        if key.is_some() && key == self.undecodable_key {
            return Err(format!("cannot decode {:?}", key).into());
        }
        Ok(payload)
    }

    fn index_stub(&self, stub: StubRef<'_>, sink: &mut dyn IndexSink) -> Result<(), BoxError> {
        if self.fail_index {
            return Err("indexer bug".into());
        }
        self.inner().index_stub(stub, sink)
    }
}
