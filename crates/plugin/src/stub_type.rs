use crate::BoxError;
use crate::codec::{StubInputStream, StubOutputStream};
use crate::sink::IndexSink;
use std::sync::Arc;
use stubdex_api::models::{Element, EmptyPayload, StubPayload, StubRef};

/// Parent context available while a child stub is created or decoded.
#[derive(Debug, Clone, Copy)]
pub struct ParentStub<'a> {
    pub external_id: &'a str,
    pub payload: &'a dyn StubPayload,
}

/// Serialization, construction and indexing logic for one structural kind.
///
/// Registered once per kind. The default methods describe a kind without
/// payload: it only contributes shape to the tree.
pub trait StubElementType: Send + Sync {
    /// Element kind produced by the parser for this type (e.g. `PROPERTY`).
    fn debug_name(&self) -> &str;

    /// Stable, human-readable id used on disk. Renaming it invalidates every
    /// persisted stub and index entry that refers to it.
    fn external_id(&self) -> &str;

    /// Language namespace, e.g. `properties`.
    fn language(&self) -> &str;

    /// Payload schema version. Bumping it forces a rebuild of every file that
    /// contains stubs of this kind.
    fn version(&self) -> u32 {
        1
    }

    fn should_create_stub(&self, _element: &Element) -> bool {
        true
    }

    /// Extracts the index-relevant facts of `element`. Must be deterministic
    /// and side-effect free.
    fn create_stub(
        &self,
        _element: &Element,
        _parent: Option<ParentStub<'_>>,
    ) -> Result<Arc<dyn StubPayload>, BoxError> {
        Ok(EmptyPayload::shared())
    }

    /// Rebuilds a lightweight element from the stub alone. Children are
    /// attached by the materializer.
    fn create_element(&self, _stub: StubRef<'_>) -> Element {
        Element::new(self.debug_name())
    }

    fn serialize(
        &self,
        _payload: &dyn StubPayload,
        _out: &mut StubOutputStream,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn deserialize(
        &self,
        _input: &mut StubInputStream<'_>,
        _parent: Option<ParentStub<'_>>,
    ) -> Result<Arc<dyn StubPayload>, BoxError> {
        Ok(EmptyPayload::shared())
    }

    /// Emits index entries for `stub`. Must not perform I/O.
    fn index_stub(&self, _stub: StubRef<'_>, _sink: &mut dyn IndexSink) -> Result<(), BoxError> {
        Ok(())
    }
}
