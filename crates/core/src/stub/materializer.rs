use super::builder::{build_stub_tree, stub_type_for, stubbed_children};
use super::registry::StubRegistry;
use crate::error::{Result, StubdexError};
use crate::index::content_hash;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use stubdex_api::StubError;
use stubdex_api::models::{Element, FileIdentity, Language, StubId, StubRef, StubTree};
use stubdex_plugin::ParseCap;

/// Bridge between full element trees and stub trees.
#[derive(Debug, Clone)]
pub struct Materializer {
    registry: Arc<StubRegistry>,
}

impl Materializer {
    pub fn new(registry: Arc<StubRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<StubRegistry> {
        &self.registry
    }

    pub fn from_materialized(&self, language: &str, root: &Element) -> Result<StubTree> {
        build_stub_tree(&self.registry, language, root)
    }

    /// Lightweight element rebuilt from stub payloads alone. No I/O.
    pub fn proxy(&self, tree: &StubTree, id: StubId) -> std::result::Result<Element, StubError> {
        let node = tree.get(id).ok_or_else(|| StubError::StaleStub {
            id,
            reason: "no such stub in tree".to_string(),
        })?;
        let ty = self.registry.type_of(node.kind())?;
        let mut element = ty.create_element(node);
        for child in node.children() {
            element.push_child(self.proxy(tree, child.id())?);
        }
        Ok(element)
    }
}

/// On-demand view of one stub node as a full element.
///
/// Obtained from the index manager for a lookup hit. [`proxy`](Self::proxy)
/// only uses the stub; [`full`](Self::full) re-parses the owning file once and
/// caches the result until the handle is released.
pub struct MaterializedHandle {
    file: FileIdentity,
    stub: StubId,
    tree: Arc<StubTree>,
    language: Language,
    materializer: Materializer,
    parser: Arc<dyn ParseCap>,
    full: OnceCell<Element>,
}

impl std::fmt::Debug for MaterializedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializedHandle")
            .field("file", &self.file)
            .field("stub", &self.stub)
            .field("parsed", &self.full.get().is_some())
            .finish()
    }
}

impl MaterializedHandle {
    pub(crate) fn new(
        file: FileIdentity,
        stub: StubId,
        tree: Arc<StubTree>,
        language: Language,
        materializer: Materializer,
        parser: Arc<dyn ParseCap>,
    ) -> std::result::Result<Self, StubError> {
        if tree.get(stub).is_none() {
            return Err(StubError::StaleStub {
                id: stub,
                reason: format!("{} has no such stub", file),
            });
        }
        Ok(Self {
            file,
            stub,
            tree,
            language,
            materializer,
            parser,
            full: OnceCell::new(),
        })
    }

    pub fn file(&self) -> &FileIdentity {
        &self.file
    }

    pub fn stub_id(&self) -> StubId {
        self.stub
    }

    /// The stub node this handle was created from.
    pub fn stub(&self) -> Option<StubRef<'_>> {
        self.tree.get(self.stub)
    }

    pub fn proxy(&self) -> Result<Element> {
        Ok(self.materializer.proxy(&self.tree, self.stub)?)
    }

    /// Full-fidelity element, located in a fresh parse of the file.
    ///
    /// Blocking: reads and parses the file on first call.
    pub fn full(&self) -> Result<&Element> {
        self.full.get_or_try_init(|| self.reparse())
    }

    pub fn is_parsed(&self) -> bool {
        self.full.get().is_some()
    }

    pub fn release(self) {
        tracing::trace!("Released materialized {:?} of {}", self.stub, self.file);
    }

    fn reparse(&self) -> Result<Element> {
        let bytes = std::fs::read(self.file.path())?;
        if content_hash(&bytes) != self.file.content_hash {
            return Err(self.stale("file changed since it was indexed").into());
        }
        let source = String::from_utf8(bytes)
            .map_err(|e| StubdexError::Parsing(format!("{}: {}", self.file, e)))?;
        let root = self
            .parser
            .parse_file(&source, self.file.path())
            .map_err(|e| StubdexError::Parsing(format!("{}: {}", self.file, e)))?;

        let path = self
            .tree
            .path_to(self.stub)
            .ok_or_else(|| self.stale("stub is not reachable from the root"))?;

        let registry = self.materializer.registry();
        let language = self.language.as_str();
        let mut stub = self.tree.root();
        let mut element = &root;
        self.check_kind(stub, element)?;

        for index in path {
            let children = stubbed_children(registry, language, element);
            element = children
                .get(index)
                .copied()
                .ok_or_else(|| self.stale("element vanished from the re-parsed file"))?;
            stub = stub
                .children()
                .nth(index)
                .ok_or_else(|| self.stale("stub path out of range"))?;
            self.check_kind(stub, element)?;
        }

        Ok(element.clone())
    }

    fn check_kind(&self, stub: StubRef<'_>, element: &Element) -> Result<()> {
        let found = stub_type_for(self.materializer.registry(), self.language.as_str(), element);
        if found != Some(stub.kind()) {
            return Err(self
                .stale(&format!("element '{}' no longer matches its stub", element.kind))
                .into());
        }
        Ok(())
    }

    fn stale(&self, reason: &str) -> StubError {
        StubError::StaleStub {
            id: self.stub,
            reason: reason.to_string(),
        }
    }
}
