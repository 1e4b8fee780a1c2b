use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// In-memory handle of a registered stub element type.
///
/// Assigned in registration order and only meaningful inside one registry.
/// Never persisted: the on-disk format refers to kinds by external id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubTypeId(pub u16);

impl StubTypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position of a node inside its [`StubTree`]. Trees are numbered in
/// pre-order, so the root is always `StubId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StubId(pub u32);

impl StubId {
    pub const ROOT: StubId = StubId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind-specific facts carried by a stub node (names, flags, literal values).
pub trait StubPayload: Send + Sync + Debug {
    /// Cast to Any for downcasting to concrete types.
    fn as_any(&self) -> &dyn Any;

    /// Payload equality across the trait object boundary.
    fn payload_eq(&self, other: &dyn StubPayload) -> bool;
}

/// Equality helper for `StubPayload::payload_eq` implementations.
pub fn same_payload<T: PartialEq + 'static>(this: &T, other: &dyn StubPayload) -> bool {
    other
        .as_any()
        .downcast_ref::<T>()
        .is_some_and(|other| this == other)
}

/// Payload of kinds that exist purely for structural shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyPayload;

impl StubPayload for EmptyPayload {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn payload_eq(&self, other: &dyn StubPayload) -> bool {
        same_payload(self, other)
    }
}

impl EmptyPayload {
    pub fn shared() -> Arc<dyn StubPayload> {
        Arc::new(EmptyPayload)
    }
}

/// One structural unit of a stub tree.
#[derive(Debug, Clone)]
pub struct StubNode {
    kind: StubTypeId,
    parent: Option<StubId>,
    children: Vec<StubId>,
    payload: Arc<dyn StubPayload>,
}

impl StubNode {
    pub fn kind(&self) -> StubTypeId {
        self.kind
    }

    pub fn parent(&self) -> Option<StubId> {
        self.parent
    }

    pub fn children(&self) -> &[StubId] {
        &self.children
    }

    pub fn payload(&self) -> &dyn StubPayload {
        &*self.payload
    }
}

/// Immutable, source-position-free skeleton of one parsed file.
///
/// Nodes live in an arena owned by the tree; parents are plain ids so the only
/// ownership edge is tree -> nodes. Built once through [`StubTreeBuilder`] and
/// never patched afterwards.
#[derive(Debug, Clone)]
pub struct StubTree {
    nodes: Vec<StubNode>,
}

impl StubTree {
    pub fn root(&self) -> StubRef<'_> {
        StubRef {
            tree: self,
            id: StubId::ROOT,
        }
    }

    pub fn get(&self, id: StubId) -> Option<StubRef<'_>> {
        (id.index() < self.nodes.len()).then_some(StubRef { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = StubRef<'_>> + '_ {
        (0..self.nodes.len()).map(move |i| StubRef {
            tree: self,
            id: StubId(i as u32),
        })
    }

    /// Child positions leading from the root to `id`.
    pub fn path_to(&self, id: StubId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent() {
            path.push(current.child_index()?);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    fn node(&self, id: StubId) -> &StubNode {
        &self.nodes[id.index()]
    }
}

impl PartialEq for StubTree {
    /// Structural and payload equality. Both trees are in canonical pre-order,
    /// so comparing node by node is enough.
    fn eq(&self, other: &Self) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| {
                a.kind == b.kind
                    && a.parent == b.parent
                    && a.children == b.children
                    && a.payload.payload_eq(&*b.payload)
            })
    }
}

/// Borrowed view of one node together with its tree.
#[derive(Debug, Clone, Copy)]
pub struct StubRef<'a> {
    tree: &'a StubTree,
    id: StubId,
}

impl<'a> StubRef<'a> {
    pub fn id(&self) -> StubId {
        self.id
    }

    pub fn tree(&self) -> &'a StubTree {
        self.tree
    }

    pub fn kind(&self) -> StubTypeId {
        self.tree.node(self.id).kind
    }

    pub fn payload(&self) -> &'a dyn StubPayload {
        &*self.tree.node(self.id).payload
    }

    pub fn payload_as<T: 'static>(&self) -> Option<&'a T> {
        self.payload().as_any().downcast_ref::<T>()
    }

    pub fn parent(&self) -> Option<StubRef<'a>> {
        self.tree.node(self.id).parent.map(|id| StubRef {
            tree: self.tree,
            id,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = StubRef<'a>> + 'a {
        let tree = self.tree;
        tree.node(self.id)
            .children
            .iter()
            .map(move |&id| StubRef { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.tree.node(self.id).children.len()
    }

    /// Position among the parent's children; `None` for the root.
    pub fn child_index(&self) -> Option<usize> {
        let parent = self.tree.node(self.id).parent?;
        self.tree
            .node(parent)
            .children
            .iter()
            .position(|&c| c == self.id)
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = *self;
        while let Some(parent) = current.parent() {
            depth += 1;
            current = parent;
        }
        depth
    }
}

/// Collects nodes in construction order and freezes them into a [`StubTree`].
#[derive(Debug)]
pub struct StubTreeBuilder {
    nodes: Vec<StubNode>,
}

impl StubTreeBuilder {
    pub fn new(root_kind: StubTypeId, root_payload: Arc<dyn StubPayload>) -> Self {
        Self {
            nodes: vec![StubNode {
                kind: root_kind,
                parent: None,
                children: Vec::new(),
                payload: root_payload,
            }],
        }
    }

    pub fn root(&self) -> StubId {
        StubId::ROOT
    }

    /// Appends a child after the existing children of `parent`.
    pub fn add_child(
        &mut self,
        parent: StubId,
        kind: StubTypeId,
        payload: Arc<dyn StubPayload>,
    ) -> StubId {
        assert!(
            parent.index() < self.nodes.len(),
            "parent {parent:?} does not belong to this builder"
        );
        let id = StubId(self.nodes.len() as u32);
        self.nodes.push(StubNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            payload,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn kind_of(&self, id: StubId) -> Option<StubTypeId> {
        self.nodes.get(id.index()).map(|n| n.kind)
    }

    pub fn payload_of(&self, id: StubId) -> Option<&dyn StubPayload> {
        self.nodes.get(id.index()).map(|n| &*n.payload)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Freezes the tree, renumbering nodes into pre-order.
    pub fn build(self) -> StubTree {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![StubId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev().copied());
        }

        let mut remap = vec![StubId::ROOT; self.nodes.len()];
        for (new, old) in order.iter().enumerate() {
            remap[old.index()] = StubId(new as u32);
        }

        let mut slots: Vec<Option<StubNode>> = self.nodes.into_iter().map(Some).collect();
        let nodes = order
            .iter()
            .filter_map(|old| slots[old.index()].take())
            .map(|node| StubNode {
                kind: node.kind,
                parent: node.parent.map(|p| remap[p.index()]),
                children: node.children.iter().map(|c| remap[c.index()]).collect(),
                payload: node.payload,
            })
            .collect();

        StubTree { nodes }
    }
}
