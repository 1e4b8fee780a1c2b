//! Stub kinds, their binary format and the bridge to full element trees.

pub mod builder;
pub mod dump;
pub mod materializer;
pub mod registry;
pub mod serializer;

pub use builder::{build_stub_tree, stubbed_children};
pub use dump::render_tree;
pub use materializer::{MaterializedHandle, Materializer};
pub use registry::{StubRegistry, StubRegistryBuilder};
pub use serializer::{DecodedStub, deserialize, deserialize_with_report, serialize};
