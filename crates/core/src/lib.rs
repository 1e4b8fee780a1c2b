pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod runtime;
pub mod stub;

pub use config::IndexConfig;
pub use error::{Result, StubdexError};
pub use index::{IndexSnapshot, IndexStore, content_hash};
pub use runtime::{IndexManager, IndexManagerBuilder, UpdateReport};
pub use stub::{MaterializedHandle, Materializer, StubRegistry, StubRegistryBuilder};
