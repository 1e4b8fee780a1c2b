pub mod error;
pub mod index;
pub mod lifecycle;
pub mod models;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, StubError};
pub use index::IndexService;
pub use lifecycle::{IndexLifecycle, LoadReport};
pub use models::*;

/// Composite trait for a full stub index engine.
/// Clients depend on this single trait instead of the individual services.
pub trait StubIndexEngine: IndexService + IndexLifecycle {}

impl<T: IndexService + IndexLifecycle> StubIndexEngine for T {}
