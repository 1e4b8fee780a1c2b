pub mod cap;
pub mod codec;
pub mod registration;
pub mod sink;
pub mod stub_type;

pub use cap::*;
pub use codec::{CodecError, StubInputStream, StubOutputStream};
pub use registration::LanguageCaps;
pub use sink::IndexSink;
pub use stub_type::{ParentStub, StubElementType};

/// Error type for plugin operations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
