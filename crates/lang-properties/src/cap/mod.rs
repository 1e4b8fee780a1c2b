pub mod matcher;
pub mod parse;
pub mod registration;
pub mod stubs;

pub use registration::properties_caps;
