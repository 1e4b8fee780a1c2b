pub mod cap;
pub mod model;
pub mod parser;
pub mod stubs;

pub use cap::properties_caps;
pub use model::PropertyStub;
pub use parser::{ParseError, parse};

pub struct PropertiesPlugin {
    _private: (),
}

impl PropertiesPlugin {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for PropertiesPlugin {
    fn default() -> Self {
        Self::new()
    }
}
