use std::any::Any;
use stubdex_api::models::{StubPayload, same_payload};

/// Element kinds produced by the parser.
pub const FILE: &str = "FILE";
pub const PROPERTIES_LIST: &str = "PROPERTIES_LIST";
pub const PROPERTY: &str = "PROPERTY";
pub const COMMENT: &str = "COMMENT";

pub const ATTR_KEY: &str = "key";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_TEXT: &str = "text";

/// Stub payload of one `key=value` entry, with escapes already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyStub {
    pub key: String,
    pub value: String,
}

impl PropertyStub {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl StubPayload for PropertyStub {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn payload_eq(&self, other: &dyn StubPayload) -> bool {
        same_payload(self, other)
    }
}
