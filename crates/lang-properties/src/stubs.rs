//! Stub element types of the properties language.

use crate::model::{ATTR_KEY, ATTR_VALUE, FILE, PROPERTIES_LIST, PROPERTY, PropertyStub};
use std::sync::Arc;
use stubdex_api::models::{Element, EntryPayload, StubPayload, StubRef};
use stubdex_plugin::{
    BoxError, IndexSink, ParentStub, StubElementType, StubInputStream, StubOutputStream,
};

pub const LANGUAGE: &str = "properties";

pub const FILE_ID: &str = "properties.file";
pub const PROPERTIES_LIST_ID: &str = "properties.propertieslist";
pub const PROPERTY_ID: &str = "properties.property";

/// Root of every properties stub tree. Carries no payload.
pub struct PropertiesFileStubType;

impl StubElementType for PropertiesFileStubType {
    fn debug_name(&self) -> &str {
        FILE
    }

    fn external_id(&self) -> &str {
        FILE_ID
    }

    fn language(&self) -> &str {
        LANGUAGE
    }
}

/// The list of entries in a file. Pure shape: nothing is persisted or indexed.
pub struct PropertyListStubType;

impl StubElementType for PropertyListStubType {
    fn debug_name(&self) -> &str {
        PROPERTIES_LIST
    }

    fn external_id(&self) -> &str {
        PROPERTIES_LIST_ID
    }

    fn language(&self) -> &str {
        LANGUAGE
    }
}

/// One `key=value` entry, indexed by key.
pub struct PropertyStubType;

impl StubElementType for PropertyStubType {
    fn debug_name(&self) -> &str {
        PROPERTY
    }

    fn external_id(&self) -> &str {
        PROPERTY_ID
    }

    fn language(&self) -> &str {
        LANGUAGE
    }

    /// Entries without a key cannot be searched for.
    fn should_create_stub(&self, element: &Element) -> bool {
        element.attr(ATTR_KEY).is_some_and(|k| !k.is_empty())
    }

    fn create_stub(
        &self,
        element: &Element,
        _parent: Option<ParentStub<'_>>,
    ) -> Result<Arc<dyn StubPayload>, BoxError> {
        let key = element.attr(ATTR_KEY).ok_or("property without key")?;
        let value = element.attr(ATTR_VALUE).unwrap_or_default();
        Ok(Arc::new(PropertyStub::new(key, value)))
    }

    fn create_element(&self, stub: StubRef<'_>) -> Element {
        let element = Element::new(PROPERTY);
        match stub.payload_as::<PropertyStub>() {
            Some(p) => element
                .with_attr(ATTR_KEY, p.key.as_str())
                .with_attr(ATTR_VALUE, p.value.as_str()),
            None => element,
        }
    }

    fn serialize(
        &self,
        payload: &dyn StubPayload,
        out: &mut StubOutputStream,
    ) -> Result<(), BoxError> {
        let property = payload
            .as_any()
            .downcast_ref::<PropertyStub>()
            .ok_or("payload is not a property stub")?;
        out.write_str(&property.key);
        out.write_str(&property.value);
        Ok(())
    }

    fn deserialize(
        &self,
        input: &mut StubInputStream<'_>,
        _parent: Option<ParentStub<'_>>,
    ) -> Result<Arc<dyn StubPayload>, BoxError> {
        let key = input.read_string()?;
        let value = input.read_string()?;
        Ok(Arc::new(PropertyStub::new(key, value)))
    }

    fn index_stub(&self, stub: StubRef<'_>, sink: &mut dyn IndexSink) -> Result<(), BoxError> {
        if let Some(property) = stub.payload_as::<PropertyStub>() {
            sink.put(
                &property.key,
                EntryPayload::new(PROPERTY_ID).with_detail(property.value.as_str()),
            );
        }
        Ok(())
    }
}

pub fn stub_types() -> Vec<Arc<dyn StubElementType>> {
    vec![
        Arc::new(PropertiesFileStubType),
        Arc::new(PropertyListStubType),
        Arc::new(PropertyStubType),
    ]
}
