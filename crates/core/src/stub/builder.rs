use super::registry::StubRegistry;
use crate::error::{Result, StubdexError};
use stubdex_api::models::{Element, StubId, StubTree, StubTreeBuilder, StubTypeId};
use stubdex_plugin::ParentStub;

/// Stub type that claims `element`, if any.
pub(crate) fn stub_type_for(
    registry: &StubRegistry,
    language: &str,
    element: &Element,
) -> Option<StubTypeId> {
    let id = registry.for_element(language, &element.kind)?;
    let ty = registry.type_of(id).ok()?;
    ty.should_create_stub(element).then_some(id)
}

/// Builds the stub tree of a fully parsed file.
///
/// Elements without a stub type are transparent: their stubbed descendants
/// attach to the nearest stubbed ancestor, in document order. The root
/// element itself must be stubbed.
pub fn build_stub_tree(registry: &StubRegistry, language: &str, root: &Element) -> Result<StubTree> {
    let root_kind = stub_type_for(registry, language, root).ok_or_else(|| {
        StubdexError::Parsing(format!(
            "root element '{}' of language '{}' has no stub type",
            root.kind, language
        ))
    })?;
    let root_type = registry.type_of(root_kind)?;
    let root_payload = root_type
        .create_stub(root, None)
        .map_err(|e| create_failed(root_type.external_id(), e))?;

    let mut builder = StubTreeBuilder::new(root_kind, root_payload);
    let mut stack: Vec<(&Element, StubId)> = root
        .children
        .iter()
        .rev()
        .map(|child| (child, StubId::ROOT))
        .collect();

    while let Some((element, parent)) = stack.pop() {
        let Some(kind) = stub_type_for(registry, language, element) else {
            stack.extend(element.children.iter().rev().map(|c| (c, parent)));
            continue;
        };

        let ty = registry.type_of(kind)?;
        let payload = {
            let parent_kind = builder.kind_of(parent).and_then(|k| registry.external_id(k));
            let parent_ctx = match (parent_kind, builder.payload_of(parent)) {
                (Some(external_id), Some(payload)) => Some(ParentStub {
                    external_id,
                    payload,
                }),
                _ => None,
            };
            ty.create_stub(element, parent_ctx)
                .map_err(|e| create_failed(ty.external_id(), e))?
        };

        let id = builder.add_child(parent, kind, payload);
        stack.extend(element.children.iter().rev().map(|c| (c, id)));
    }

    Ok(builder.build())
}

/// Children of `element` as the stub tree sees them: the nearest stubbed
/// descendants, looking through transparent elements.
pub fn stubbed_children<'e>(
    registry: &StubRegistry,
    language: &str,
    element: &'e Element,
) -> Vec<&'e Element> {
    let mut out = Vec::new();
    let mut stack: Vec<&Element> = element.children.iter().rev().collect();
    while let Some(el) = stack.pop() {
        if stub_type_for(registry, language, el).is_some() {
            out.push(el);
        } else {
            stack.extend(el.children.iter().rev());
        }
    }
    out
}

fn create_failed(external_id: &str, err: stubdex_plugin::BoxError) -> StubdexError {
    StubdexError::Plugin(format!("{} failed to create a stub: {}", external_id, err))
}
