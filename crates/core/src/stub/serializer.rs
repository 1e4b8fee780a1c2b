//! Binary stub stream.
//!
//! Layout: `STB1` magic, format version, kind table, then nodes in pre-order.
//! The kind table lists `(external id, version)` pairs in first-use order and
//! nodes refer to it by `slot + 1`. Each node is its tag, a length-framed
//! payload and its children, closed by an `END` tag. Nothing in the stream
//! points back into source text.

use super::registry::StubRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use stubdex_api::StubError;
use stubdex_api::models::{
    EmptyPayload, StubId, StubPayload, StubTree, StubTreeBuilder, StubTypeId,
};
use stubdex_plugin::{
    CodecError, ParentStub, StubElementType, StubInputStream, StubOutputStream,
};

pub const MAGIC: &[u8; 4] = b"STB1";
pub const FORMAT_VERSION: u32 = 1;
const END: u32 = 0;

/// A decoded tree together with the subtrees dropped on payload errors.
#[derive(Debug)]
pub struct DecodedStub {
    pub tree: StubTree,
    pub dropped: Vec<StubError>,
}

pub fn serialize(tree: &StubTree, registry: &StubRegistry) -> Result<Vec<u8>, StubError> {
    let mut slots: HashMap<StubTypeId, u32> = HashMap::new();
    let mut table: Vec<StubTypeId> = Vec::new();
    for node in tree.iter() {
        slots.entry(node.kind()).or_insert_with(|| {
            table.push(node.kind());
            table.len() as u32
        });
    }

    let mut out = StubOutputStream::new();
    out.write_raw(MAGIC);
    out.write_var_u32(FORMAT_VERSION);
    out.write_var_u32(table.len() as u32);
    for kind in &table {
        let ty = registry.type_of(*kind)?;
        out.write_str(ty.external_id());
        out.write_var_u32(ty.version());
    }

    enum Step {
        Enter(StubId),
        Exit,
    }

    let mut stack = vec![Step::Enter(StubId::ROOT)];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Enter(id) => id,
            Step::Exit => {
                out.write_var_u32(END);
                continue;
            }
        };
        let node = tree
            .get(id)
            .ok_or_else(|| StubError::format(format!("dangling child {:?}", id)))?;
        let ty = registry.type_of(node.kind())?;

        out.write_var_u32(slots[&node.kind()]);
        let mut frame = StubOutputStream::new();
        if node.payload_as::<EmptyPayload>().is_none() {
            ty.serialize(node.payload(), &mut frame)
                .map_err(|e| StubError::PayloadCodec {
                    external_id: ty.external_id().to_string(),
                    reason: e.to_string(),
                })?;
        }
        out.write_bytes(frame.as_bytes());

        stack.push(Step::Exit);
        let children: Vec<StubId> = node.children().map(|c| c.id()).collect();
        stack.extend(children.into_iter().rev().map(Step::Enter));
    }

    Ok(out.into_bytes())
}

/// Decodes a stream, dropping subtrees whose payload fails to decode.
pub fn deserialize(bytes: &[u8], registry: &StubRegistry) -> Result<StubTree, StubError> {
    let decoded = deserialize_with_report(bytes, registry)?;
    for err in &decoded.dropped {
        tracing::warn!("Dropped stub subtree: {}", err);
    }
    Ok(decoded.tree)
}

pub fn deserialize_with_report(
    bytes: &[u8],
    registry: &StubRegistry,
) -> Result<DecodedStub, StubError> {
    let mut input = StubInputStream::new(bytes);

    let magic = input.read_raw(MAGIC.len()).map_err(truncated)?;
    if magic != MAGIC {
        return Err(StubError::format("bad magic"));
    }
    let version = input.read_var_u32().map_err(truncated)?;
    if version != FORMAT_VERSION {
        return Err(StubError::format(format!(
            "stream format {} is not {}",
            version, FORMAT_VERSION
        )));
    }

    let count = input.read_var_u32().map_err(truncated)? as usize;
    if count > input.remaining() {
        return Err(StubError::format(format!("kind table of {} entries", count)));
    }
    let mut table: Vec<(StubTypeId, &dyn StubElementType)> = Vec::with_capacity(count);
    for _ in 0..count {
        let external_id = input.read_str().map_err(truncated)?;
        let stored = input.read_var_u32().map_err(truncated)?;
        let id = registry.resolve(external_id)?;
        let ty = registry.type_of(id)?;
        if ty.version() != stored {
            return Err(StubError::format(format!(
                "kind '{}' stored at version {} but registered at version {}",
                external_id,
                stored,
                ty.version()
            )));
        }
        table.push((id, ty));
    }

    let tag = input.read_var_u32().map_err(truncated)?;
    if tag == END {
        return Err(StubError::format("stream has no root"));
    }
    let (root_kind, root_type) = slot(&table, tag)?;
    let frame = input.read_bytes().map_err(truncated)?;
    let root_payload = decode_payload(root_type, frame, None)?;

    let mut builder = StubTreeBuilder::new(root_kind, root_payload);
    let mut dropped = Vec::new();
    // `None` marks a level inside a dropped subtree.
    let mut stack: Vec<Option<StubId>> = vec![Some(StubId::ROOT)];

    while let Some(top) = stack.last().copied() {
        let tag = input.read_var_u32().map_err(truncated)?;
        if tag == END {
            stack.pop();
            continue;
        }
        let (kind, ty) = slot(&table, tag)?;
        let frame = input.read_bytes().map_err(truncated)?;

        let Some(parent) = top else {
            stack.push(None);
            continue;
        };

        let decoded = {
            let parent_kind = builder.kind_of(parent).and_then(|k| registry.external_id(k));
            let parent_ctx = match (parent_kind, builder.payload_of(parent)) {
                (Some(external_id), Some(payload)) => Some(ParentStub {
                    external_id,
                    payload,
                }),
                _ => None,
            };
            decode_payload(ty, frame, parent_ctx)
        };

        match decoded {
            Ok(payload) => {
                let id = builder.add_child(parent, kind, payload);
                stack.push(Some(id));
            }
            Err(err) => {
                dropped.push(err);
                stack.push(None);
            }
        }
    }

    if !input.is_at_end() {
        return Err(StubError::format(format!(
            "{} trailing bytes after root",
            input.remaining()
        )));
    }

    Ok(DecodedStub {
        tree: builder.build(),
        dropped,
    })
}

fn decode_payload(
    ty: &dyn StubElementType,
    frame: &[u8],
    parent: Option<ParentStub<'_>>,
) -> Result<Arc<dyn StubPayload>, StubError> {
    let codec_err = |reason: String| StubError::PayloadCodec {
        external_id: ty.external_id().to_string(),
        reason,
    };

    let mut input = StubInputStream::new(frame);
    let payload = ty
        .deserialize(&mut input, parent)
        .map_err(|e| codec_err(e.to_string()))?;
    if !input.is_at_end() {
        return Err(codec_err(format!(
            "{} unread payload bytes",
            input.remaining()
        )));
    }
    Ok(payload)
}

fn slot<'r>(
    table: &[(StubTypeId, &'r dyn StubElementType)],
    tag: u32,
) -> Result<(StubTypeId, &'r dyn StubElementType), StubError> {
    (tag as usize)
        .checked_sub(1)
        .and_then(|i| table.get(i))
        .copied()
        .ok_or_else(|| StubError::format(format!("kind slot {} out of range", tag)))
}

fn truncated(err: CodecError) -> StubError {
    StubError::format(err.to_string())
}
