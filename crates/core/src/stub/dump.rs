use super::registry::StubRegistry;
use std::fmt::Write;
use stubdex_api::models::{EmptyPayload, StubTree};

/// Indented text rendering of a stub tree, one node per line.
pub fn render_tree(tree: &StubTree, registry: &StubRegistry) -> String {
    let mut out = String::new();
    for node in tree.iter() {
        let kind = registry.external_id(node.kind()).unwrap_or("<unregistered>");
        let _ = write!(out, "{}{} #{}", "  ".repeat(node.depth()), kind, node.id().0);
        if node.payload_as::<EmptyPayload>().is_none() {
            let _ = write!(out, " {:?}", node.payload());
        }
        out.push('\n');
    }
    out
}
