use std::sync::Arc;

use crate::prefix_tree::PrefixNode;

/// Snapshot of one node, comparable across builds of the same tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub prefix: String,
    pub partial_prefix: String,
    pub token: Option<String>,
    pub is_enumerated: bool,
    pub is_blob: bool,
    pub child_count: usize,
}

/// Every node of the tree in pre-order.
pub fn flatten_tree(root: &Arc<PrefixNode>) -> Vec<NodeSummary> {
    root.descendants()
        .iter()
        .map(|node| NodeSummary {
            prefix: node.prefix().to_string(),
            partial_prefix: node.partial_prefix().to_string(),
            token: node.token().map(|token| token.as_str().to_string()),
            is_enumerated: node.is_enumerated(),
            is_blob: node.is_blob(),
            child_count: node.child_count(),
        })
        .collect()
}

pub fn child_prefixes(node: &PrefixNode) -> Vec<String> {
    node.children()
        .iter()
        .map(|child| child.prefix().to_string())
        .collect()
}

pub fn child_partial_prefixes(node: &PrefixNode) -> Vec<String> {
    node.children()
        .iter()
        .map(|child| child.partial_prefix().to_string())
        .collect()
}

/// Nodes without children.
pub fn leaves(root: &Arc<PrefixNode>) -> Vec<Arc<PrefixNode>> {
    root.descendants()
        .into_iter()
        .filter(|node| node.child_count() == 0)
        .collect()
}
