use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::bail;
use crate::error::{DeltaResult, ErrorKind};
use crate::source::ContinuationToken;

#[derive(Debug, Default)]
struct NodeState {
    children: Vec<Arc<PrefixNode>>,
    is_enumerated: bool,
    is_blob: bool,
}

/// A node of the prefix tree, owning its children and pointing weakly at its parent.
///
/// `token` is the continuation that resumes a flat listing of the parent prefix at the first
/// name under this node. Children are appended in ascending order of their partial prefix by
/// the single worker expanding the node.
#[derive(Debug)]
pub struct PrefixNode {
    parent: Weak<PrefixNode>,
    partial_prefix: String,
    prefix: String,
    token: Option<ContinuationToken>,
    state: RwLock<NodeState>,
}

impl PrefixNode {
    /// Creates a parentless node for `prefix`.
    pub fn root(prefix: impl Into<String>) -> Arc<Self> {
        let prefix = prefix.into();

        Arc::new(Self {
            parent: Weak::new(),
            partial_prefix: prefix.clone(),
            prefix,
            token: None,
            state: RwLock::new(NodeState::default()),
        })
    }

    pub fn parent(&self) -> Option<Arc<PrefixNode>> {
        self.parent.upgrade()
    }

    /// The characters this node adds to its parent prefix.
    pub fn partial_prefix(&self) -> &str {
        &self.partial_prefix
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn token(&self) -> Option<&ContinuationToken> {
        self.token.as_ref()
    }

    /// Whether every child of this node has been discovered.
    pub fn is_enumerated(&self) -> bool {
        self.read().is_enumerated
    }

    /// Whether a name equal to this node prefix exists.
    pub fn is_blob(&self) -> bool {
        self.read().is_blob
    }

    pub fn children(&self) -> Vec<Arc<PrefixNode>> {
        self.read().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.read().children.len()
    }

    /// Returns the child with `partial_prefix`, adding it when missing.
    ///
    /// Fails with [`ErrorKind::InvalidPrefixNode`] when the new partial prefix and an existing
    /// one are prefixes of each other. The empty partial prefix of an exact-match child
    /// coexists with every sibling.
    pub fn get_or_add_child(
        self: &Arc<Self>,
        partial_prefix: impl Into<String>,
        token: Option<ContinuationToken>,
    ) -> DeltaResult<Arc<PrefixNode>> {
        let partial_prefix = partial_prefix.into();
        let mut state = self.write();

        for existing in &state.children {
            if existing.partial_prefix == partial_prefix {
                return Ok(existing.clone());
            }

            if existing.partial_prefix.is_empty() || partial_prefix.is_empty() {
                continue;
            }

            if existing.partial_prefix.starts_with(&partial_prefix) {
                bail!(
                    ErrorKind::InvalidPrefixNode,
                    "An added child must not be less specific than an existing child",
                    format!(
                        "adding '{partial_prefix}' next to '{}' under '{}'",
                        existing.partial_prefix, self.prefix
                    )
                );
            }

            if partial_prefix.starts_with(&existing.partial_prefix) {
                bail!(
                    ErrorKind::InvalidPrefixNode,
                    "An added child must not be more specific than an existing child",
                    format!(
                        "adding '{partial_prefix}' next to '{}' under '{}'",
                        existing.partial_prefix, self.prefix
                    )
                );
            }
        }

        let child = Arc::new(PrefixNode {
            parent: Arc::downgrade(self),
            prefix: format!("{}{partial_prefix}", self.prefix),
            partial_prefix,
            token,
            state: RwLock::new(NodeState::default()),
        });
        state.children.push(child.clone());

        Ok(child)
    }

    /// Adds the empty-partial child standing for a name equal to this node prefix.
    pub(crate) fn add_exact_match_child(self: &Arc<Self>) -> DeltaResult<Arc<PrefixNode>> {
        let child = self.get_or_add_child("", None)?;
        child.mark_blob();
        child.mark_enumerated();

        Ok(child)
    }

    pub(crate) fn mark_enumerated(&self) {
        self.write().is_enumerated = true;
    }

    pub(crate) fn mark_blob(&self) {
        self.write().is_blob = true;
    }

    /// This node followed by every node below it, in pre-order.
    pub fn descendants(self: &Arc<Self>) -> Vec<Arc<PrefixNode>> {
        let mut nodes = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            nodes.push(node);
        }

        nodes
    }

    fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for PrefixNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}
