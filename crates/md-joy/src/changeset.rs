//! ID-addressed changesets and the index → id resolver.
//!
//! The diff layer speaks indices; indices go stale the moment a concurrent
//! edit lands. Before a changeset leaves the replica, every index path is
//! re-anchored onto [`NodeId`]s by walking the live tree, so applying it on
//! a diverged peer still reaches the same nodes.

use std::fmt;

use md_joy_ast::AstNode;

use crate::diff::IndexedEdit;
use crate::event::Event;
use crate::rga::NodeId;
use crate::tree::{DocNode, ParentNode};

// ── Changes ───────────────────────────────────────────────────────────────

/// One ID-addressed operation. `parent_path` locates the child sequence to
/// operate on (root's children for an empty path), walked by id lookup.
#[derive(Debug, Clone)]
pub enum Change<E: Event> {
    Insert {
        parent_path: Vec<NodeId<E>>,
        /// Causal anchor; `None` inserts at the front.
        after: Option<NodeId<E>>,
        nodes: Vec<AstNode>,
    },
    Delete {
        parent_path: Vec<NodeId<E>>,
        target: NodeId<E>,
    },
    Modify {
        parent_path: Vec<NodeId<E>>,
        target: NodeId<E>,
        after: Option<NodeId<E>>,
        nodes: Vec<AstNode>,
        /// The replaced nodes, kept for inspection and the wire format.
        before: Vec<AstNode>,
    },
}

impl<E: Event> Change<E> {
    pub fn parent_path(&self) -> &[NodeId<E>] {
        match self {
            Change::Insert { parent_path, .. }
            | Change::Delete { parent_path, .. }
            | Change::Modify { parent_path, .. } => parent_path,
        }
    }

    /// Short mnemonic, used by the wire codec and log events.
    pub fn name(&self) -> &'static str {
        match self {
            Change::Insert { .. } => "insert",
            Change::Delete { .. } => "delete",
            Change::Modify { .. } => "modify",
        }
    }
}

impl<E: Event> fmt::Display for Change<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.parent_path().len();
        match self {
            Change::Insert { nodes, .. } => {
                write!(f, "{} depth={} +{}", self.name(), depth, nodes.len())
            }
            Change::Delete { target, .. } => {
                write!(f, "{} depth={} {}", self.name(), depth, target.uuid)
            }
            Change::Modify { target, nodes, .. } => write!(
                f,
                "{} depth={} {} +{}",
                self.name(),
                depth,
                target.uuid,
                nodes.len()
            ),
        }
    }
}

/// An ordered list of changes, all stamped with one event.
#[derive(Debug, Clone)]
pub struct ChangeSet<E: Event> {
    pub event: E,
    pub changes: Vec<Change<E>>,
}

impl<E: Event> ChangeSet<E> {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl<E: Event> fmt::Display for ChangeSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "changeset {} [", self.event.encode())?;
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{change}")?;
        }
        write!(f, "]")
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────

/// Anchor index-addressed edits onto the live tree. Edits whose path no
/// longer resolves (runs off a leaf, index out of range) are dropped — by
/// construction that means the addressed subtree was concurrently removed.
pub(crate) fn resolve_edits<E: Event>(
    tree: &ParentNode<E>,
    edits: Vec<IndexedEdit>,
    event: E,
) -> ChangeSet<E> {
    let mut changes = Vec::with_capacity(edits.len());
    for edit in edits {
        match resolve_edit(tree, &edit) {
            Some(change) => changes.push(change),
            None => tracing::debug!(path = ?edit.path(), "dropping edit with unresolvable path"),
        }
    }
    ChangeSet { event, changes }
}

fn resolve_edit<E: Event>(tree: &ParentNode<E>, edit: &IndexedEdit) -> Option<Change<E>> {
    let (target_index, parent_steps) = edit.path().split_last()?;

    let mut parent_path = Vec::with_capacity(parent_steps.len());
    let mut current = tree;
    for &index in parent_steps {
        let id = current.children.id_at(index)?.clone();
        match &current.children.get(&id)?.value {
            DocNode::Parent(parent) => {
                parent_path.push(id);
                current = parent;
            }
            DocNode::Leaf(_) => return None,
        }
    }

    match edit {
        IndexedEdit::Delete { .. } => {
            let target = current.children.id_at(*target_index)?.clone();
            Some(Change::Delete {
                parent_path,
                target,
            })
        }
        IndexedEdit::Insert { nodes, .. } => {
            let after = current.children.predecessor_for_index(*target_index).cloned();
            Some(Change::Insert {
                parent_path,
                after,
                nodes: nodes.clone(),
            })
        }
        IndexedEdit::Modify { nodes, before, .. } => {
            let target = current.children.id_at(*target_index)?.clone();
            let after = current.children.predecessor_for_index(*target_index).cloned();
            Some(Change::Modify {
                parent_path,
                target,
                after,
                nodes: nodes.clone(),
                before: before.clone(),
            })
        }
    }
}
