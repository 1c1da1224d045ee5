//! Deterministic changeset application.
//!
//! The tree is cloned, then every change walks its `parent_path` by id —
//! never by index — so a changeset computed against one replica lands on
//! the right nodes of any diverged replica that shares history. A change
//! whose path or target no longer exists is skipped: the concurrent
//! deletion it collided with already won, and skipping preserves
//! convergence.

use md_joy_ast::AstNode;

use crate::changeset::{Change, ChangeSet};
use crate::event::Event;
use crate::rga::NodeId;
use crate::tree::{convert_node, DocNode, ParentNode};

/// Apply `changeset` to a copy of `tree` and return the result.
pub fn apply_change_set<E: Event>(tree: &ParentNode<E>, changeset: &ChangeSet<E>) -> ParentNode<E> {
    let mut next = tree.clone();
    for change in &changeset.changes {
        if !apply_change(&mut next, change, &changeset.event) {
            tracing::debug!(change = change.name(), "skipping change for a removed subtree");
        }
    }
    next
}

fn apply_change<E: Event>(root: &mut ParentNode<E>, change: &Change<E>, event: &E) -> bool {
    let mut current = root;
    for id in change.parent_path() {
        current = match current.children.value_mut(id) {
            Some(DocNode::Parent(parent)) => parent,
            Some(DocNode::Leaf(_)) | None => return false,
        };
    }

    match change {
        Change::Delete { target, .. } => {
            if !current.children.contains(target) {
                return false;
            }
            current.children.delete(target);
            true
        }
        Change::Insert { after, nodes, .. } => {
            insert_chain(current, after.as_ref(), nodes, event);
            true
        }
        Change::Modify {
            target,
            after,
            nodes,
            ..
        } => {
            if !current.children.contains(target) {
                return false;
            }
            current.children.delete(target);
            insert_chain(current, after.as_ref(), nodes, event);
            true
        }
    }
}

/// Insert `nodes` left to right, each anchored on the previous one, so the
/// run keeps its order under the sibling tie-break.
fn insert_chain<E: Event>(
    parent: &mut ParentNode<E>,
    after: Option<&NodeId<E>>,
    nodes: &[AstNode],
    event: &E,
) {
    let mut anchor = after.cloned();
    for ast in nodes {
        let value = convert_node(ast, event);
        anchor = Some(parent.children.insert(anchor.as_ref(), value, event));
    }
}
