//! The RGA-backed document tree.
//!
//! Bootstrapping substitutes every ordered child list of the parsed AST
//! with an [`Rga`], recursively, while keeping the surrounding node shape
//! (kind and attributes) verbatim. Projection is the inverse: each RGA's
//! visible sequence maps back to an AST child list. Merging two trees that
//! share history unions the node sets level by level.

use md_joy_ast::AstNode;
use serde_json::{Map, Value};

use crate::event::Event;
use crate::rga::Rga;

// ── Node variants ─────────────────────────────────────────────────────────

/// One element of a parent's child sequence: either a leaf AST node stored
/// by value, or a nested parent carrying its own child RGA.
#[derive(Debug, Clone)]
pub enum DocNode<E: Event> {
    Leaf(AstNode),
    Parent(ParentNode<E>),
}

impl<E: Event> DocNode<E> {
    pub fn kind(&self) -> &str {
        match self {
            DocNode::Leaf(ast) => &ast.kind,
            DocNode::Parent(parent) => &parent.kind,
        }
    }

    pub fn as_parent(&self) -> Option<&ParentNode<E>> {
        match self {
            DocNode::Parent(parent) => Some(parent),
            DocNode::Leaf(_) => None,
        }
    }
}

/// A node with an ordered child collection. The root is a parent with
/// `kind == "root"`.
///
/// A parent exclusively owns its child RGA, the RGA its nodes. `Clone` is
/// therefore a deep clone of the whole subtree.
#[derive(Debug, Clone)]
pub struct ParentNode<E: Event> {
    pub kind: String,
    pub attrs: Map<String, Value>,
    pub children: Rga<DocNode<E>, E>,
}

// ── AST → tree ────────────────────────────────────────────────────────────

/// Bootstrap a document tree from a parsed AST. Every node gets a fresh
/// uuid; all of them share `event`.
pub fn build_tree<E: Event>(ast: &AstNode, event: &E) -> ParentNode<E> {
    ParentNode {
        kind: ast.kind.clone(),
        attrs: ast.attrs.clone(),
        children: Rga::from_values(
            ast.child_slice().iter().map(|child| convert_node(child, event)),
            event,
        ),
    }
}

/// Convert one AST node into a tree element (used by bootstrap and by the
/// changeset applier for insert payloads).
pub(crate) fn convert_node<E: Event>(ast: &AstNode, event: &E) -> DocNode<E> {
    if ast.is_parent() {
        DocNode::Parent(build_tree(ast, event))
    } else {
        DocNode::Leaf(ast.clone())
    }
}

// ── Tree → AST ────────────────────────────────────────────────────────────

/// Project the visible document back to a plain AST.
pub fn project_ast<E: Event>(tree: &ParentNode<E>) -> AstNode {
    AstNode::parent(
        tree.kind.clone(),
        tree.attrs.clone(),
        tree.children
            .visible_nodes()
            .into_iter()
            .map(|node| project_node(&node.value))
            .collect(),
    )
}

fn project_node<E: Event>(node: &DocNode<E>) -> AstNode {
    match node {
        DocNode::Leaf(ast) => ast.clone(),
        DocNode::Parent(parent) => project_ast(parent),
    }
}

// ── Merge ─────────────────────────────────────────────────────────────────

/// State-based merge of two trees sharing history.
///
/// Node identity is by id. Nodes present on one side only carry their
/// whole subtree in; nodes present on both OR their tombstones and, when
/// both sides are parents, merge their children recursively. Values are
/// never overwritten (they are invariant per id).
pub fn merge_trees<E: Event>(a: &ParentNode<E>, b: &ParentNode<E>) -> ParentNode<E> {
    tracing::debug!(left = a.children.len(), right = b.children.len(), "merging trees");
    let mut merged = a.clone();
    merge_into(&mut merged, b);
    merged
}

fn merge_into<E: Event>(dst: &mut ParentNode<E>, src: &ParentNode<E>) {
    for incoming in src.children.nodes() {
        if dst.children.contains(&incoming.id) {
            if incoming.tombstone {
                dst.children.delete(&incoming.id);
            }
            if let DocNode::Parent(src_parent) = &incoming.value {
                if let Some(DocNode::Parent(dst_parent)) = dst.children.value_mut(&incoming.id) {
                    merge_into(dst_parent, src_parent);
                }
            }
        } else {
            dst.children.adopt(incoming.clone());
        }
    }
}
