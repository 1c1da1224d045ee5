//! Conflict-free collaborative editing of structured Markdown.
//!
//! Every ordered child list of the document's AST is a Replicated Growable
//! Array — a causal-tree sequence CRDT — so replicas edit independently
//! and converge deterministically when states or changesets meet. No
//! common-ancestor lookup, no three-way merge, no coordinator.
//!
//! # Pipeline
//!
//! ```text
//! markdown ── parse ──► AST ── build_tree ──► RGA tree          (bootstrap)
//! new text ── parse ──► AST ── diff vs projection ──► changeset (per edit)
//! changeset ── apply ──► RGA tree' ── project ──► markdown
//! ```
//!
//! Peer changesets apply in any order; alternatively two whole trees merge
//! with [`merge_trees`]. Both routes land on the same document.
//!
//! # Example
//!
//! ```
//! use md_joy::{apply_change_set, compute_change_set, from_markdown, to_markdown, ReplicaEvent};
//!
//! let base = ReplicaEvent::new(0, "alice");
//! let tree = from_markdown("# Notes\n\nFirst point.\n", &base);
//!
//! let cs = compute_change_set(&tree, "# Notes\n\nFirst point.\n\nSecond point.\n", base.next());
//! let tree = apply_change_set(&tree, &cs);
//! assert!(to_markdown(&tree).unwrap().contains("Second point."));
//! ```

mod apply;
mod changeset;
pub mod codec;
mod diff;
mod event;
mod rga;
mod tree;

pub use apply::apply_change_set;
pub use changeset::{Change, ChangeSet};
pub use codec::{
    changeset_from_value, changeset_to_value, decode_changeset, decode_tree, encode_changeset,
    encode_tree, tree_from_value, tree_to_value, CodecError,
};
pub use event::{Event, EventDecodeError, ReplicaEvent};
pub use rga::{NodeId, Rga, RgaNode};
pub use tree::{build_tree, merge_trees, project_ast, DocNode, ParentNode};

/// The AST adapter, re-exported for callers that work below the markdown
/// string surface.
pub use md_joy_ast as ast;

use md_joy_ast::AdapterError;

/// Bootstrap a document tree from Markdown text. Every node is stamped
/// with `event` and a fresh uuid.
pub fn from_markdown<E: Event>(markdown: &str, event: &E) -> ParentNode<E> {
    build_tree(&ast::parse(markdown), event)
}

/// Project the visible document and render it back to Markdown.
pub fn to_markdown<E: Event>(tree: &ParentNode<E>) -> Result<String, AdapterError> {
    ast::stringify(&project_ast(tree))
}

/// Diff `new_markdown` against the tree's current projection and resolve
/// the result into an ID-addressed changeset stamped with `event`.
pub fn compute_change_set<E: Event>(
    tree: &ParentNode<E>,
    new_markdown: &str,
    event: E,
) -> ChangeSet<E> {
    let old = project_ast(tree);
    let new = ast::parse(new_markdown);
    let edits = diff::diff_ast(&old, &new);
    changeset::resolve_edits(tree, edits, event)
}
