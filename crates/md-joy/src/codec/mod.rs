//! Wire codecs for trees and changesets.
//!
//! Two layers, sharing one canonical shape:
//! - the *verbose* codec projects a tree or changeset onto a
//!   `serde_json::Value` and back ([`tree_to_value`], [`tree_from_value`],
//!   [`changeset_to_value`], [`changeset_from_value`]);
//! - the *binary* codec is CBOR bytes over exactly that projection
//!   ([`encode_tree`], [`decode_tree`], [`encode_changeset`],
//!   [`decode_changeset`]).
//!
//! The projection is deterministic: RGA nodes are emitted in traversal
//! order (tombstones included, unreachable nodes last, sorted), and every
//! map is BTree-backed so keys encode sorted — the canonical key order
//! DAG-CBOR expects. Two replicas holding the same state produce the same
//! bytes.
//!
//! Decoding is the library's only surfaced error path.

mod changeset;
mod tree;

pub use changeset::{changeset_from_value, changeset_to_value};
pub use tree::{tree_from_value, tree_to_value};

use serde_json::Value;
use thiserror::Error;

use crate::changeset::ChangeSet;
use crate::event::{Event, EventDecodeError};
use crate::tree::ParentNode;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid cbor payload")]
    InvalidCbor,
    #[error("trailing bytes after payload")]
    TrailingBytes,
    #[error("missing field {0:?} in {1}")]
    MissingField(&'static str, &'static str),
    #[error("malformed field {0:?}")]
    InvalidField(&'static str),
    #[error("unknown change type {0:?}")]
    UnknownChangeType(String),
    #[error(transparent)]
    Event(#[from] EventDecodeError),
}

// ── Binary layer ──────────────────────────────────────────────────────────

/// Encode a document tree to CBOR bytes.
pub fn encode_tree<E: Event>(tree: &ParentNode<E>) -> Vec<u8> {
    to_cbor(&tree_to_value(tree))
}

/// Decode a document tree from CBOR bytes.
pub fn decode_tree<E: Event>(bytes: &[u8]) -> Result<ParentNode<E>, CodecError> {
    tree_from_value(&from_cbor(bytes)?)
}

/// Encode a changeset to CBOR bytes.
pub fn encode_changeset<E: Event>(changeset: &ChangeSet<E>) -> Vec<u8> {
    to_cbor(&changeset_to_value(changeset))
}

/// Decode a changeset from CBOR bytes.
pub fn decode_changeset<E: Event>(bytes: &[u8]) -> Result<ChangeSet<E>, CodecError> {
    changeset_from_value(&from_cbor(bytes)?)
}

fn to_cbor(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out).expect("json values always encode to cbor");
    out
}

fn from_cbor(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut cursor = bytes;
    let value: Value =
        ciborium::de::from_reader(&mut cursor).map_err(|_| CodecError::InvalidCbor)?;
    if !cursor.is_empty() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ReplicaEvent;
    use crate::tree::{build_tree, project_ast};
    use crate::{apply_change_set, compute_change_set};
    use md_joy_ast::parse;

    fn event(seq: u64, replica: &str) -> ReplicaEvent {
        ReplicaEvent::new(seq, replica)
    }

    #[test]
    fn tree_binary_round_trip() {
        let tree = build_tree(&parse("# H\n\nSome *text*.\n\n- a\n- b\n"), &event(0, "a"));
        let bytes = encode_tree(&tree);
        let back: ParentNode<ReplicaEvent> = decode_tree(&bytes).unwrap();
        assert_eq!(project_ast(&back), project_ast(&tree));
        // Identity survives, not just content.
        assert_eq!(back.children.id_at(0), tree.children.id_at(0));
    }

    #[test]
    fn equal_states_encode_to_equal_bytes() {
        let tree = build_tree(&parse("# H\n\nP.\n"), &event(0, "a"));
        let clone = tree.clone();
        assert_eq!(encode_tree(&tree), encode_tree(&clone));
    }

    #[test]
    fn changeset_binary_round_trip() {
        let tree = build_tree(&parse("# H\n\nOld.\n"), &event(0, "a"));
        let changeset = compute_change_set(&tree, "# H\n\nNew.\n", event(1, "b"));
        let bytes = encode_changeset(&changeset);
        let back: ChangeSet<ReplicaEvent> = decode_changeset(&bytes).unwrap();
        assert_eq!(back.event, changeset.event);
        assert_eq!(back.changes.len(), changeset.changes.len());

        let direct = apply_change_set(&tree, &changeset);
        let via_wire = apply_change_set(&tree, &back);
        assert_eq!(project_ast(&direct), project_ast(&via_wire));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(matches!(
            decode_tree::<ReplicaEvent>(&[0xff, 0x00, 0x13, 0x37]),
            Err(CodecError::InvalidCbor)
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let tree = build_tree(&parse("P.\n"), &event(0, "a"));
        let mut bytes = encode_tree(&tree);
        bytes.push(0x00);
        assert!(matches!(
            decode_tree::<ReplicaEvent>(&bytes),
            Err(CodecError::TrailingBytes)
        ));
    }

    #[test]
    fn tombstones_survive_the_wire() {
        let mut tree = build_tree(&parse("P1.\n\nP2.\n"), &event(0, "a"));
        let victim = tree.children.id_at(1).unwrap().clone();
        tree.children.delete(&victim);

        let back: ParentNode<ReplicaEvent> = decode_tree(&encode_tree(&tree)).unwrap();
        assert_eq!(back.children.len(), 2);
        assert_eq!(back.children.visible_len(), 1);
        assert!(back.children.get(&victim).unwrap().tombstone);
    }
}
