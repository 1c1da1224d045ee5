//! Canonical Value projection of changesets.
//!
//! ```json
//! {
//!   "event": "1@alice",
//!   "changes": [
//!     { "type": "insert", "parentPath": [NodeId…], "afterId": NodeId | null, "nodes": [mdast…] },
//!     { "type": "delete", "parentPath": [NodeId…], "targetId": NodeId },
//!     { "type": "modify", "parentPath": [NodeId…], "targetId": NodeId,
//!       "afterId": NodeId | null, "nodes": [mdast…], "before": [mdast…] }
//!   ]
//! }
//! ```
//!
//! Fields that do not apply to a variant are omitted; `afterId` is an
//! explicit null when the insertion anchors at the front.

use md_joy_ast::AstNode;
use serde_json::{json, Value};

use super::tree::{decode_node_id, encode_node_id};
use super::CodecError;
use crate::changeset::{Change, ChangeSet};
use crate::event::Event;
use crate::rga::NodeId;

// ── Encode ────────────────────────────────────────────────────────────────

/// Project a changeset onto its canonical Value form.
pub fn changeset_to_value<E: Event>(changeset: &ChangeSet<E>) -> Value {
    let changes: Vec<Value> = changeset.changes.iter().map(encode_change).collect();
    json!({ "event": changeset.event.encode(), "changes": changes })
}

fn encode_change<E: Event>(change: &Change<E>) -> Value {
    let parent_path: Vec<Value> = change.parent_path().iter().map(encode_node_id).collect();
    match change {
        Change::Insert { after, nodes, .. } => json!({
            "type": change.name(),
            "parentPath": parent_path,
            "afterId": encode_anchor(after),
            "nodes": encode_ast_nodes(nodes),
        }),
        Change::Delete { target, .. } => json!({
            "type": change.name(),
            "parentPath": parent_path,
            "targetId": encode_node_id(target),
        }),
        Change::Modify {
            target,
            after,
            nodes,
            before,
            ..
        } => json!({
            "type": change.name(),
            "parentPath": parent_path,
            "targetId": encode_node_id(target),
            "afterId": encode_anchor(after),
            "nodes": encode_ast_nodes(nodes),
            "before": encode_ast_nodes(before),
        }),
    }
}

fn encode_anchor<E: Event>(after: &Option<NodeId<E>>) -> Value {
    after.as_ref().map(encode_node_id).unwrap_or(Value::Null)
}

fn encode_ast_nodes(nodes: &[AstNode]) -> Value {
    serde_json::to_value(nodes).expect("ast nodes serialize to json")
}

// ── Decode ────────────────────────────────────────────────────────────────

/// Rebuild a changeset from its canonical Value form.
pub fn changeset_from_value<E: Event>(value: &Value) -> Result<ChangeSet<E>, CodecError> {
    let event = value
        .get("event")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("event", "changeset"))?;
    let event = E::decode(event)?;
    let changes = value
        .get("changes")
        .and_then(Value::as_array)
        .ok_or(CodecError::MissingField("changes", "changeset"))?
        .iter()
        .map(decode_change)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ChangeSet { event, changes })
}

fn decode_change<E: Event>(value: &Value) -> Result<Change<E>, CodecError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("type", "change"))?;
    let parent_path = value
        .get("parentPath")
        .and_then(Value::as_array)
        .ok_or(CodecError::MissingField("parentPath", "change"))?
        .iter()
        .map(decode_node_id)
        .collect::<Result<Vec<_>, _>>()?;

    match kind {
        "insert" => Ok(Change::Insert {
            parent_path,
            after: decode_anchor(value)?,
            nodes: decode_ast_nodes(value, "nodes")?,
        }),
        "delete" => Ok(Change::Delete {
            parent_path,
            target: decode_target(value)?,
        }),
        "modify" => Ok(Change::Modify {
            parent_path,
            target: decode_target(value)?,
            after: decode_anchor(value)?,
            nodes: decode_ast_nodes(value, "nodes")?,
            before: decode_ast_nodes(value, "before")?,
        }),
        other => Err(CodecError::UnknownChangeType(other.to_string())),
    }
}

fn decode_target<E: Event>(value: &Value) -> Result<NodeId<E>, CodecError> {
    decode_node_id(
        value
            .get("targetId")
            .ok_or(CodecError::MissingField("targetId", "change"))?,
    )
}

fn decode_anchor<E: Event>(value: &Value) -> Result<Option<NodeId<E>>, CodecError> {
    match value.get("afterId") {
        None | Some(Value::Null) => Ok(None),
        Some(reference) => Ok(Some(decode_node_id(reference)?)),
    }
}

fn decode_ast_nodes(value: &Value, field: &'static str) -> Result<Vec<AstNode>, CodecError> {
    let nodes = value
        .get(field)
        .ok_or(CodecError::MissingField(field, "change"))?;
    serde_json::from_value(nodes.clone()).map_err(|_| CodecError::InvalidField(field))
}
