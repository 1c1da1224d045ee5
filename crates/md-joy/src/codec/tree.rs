//! Canonical Value projection of document trees.
//!
//! Shapes:
//!
//! ```json
//! NodeId   { "uuid": "…", "event": "…" }
//! RgaNode  { "id": NodeId, "value": <tree node>, "afterId": NodeId | null, "tombstone": bool }
//! Rga      { "nodes": [RgaNode, …] }
//! parent   { "type": "…", …attributes, "children": Rga }
//! leaf     the raw mdast JSON shape
//! ```
//!
//! A leaf is told apart from a parent by the `children` key: parents carry
//! the `{ "nodes": … }` object, leaves have no `children` at all.

use md_joy_ast::AstNode;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::CodecError;
use crate::event::Event;
use crate::rga::{NodeId, Rga, RgaNode};
use crate::tree::{DocNode, ParentNode};

// ── Encode ────────────────────────────────────────────────────────────────

/// Project a tree onto its canonical Value form.
pub fn tree_to_value<E: Event>(tree: &ParentNode<E>) -> Value {
    encode_parent(tree)
}

fn encode_parent<E: Event>(parent: &ParentNode<E>) -> Value {
    let mut map = parent.attrs.clone();
    map.insert("type".to_string(), Value::String(parent.kind.clone()));
    map.insert("children".to_string(), encode_rga(&parent.children));
    Value::Object(map)
}

fn encode_rga<E: Event>(rga: &Rga<DocNode<E>, E>) -> Value {
    let nodes: Vec<Value> = rga.all_nodes().into_iter().map(encode_rga_node).collect();
    json!({ "nodes": nodes })
}

fn encode_rga_node<E: Event>(node: &RgaNode<DocNode<E>, E>) -> Value {
    json!({
        "id": encode_node_id(&node.id),
        "value": encode_doc_node(&node.value),
        "afterId": node.after.as_ref().map(encode_node_id).unwrap_or(Value::Null),
        "tombstone": node.tombstone,
    })
}

fn encode_doc_node<E: Event>(node: &DocNode<E>) -> Value {
    match node {
        DocNode::Leaf(ast) => serde_json::to_value(ast).expect("ast nodes serialize to json"),
        DocNode::Parent(parent) => encode_parent(parent),
    }
}

pub(super) fn encode_node_id<E: Event>(id: &NodeId<E>) -> Value {
    json!({ "uuid": id.uuid.to_string(), "event": id.event.encode() })
}

// ── Decode ────────────────────────────────────────────────────────────────

/// Rebuild a tree from its canonical Value form.
pub fn tree_from_value<E: Event>(value: &Value) -> Result<ParentNode<E>, CodecError> {
    decode_parent(value)
}

fn decode_parent<E: Event>(value: &Value) -> Result<ParentNode<E>, CodecError> {
    let object = value.as_object().ok_or(CodecError::InvalidField("node"))?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("type", "tree node"))?
        .to_string();
    let children = object
        .get("children")
        .ok_or(CodecError::MissingField("children", "parent node"))?;

    let mut attrs = Map::new();
    for (key, attr) in object {
        if key != "type" && key != "children" {
            attrs.insert(key.clone(), attr.clone());
        }
    }

    Ok(ParentNode {
        kind,
        attrs,
        children: decode_rga(children)?,
    })
}

fn decode_rga<E: Event>(value: &Value) -> Result<Rga<DocNode<E>, E>, CodecError> {
    let nodes = value
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(CodecError::MissingField("nodes", "rga"))?;
    let decoded = nodes
        .iter()
        .map(decode_rga_node)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Rga::from_nodes(decoded))
}

fn decode_rga_node<E: Event>(value: &Value) -> Result<RgaNode<DocNode<E>, E>, CodecError> {
    let object = value
        .as_object()
        .ok_or(CodecError::InvalidField("rga node"))?;
    let id = decode_node_id(
        object
            .get("id")
            .ok_or(CodecError::MissingField("id", "rga node"))?,
    )?;
    let node_value = decode_doc_node(
        object
            .get("value")
            .ok_or(CodecError::MissingField("value", "rga node"))?,
    )?;
    let after = match object.get("afterId") {
        None | Some(Value::Null) => None,
        Some(reference) => Some(decode_node_id(reference)?),
    };
    let tombstone = object
        .get("tombstone")
        .and_then(Value::as_bool)
        .ok_or(CodecError::MissingField("tombstone", "rga node"))?;

    Ok(RgaNode {
        id,
        value: node_value,
        after,
        tombstone,
    })
}

fn decode_doc_node<E: Event>(value: &Value) -> Result<DocNode<E>, CodecError> {
    let object = value
        .as_object()
        .ok_or(CodecError::InvalidField("tree node"))?;
    if object.contains_key("children") {
        Ok(DocNode::Parent(decode_parent(value)?))
    } else {
        let leaf: AstNode =
            serde_json::from_value(value.clone()).map_err(|_| CodecError::InvalidField("leaf"))?;
        Ok(DocNode::Leaf(leaf))
    }
}

pub(super) fn decode_node_id<E: Event>(value: &Value) -> Result<NodeId<E>, CodecError> {
    let object = value.as_object().ok_or(CodecError::InvalidField("id"))?;
    let uuid = object
        .get("uuid")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("uuid", "id"))?;
    let uuid = Uuid::parse_str(uuid).map_err(|_| CodecError::InvalidField("uuid"))?;
    let event = object
        .get("event")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("event", "id"))?;
    Ok(NodeId {
        uuid,
        event: E::decode(event)?,
    })
}
