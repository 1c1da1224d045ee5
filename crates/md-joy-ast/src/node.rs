//! The owned AST node shape and its fingerprints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── AstNode ───────────────────────────────────────────────────────────────

/// One node of a parsed Markdown document.
///
/// `kind` is the mdast-flavored type name (`"paragraph"`, `"heading"`,
/// `"text"`, ...). Every property other than the child list lives in
/// `attrs`, flattened into the node on serialization, so the JSON form is
/// exactly the mdast shape. `children` is `None` for leaves; a parent with
/// no children keeps `Some(vec![])`, which is how the two are told apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<AstNode>>,
}

impl AstNode {
    /// A parent node (owns an ordered child list).
    pub fn parent(kind: impl Into<String>, attrs: Map<String, Value>, children: Vec<AstNode>) -> Self {
        Self {
            kind: kind.into(),
            attrs,
            children: Some(children),
        }
    }

    /// A leaf node (no child list).
    pub fn leaf(kind: impl Into<String>, attrs: Map<String, Value>) -> Self {
        Self {
            kind: kind.into(),
            attrs,
            children: None,
        }
    }

    pub fn is_parent(&self) -> bool {
        self.children.is_some()
    }

    /// Visible children, empty for leaves.
    pub fn child_slice(&self) -> &[AstNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// String attribute accessor.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}

// ── Fingerprints ──────────────────────────────────────────────────────────

/// Stable content fingerprint of a node.
///
/// Leaves hash their entire content; parents hash only their kind and
/// attributes (children excluded), so two parents with the same shape but
/// different children compare equal here and are diffed recursively by the
/// resolver instead. `serde_json::Map` is BTree-backed, so key order is
/// canonical.
pub fn fingerprint(node: &AstNode) -> String {
    if node.is_parent() {
        parent_fingerprint(&node.kind, &node.attrs)
    } else {
        serde_json::to_string(node).unwrap_or_default()
    }
}

/// Fingerprint of a parent's shape: kind plus attributes, children excluded.
pub fn parent_fingerprint(kind: &str, attrs: &Map<String, Value>) -> String {
    let mut map = attrs.clone();
    map.insert("type".to_string(), Value::String(kind.to_string()));
    serde_json::to_string(&Value::Object(map)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(value: &str) -> AstNode {
        let mut attrs = Map::new();
        attrs.insert("value".into(), json!(value));
        AstNode::leaf("text", attrs)
    }

    #[test]
    fn leaf_serializes_to_mdast_shape() {
        let node = text("Hi");
        let v = serde_json::to_value(&node).unwrap();
        assert_eq!(v, json!({ "type": "text", "value": "Hi" }));
    }

    #[test]
    fn parent_serializes_children_inline() {
        let mut attrs = Map::new();
        attrs.insert("depth".into(), json!(1));
        let node = AstNode::parent("heading", attrs, vec![text("Hi")]);
        let v = serde_json::to_value(&node).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "heading",
                "depth": 1,
                "children": [{ "type": "text", "value": "Hi" }]
            })
        );
    }

    #[test]
    fn deserialize_round_trips() {
        let mut attrs = Map::new();
        attrs.insert("depth".into(), json!(2));
        let node = AstNode::parent("heading", attrs, vec![text("x")]);
        let v = serde_json::to_value(&node).unwrap();
        let back: AstNode = serde_json::from_value(v).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn empty_parent_stays_a_parent() {
        let node = AstNode::parent("paragraph", Map::new(), vec![]);
        let v = serde_json::to_value(&node).unwrap();
        let back: AstNode = serde_json::from_value(v).unwrap();
        assert!(back.is_parent());
        assert_eq!(back.child_slice().len(), 0);
    }

    #[test]
    fn leaf_fingerprint_covers_content() {
        assert_ne!(fingerprint(&text("a")), fingerprint(&text("b")));
        assert_eq!(fingerprint(&text("a")), fingerprint(&text("a")));
    }

    #[test]
    fn parent_fingerprint_ignores_children() {
        let mut attrs = Map::new();
        attrs.insert("depth".into(), json!(1));
        let a = AstNode::parent("heading", attrs.clone(), vec![text("old")]);
        let b = AstNode::parent("heading", attrs.clone(), vec![text("new")]);
        assert_eq!(fingerprint(&a), fingerprint(&b));

        let mut deeper = attrs;
        deeper.insert("depth".into(), json!(2));
        let c = AstNode::parent("heading", deeper, vec![text("old")]);
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }
}
