//! The comrak bridge: Markdown text ↔ owned [`AstNode`] trees.
//!
//! comrak's AST is arena-allocated and lifetime-bound, so both directions
//! rebuild: [`parse`] walks the comrak tree once and produces owned nodes;
//! [`stringify`] allocates a fresh arena, reconstructs the comrak shape and
//! runs the CommonMark formatter over it.
//!
//! Enabled syntax: CommonMark plus GFM tables, strikethrough and task
//! lists. Comrak node kinds outside that set are skipped on conversion.

use std::cell::RefCell;

use comrak::nodes::{
    Ast, AstNode as ComrakNode, LineColumn, ListDelimType, ListType, NodeCode, NodeCodeBlock,
    NodeHeading, NodeHtmlBlock, NodeLink, NodeList, NodeTable, NodeValue, TableAlignment,
};
use comrak::{format_commonmark, parse_document, Arena, Options};
use serde_json::{json, Map, Value};

use crate::{AdapterError, AstNode};

// ── Parse ─────────────────────────────────────────────────────────────────

/// Parse Markdown text into an owned AST.
///
/// Total: comrak accepts any input, so there is no error path. The result
/// is always a `"root"` parent.
pub fn parse(input: &str) -> AstNode {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.tasklist = true;
    let document = parse_document(&arena, input, &options);
    from_comrak(document).unwrap_or_else(|| AstNode::parent("root", Map::new(), vec![]))
}

fn from_comrak<'a>(node: &'a ComrakNode<'a>) -> Option<AstNode> {
    let data = node.data.borrow();
    Some(match &data.value {
        NodeValue::Document => parent_of(node, "root", Map::new()),
        NodeValue::Paragraph => parent_of(node, "paragraph", Map::new()),
        NodeValue::Heading(heading) => {
            let mut attrs = Map::new();
            attrs.insert("depth".into(), json!(heading.level));
            parent_of(node, "heading", attrs)
        }
        NodeValue::BlockQuote => parent_of(node, "blockquote", Map::new()),
        NodeValue::List(list) => {
            let ordered = list.list_type == ListType::Ordered;
            let mut attrs = Map::new();
            attrs.insert("ordered".into(), json!(ordered));
            if ordered {
                attrs.insert("start".into(), json!(list.start));
            }
            attrs.insert("tight".into(), json!(list.tight));
            parent_of(node, "list", attrs)
        }
        NodeValue::Item(_) => parent_of(node, "listItem", Map::new()),
        NodeValue::TaskItem(symbol) => {
            let mut attrs = Map::new();
            attrs.insert("checked".into(), json!(symbol.is_some()));
            parent_of(node, "listItem", attrs)
        }
        NodeValue::Emph => parent_of(node, "emphasis", Map::new()),
        NodeValue::Strong => parent_of(node, "strong", Map::new()),
        NodeValue::Strikethrough => parent_of(node, "delete", Map::new()),
        NodeValue::Link(link) => parent_of(node, "link", link_attrs(link)),
        NodeValue::Image(link) => parent_of(node, "image", link_attrs(link)),
        NodeValue::Table(table) => {
            let align: Vec<Value> = table
                .alignments
                .iter()
                .map(|a| json!(alignment_name(a)))
                .collect();
            let mut attrs = Map::new();
            attrs.insert("align".into(), Value::Array(align));
            parent_of(node, "table", attrs)
        }
        NodeValue::TableRow(header) => {
            let mut attrs = Map::new();
            attrs.insert("header".into(), json!(*header));
            parent_of(node, "tableRow", attrs)
        }
        NodeValue::TableCell => parent_of(node, "tableCell", Map::new()),
        NodeValue::Text(text) => leaf_with_value("text", text),
        NodeValue::Code(code) => leaf_with_value("inlineCode", &code.literal),
        NodeValue::CodeBlock(block) => {
            let mut attrs = Map::new();
            attrs.insert("value".into(), json!(block.literal));
            if !block.info.is_empty() {
                attrs.insert("lang".into(), json!(block.info));
            }
            AstNode::leaf("code", attrs)
        }
        NodeValue::HtmlBlock(block) => leaf_with_value("html", &block.literal),
        NodeValue::HtmlInline(raw) => {
            let mut attrs = Map::new();
            attrs.insert("value".into(), json!(raw));
            attrs.insert("inline".into(), json!(true));
            AstNode::leaf("html", attrs)
        }
        NodeValue::SoftBreak => AstNode::leaf("softBreak", Map::new()),
        NodeValue::LineBreak => AstNode::leaf("break", Map::new()),
        NodeValue::ThematicBreak => AstNode::leaf("thematicBreak", Map::new()),
        _ => return None,
    })
}

fn parent_of<'a>(node: &'a ComrakNode<'a>, kind: &str, attrs: Map<String, Value>) -> AstNode {
    let children = node.children().filter_map(from_comrak).collect();
    AstNode::parent(kind, attrs, children)
}

fn leaf_with_value(kind: &str, value: &str) -> AstNode {
    let mut attrs = Map::new();
    attrs.insert("value".into(), json!(value));
    AstNode::leaf(kind, attrs)
}

fn link_attrs(link: &NodeLink) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("url".into(), json!(link.url));
    if !link.title.is_empty() {
        attrs.insert("title".into(), json!(link.title));
    }
    attrs
}

fn alignment_name(alignment: &TableAlignment) -> &'static str {
    match alignment {
        TableAlignment::None => "none",
        TableAlignment::Left => "left",
        TableAlignment::Center => "center",
        TableAlignment::Right => "right",
    }
}

// ── Stringify ─────────────────────────────────────────────────────────────

/// Render an owned AST back to CommonMark text.
///
/// Non-root nodes are wrapped in the minimal spine (document, plus a
/// paragraph for inline nodes or a list for a bare list item) the formatter
/// needs to produce valid output.
pub fn stringify(node: &AstNode) -> Result<String, AdapterError> {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.tasklist = true;

    let document = if node.kind == "root" {
        to_comrak(&arena, node, None)?
    } else {
        let document = alloc(&arena, NodeValue::Document);
        let inner = to_comrak(&arena, node, None)?;
        if is_inline(node) {
            let paragraph = alloc(&arena, NodeValue::Paragraph);
            paragraph.append(inner);
            document.append(paragraph);
        } else if node.kind == "listItem" {
            let list = alloc(&arena, NodeValue::List(NodeList::default()));
            list.append(inner);
            document.append(list);
        } else {
            document.append(inner);
        }
        document
    };

    let mut out = Vec::new();
    format_commonmark(document, &options, &mut out)?;
    Ok(String::from_utf8(out)?)
}

fn is_inline(node: &AstNode) -> bool {
    match node.kind.as_str() {
        "text" | "emphasis" | "strong" | "delete" | "inlineCode" | "link" | "image" | "break"
        | "softBreak" => true,
        "html" => node
            .attrs
            .get("inline")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        _ => false,
    }
}

fn alloc<'a>(arena: &'a Arena<ComrakNode<'a>>, value: NodeValue) -> &'a ComrakNode<'a> {
    arena.alloc(ComrakNode::new(RefCell::new(Ast::new(
        value,
        LineColumn { line: 1, column: 1 },
    ))))
}

/// Rebuild the comrak node for `node`. `list` carries the enclosing list's
/// layout so list items reuse it.
fn to_comrak<'a>(
    arena: &'a Arena<ComrakNode<'a>>,
    node: &AstNode,
    list: Option<NodeList>,
) -> Result<&'a ComrakNode<'a>, AdapterError> {
    let mut child_list: Option<NodeList> = None;
    let value = match node.kind.as_str() {
        "root" => NodeValue::Document,
        "paragraph" => NodeValue::Paragraph,
        "heading" => {
            let level = node.attrs.get("depth").and_then(Value::as_u64).unwrap_or(1) as u8;
            NodeValue::Heading(NodeHeading {
                level,
                setext: false,
            })
        }
        "blockquote" => NodeValue::BlockQuote,
        "list" => {
            let ordered = node
                .attrs
                .get("ordered")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let layout = NodeList {
                list_type: if ordered {
                    ListType::Ordered
                } else {
                    ListType::Bullet
                },
                start: node.attrs.get("start").and_then(Value::as_u64).unwrap_or(1) as usize,
                delimiter: ListDelimType::Period,
                bullet_char: b'-',
                tight: node
                    .attrs
                    .get("tight")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
                ..Default::default()
            };
            child_list = Some(layout);
            NodeValue::List(layout)
        }
        "listItem" => {
            let layout = list.unwrap_or_default();
            child_list = Some(layout);
            match node.attrs.get("checked").and_then(Value::as_bool) {
                Some(checked) => NodeValue::TaskItem(checked.then_some('x')),
                None => NodeValue::Item(layout),
            }
        }
        "emphasis" => NodeValue::Emph,
        "strong" => NodeValue::Strong,
        "delete" => NodeValue::Strikethrough,
        "link" => NodeValue::Link(node_link(node)),
        "image" => NodeValue::Image(node_link(node)),
        "table" => {
            let alignments: Vec<TableAlignment> = node
                .attrs
                .get("align")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .map(|v| alignment_from(v.as_str().unwrap_or("none")))
                        .collect()
                })
                .unwrap_or_default();
            let num_columns = alignments.len();
            let num_rows = node.child_slice().len();
            let num_nonempty_cells = node
                .child_slice()
                .iter()
                .map(|row| {
                    row.child_slice()
                        .iter()
                        .filter(|cell| !cell.child_slice().is_empty())
                        .count()
                })
                .sum();
            NodeValue::Table(NodeTable {
                alignments,
                num_columns,
                num_rows,
                num_nonempty_cells,
            })
        }
        "tableRow" => NodeValue::TableRow(
            node.attrs
                .get("header")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        ),
        "tableCell" => NodeValue::TableCell,
        "text" => NodeValue::Text(node.attr_str("value").unwrap_or_default().to_string()),
        "inlineCode" => NodeValue::Code(NodeCode {
            num_backticks: 1,
            literal: node.attr_str("value").unwrap_or_default().to_string(),
        }),
        "code" => NodeValue::CodeBlock(NodeCodeBlock {
            fenced: true,
            fence_char: b'`',
            fence_length: 3,
            info: node.attr_str("lang").unwrap_or_default().to_string(),
            literal: node.attr_str("value").unwrap_or_default().to_string(),
            ..Default::default()
        }),
        "html" => {
            let raw = node.attr_str("value").unwrap_or_default().to_string();
            if is_inline(node) {
                NodeValue::HtmlInline(raw)
            } else {
                NodeValue::HtmlBlock(NodeHtmlBlock {
                    literal: raw,
                    ..Default::default()
                })
            }
        }
        "softBreak" => NodeValue::SoftBreak,
        "break" => NodeValue::LineBreak,
        "thematicBreak" => NodeValue::ThematicBreak,
        other => return Err(AdapterError::UnsupportedKind(other.to_string())),
    };

    let built = alloc(arena, value);
    for child in node.child_slice() {
        built.append(to_comrak(arena, child, child_list)?);
    }
    Ok(built)
}

fn node_link(node: &AstNode) -> NodeLink {
    NodeLink {
        url: node.attr_str("url").unwrap_or_default().to_string(),
        title: node.attr_str("title").unwrap_or_default().to_string(),
    }
}

fn alignment_from(name: &str) -> TableAlignment {
    match name {
        "left" => TableAlignment::Left,
        "center" => TableAlignment::Center,
        "right" => TableAlignment::Right,
        _ => TableAlignment::None,
    }
}
