//! Owned Markdown AST with parse / stringify / fingerprint.
//!
//! This crate is the document-format boundary of the md-joy workspace. The
//! CRDT core never touches comrak's arena-allocated tree; it works on
//! [`AstNode`], an owned, serde-friendly node shape modelled on the mdast
//! JSON form:
//!
//! ```json
//! { "type": "heading", "depth": 1, "children": [ { "type": "text", "value": "Hi" } ] }
//! ```
//!
//! Three operations cross the boundary:
//! - [`parse`] — Markdown text → [`AstNode`] (total; comrak never fails),
//! - [`stringify`] — [`AstNode`] → CommonMark text,
//! - [`fingerprint`] — a stable content hash string used by the diff layer.

mod convert;
mod node;

pub use convert::{parse, stringify};
pub use node::{fingerprint, parent_fingerprint, AstNode};

use thiserror::Error;

/// Errors surfaced by the adapter.
///
/// Parsing is total, so every variant belongs to the rendering direction.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("markdown render failed: {0}")]
    Render(#[from] std::io::Error),
    #[error("rendered markdown is not utf-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
    #[error("unsupported node kind: {0}")]
    UnsupportedKind(String),
}
