//! Index-based structural diff of two ASTs.
//!
//! This is the internal half of the changeset resolver: it compares the
//! tree's current projection against a freshly parsed document and emits
//! index-addressed edits, which `changeset` then re-anchors onto node ids.
//!
//! Child lists are matched with an LCS over fingerprints. Parent
//! fingerprints exclude children, so a parent whose shape survived but
//! whose content changed still matches — and the matched pair is diffed
//! recursively. The unmatched gap between two matches is paired greedily
//! left to right on equal kinds (recursing into parents with unchanged
//! attributes, replacing everything else via `modify`); pairing stops at
//! the first kind mismatch, old leftovers become deletes and new leftovers
//! one multi-node insert.

use md_joy_ast::{fingerprint, AstNode};

// ── Edits ─────────────────────────────────────────────────────────────────

/// One index-addressed edit. `path` runs from the old root; the last
/// component is the target index inside the addressed child sequence.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum IndexedEdit {
    Insert {
        path: Vec<usize>,
        nodes: Vec<AstNode>,
    },
    Delete {
        path: Vec<usize>,
    },
    Modify {
        path: Vec<usize>,
        nodes: Vec<AstNode>,
        before: Vec<AstNode>,
    },
}

impl IndexedEdit {
    pub(crate) fn path(&self) -> &[usize] {
        match self {
            IndexedEdit::Insert { path, .. }
            | IndexedEdit::Delete { path }
            | IndexedEdit::Modify { path, .. } => path,
        }
    }
}

/// Diff two documents (roots included only for their children).
pub(crate) fn diff_ast(old: &AstNode, new: &AstNode) -> Vec<IndexedEdit> {
    let mut edits = Vec::new();
    diff_children(old.child_slice(), new.child_slice(), &[], &mut edits);
    edits
}

fn diff_children(old: &[AstNode], new: &[AstNode], prefix: &[usize], out: &mut Vec<IndexedEdit>) {
    let old_fp: Vec<String> = old.iter().map(fingerprint).collect();
    let new_fp: Vec<String> = new.iter().map(fingerprint).collect();
    let matches = lcs_matches(&old_fp, &new_fp);

    let mut old_cursor = 0;
    let mut new_cursor = 0;
    for (old_idx, new_idx) in matches
        .into_iter()
        .chain(std::iter::once((old.len(), new.len())))
    {
        diff_gap(
            &old[old_cursor..old_idx],
            &new[new_cursor..new_idx],
            old_cursor,
            prefix,
            out,
        );
        if old_idx < old.len() {
            // A fingerprint match. Parents fingerprint shallow, so their
            // subtrees may still differ — recurse.
            let (o, n) = (&old[old_idx], &new[new_idx]);
            if o != n && o.is_parent() && n.is_parent() {
                let mut path = prefix.to_vec();
                path.push(old_idx);
                diff_children(o.child_slice(), n.child_slice(), &path, out);
            }
            old_cursor = old_idx + 1;
            new_cursor = new_idx + 1;
        }
    }
}

fn diff_gap(
    old: &[AstNode],
    new: &[AstNode],
    old_start: usize,
    prefix: &[usize],
    out: &mut Vec<IndexedEdit>,
) {
    let at = |index: usize| {
        let mut path = prefix.to_vec();
        path.push(index);
        path
    };

    let mut paired = 0;
    while paired < old.len() && paired < new.len() {
        let (o, n) = (&old[paired], &new[paired]);
        if o.kind != n.kind || o.is_parent() != n.is_parent() {
            break;
        }
        if o == n {
            paired += 1;
            continue;
        }
        if o.is_parent() {
            if o.attrs == n.attrs {
                diff_children(o.child_slice(), n.child_slice(), &at(old_start + paired), out);
            } else {
                out.push(IndexedEdit::Modify {
                    path: at(old_start + paired),
                    nodes: vec![n.clone()],
                    before: vec![o.clone()],
                });
            }
        } else {
            out.push(IndexedEdit::Modify {
                path: at(old_start + paired),
                nodes: vec![n.clone()],
                before: vec![o.clone()],
            });
        }
        paired += 1;
    }

    for removed in paired..old.len() {
        out.push(IndexedEdit::Delete {
            path: at(old_start + removed),
        });
    }
    if paired < new.len() {
        out.push(IndexedEdit::Insert {
            path: at(old_start + paired),
            nodes: new[paired..].to_vec(),
        });
    }
}

// ── LCS ───────────────────────────────────────────────────────────────────

/// Longest common subsequence over fingerprints, returned as matched
/// `(old index, new index)` pairs in increasing order.
///
/// `counts[i][j]` holds the LCS length of `old[i..]` / `new[j..]`; the
/// forward extraction walk advances the side with the larger remaining
/// count and, on ties, the old side. The policy is arbitrary but must stay
/// fixed: both replicas of a document never diff the same pair, only the
/// converged result matters, and that is invariant under the choice.
fn lcs_matches(old: &[String], new: &[String]) -> Vec<(usize, usize)> {
    let n = old.len();
    let m = new.len();
    let mut counts = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            counts[i][j] = if old[i] == new[j] {
                counts[i + 1][j + 1] + 1
            } else {
                counts[i + 1][j].max(counts[i][j + 1])
            };
        }
    }

    let mut matches = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            matches.push((i, j));
            i += 1;
            j += 1;
        } else if counts[i + 1][j] >= counts[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_joy_ast::parse;

    fn diff_md(old: &str, new: &str) -> Vec<IndexedEdit> {
        diff_ast(&parse(old), &parse(new))
    }

    #[test]
    fn identical_documents_produce_no_edits() {
        assert!(diff_md("# H\n\nP1.\n", "# H\n\nP1.\n").is_empty());
    }

    #[test]
    fn appended_paragraph_is_one_insert() {
        let edits = diff_md("# H\n\nP1.\n", "# H\n\nP1.\n\nP2.\n");
        assert_eq!(edits.len(), 1);
        match &edits[0] {
            IndexedEdit::Insert { path, nodes } => {
                assert_eq!(path, &vec![2]);
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].kind, "paragraph");
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn removed_paragraph_shifts_content_and_deletes_the_tail() {
        // Paragraph fingerprints are shallow, so the survivor matches
        // positionally: the text shifts into slot 1 and slot 2 goes away.
        let edits = diff_md("# H\n\nP1.\n\nP2.\n", "# H\n\nP2.\n");
        assert_eq!(edits.len(), 2);
        match &edits[0] {
            IndexedEdit::Modify { path, nodes, .. } => {
                assert_eq!(path, &vec![1, 0]);
                assert_eq!(nodes[0].attr_str("value"), Some("P2."));
            }
            other => panic!("expected modify, got {other:?}"),
        }
        assert!(matches!(&edits[1], IndexedEdit::Delete { path } if path == &vec![2]));
    }

    #[test]
    fn changed_text_becomes_a_nested_modify() {
        let edits = diff_md("# H\n\nOld.\n", "# H\n\nNew.\n");
        assert_eq!(edits.len(), 1);
        match &edits[0] {
            IndexedEdit::Modify { path, nodes, before } => {
                // The paragraph matched shallowly; the text leaf below it changed.
                assert_eq!(path, &vec![1, 0]);
                assert_eq!(nodes[0].attr_str("value"), Some("New."));
                assert_eq!(before[0].attr_str("value"), Some("Old."));
            }
            other => panic!("expected modify, got {other:?}"),
        }
    }

    #[test]
    fn heading_depth_change_replaces_the_heading() {
        let edits = diff_md("# H\n", "## H\n");
        assert_eq!(edits.len(), 1);
        match &edits[0] {
            IndexedEdit::Modify { path, nodes, before } => {
                assert_eq!(path, &vec![0]);
                assert_eq!(nodes[0].kind, "heading");
                assert_eq!(before[0].kind, "heading");
            }
            other => panic!("expected modify, got {other:?}"),
        }
    }

    #[test]
    fn kind_change_becomes_delete_plus_insert() {
        let edits = diff_md("P.\n", "# P\n");
        assert_eq!(edits.len(), 2);
        assert!(matches!(&edits[0], IndexedEdit::Delete { path } if path == &vec![0]));
        assert!(matches!(&edits[1], IndexedEdit::Insert { path, .. } if path == &vec![0]));
    }

    #[test]
    fn list_item_edit_descends_the_whole_spine() {
        let edits = diff_md("- one\n- two\n", "- one\n- twenty\n");
        assert_eq!(edits.len(), 1);
        match &edits[0] {
            IndexedEdit::Modify { path, .. } => {
                // list → item 1 → paragraph → text 0
                assert_eq!(path, &vec![0, 1, 0, 0]);
            }
            other => panic!("expected modify, got {other:?}"),
        }
    }

    #[test]
    fn multi_node_insert_stays_one_edit() {
        let edits = diff_md("# H\n", "# H\n\nA.\n\nB.\n");
        assert_eq!(edits.len(), 1);
        match &edits[0] {
            IndexedEdit::Insert { path, nodes } => {
                assert_eq!(path, &vec![1]);
                assert_eq!(nodes.len(), 2);
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn content_bearing_leaves_anchor_real_lcs_matches() {
        // Code blocks fingerprint by content, so removing the middle one is
        // a plain delete — the neighbors stay matched.
        let edits = diff_md(
            "```\na\n```\n\n```\nb\n```\n\n```\nc\n```\n",
            "```\na\n```\n\n```\nc\n```\n",
        );
        assert_eq!(edits, vec![IndexedEdit::Delete { path: vec![1] }]);
    }

    #[test]
    fn lcs_matches_basics() {
        let fp = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        assert_eq!(
            lcs_matches(&fp(&["a", "b", "c"]), &fp(&["a", "c"])),
            vec![(0, 0), (2, 1)]
        );
        assert_eq!(lcs_matches(&fp(&[]), &fp(&["a"])), vec![]);
        // The tie between dropping "x" or matching it late resolves toward
        // advancing the old side first.
        assert_eq!(
            lcs_matches(&fp(&["x", "a"]), &fp(&["a", "x"])),
            vec![(1, 0)]
        );
    }
}
