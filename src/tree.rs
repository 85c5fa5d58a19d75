//! Key column -> nested translation tree.
//!
//! Building happens in two phases:
//!
//! 1. [`Skeleton::build`] scans the key column once. Every usable key becomes a leaf holding
//!    the row it came from; dotted keys (`a.b.c`) become nested branches unless flat mode is
//!    on.
//! 2. [`Skeleton::fill`] produces a fresh [`LangTree`] for one language column, replacing each
//!    leaf by the cell text, the placeholder, or dropping it when the cell is empty.
//!
//! The skeleton is never mutated by filling, so one skeleton serves every column of a sheet.
//!
//! ```rust
//! use lang_util::table::parse_table;
//! use lang_util::tree::Skeleton;
//! use lang_util::types::Table;
//!
//! let table = Table::from_rows([
//!     vec!["key", "ENG"],
//!     vec!["a.b", "1"],
//!     vec!["a.c", "2"],
//!     vec!["d", "3"],
//! ]);
//! let parsed = parse_table(&table).unwrap();
//! let skeleton = Skeleton::build(&parsed, false);
//! let tree = skeleton.fill(&parsed, 1, None);
//! assert_eq!(tree.to_json_compact().unwrap(), r#"{"a":{"b":"1","c":"2"},"d":"3"}"#);
//! ```

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};

use crate::error::LangResult;
use crate::observability::Diagnostic;
use crate::table::ParsedTable;

/// A skeleton position: either the table row a leaf value comes from, or a nested mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkeletonNode {
    /// Table row index (header is row 0).
    Leaf(usize),
    /// Nested segments in first-seen order.
    Branch(IndexMap<String, SkeletonNode>),
}

impl SkeletonNode {
    fn collect_leaves(&self, prefix: &str, out: &mut Vec<(String, usize)>) {
        match self {
            SkeletonNode::Leaf(row) => out.push((prefix.to_string(), *row)),
            SkeletonNode::Branch(map) => {
                for (k, v) in map {
                    v.collect_leaves(&join_key(prefix, k), out);
                }
            }
        }
    }
}

/// Tree shape derived from a table's key column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skeleton {
    root: IndexMap<String, SkeletonNode>,
    diagnostics: Vec<Diagnostic>,
}

impl Skeleton {
    /// Scan the key column of `table` and build the skeleton.
    ///
    /// - empty keys are skipped ([`Diagnostic::EmptyKey`])
    /// - keys without `.`, or every key when `flat` is set, are top-level leaves
    /// - dotted keys starting with `.` are skipped ([`Diagnostic::IllegalKey`])
    /// - other dotted keys are merged in as nested branches
    ///
    /// When two rows claim the same position, or one row's path runs through another row's
    /// leaf, the later row wins and the displaced row is reported as
    /// [`Diagnostic::ShadowedKey`]. The winning entry keeps its first-seen position.
    pub fn build(table: &ParsedTable<'_>, flat: bool) -> Self {
        let mut skeleton = Skeleton::default();

        for (row, _) in table.data_rows() {
            let key = table.key(row);
            if key.is_empty() {
                skeleton
                    .diagnostics
                    .push(Diagnostic::EmptyKey { row: row + 1 });
                continue;
            }

            if flat || !key.contains('.') {
                skeleton.insert_leaf(key, row);
            } else if key.starts_with('.') {
                skeleton.diagnostics.push(Diagnostic::IllegalKey {
                    row: row + 1,
                    key: key.to_string(),
                });
            } else {
                let segments: Vec<&str> = key.split('.').collect();
                let (head, chain) = build_chain(&segments, row);
                merge_node(
                    &mut skeleton.root,
                    head,
                    chain,
                    "",
                    row,
                    &mut skeleton.diagnostics,
                );
            }
        }

        skeleton
    }

    fn insert_leaf(&mut self, key: &str, row: usize) {
        if let Some(old) = self.root.insert(key.to_string(), SkeletonNode::Leaf(row)) {
            report_shadowed(&old, key, row, &mut self.diagnostics);
        }
    }

    /// Top-level entries.
    pub fn root(&self) -> &IndexMap<String, SkeletonNode> {
        &self.root
    }

    /// Diagnostics raised while scanning the key column, in row order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// `true` when no key produced a leaf.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Build the tree for one column.
    ///
    /// Each leaf takes the cell at `(leaf row, column)`. Empty or missing cells become
    /// `placeholder` when one is given (and non-empty); otherwise the entry is left out. A
    /// branch whose entries are all left out stays as an empty object.
    pub fn fill(
        &self,
        table: &ParsedTable<'_>,
        column: usize,
        placeholder: Option<&str>,
    ) -> LangTree {
        let placeholder = placeholder.filter(|p| !p.is_empty());
        fill_map(&self.root, table, column, placeholder)
    }
}

// `a.b.c` -> ("a", {b: {c: row}})
fn build_chain(segments: &[&str], row: usize) -> (String, SkeletonNode) {
    let mut node = SkeletonNode::Leaf(row);
    for seg in segments[1..].iter().rev() {
        let mut map = IndexMap::new();
        map.insert((*seg).to_string(), node);
        node = SkeletonNode::Branch(map);
    }
    (segments[0].to_string(), node)
}

fn merge_node(
    map: &mut IndexMap<String, SkeletonNode>,
    key: String,
    incoming: SkeletonNode,
    prefix: &str,
    row: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let path = join_key(prefix, &key);
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(incoming);
        }
        Entry::Occupied(mut slot) => {
            if let SkeletonNode::Branch(children) = incoming {
                if let SkeletonNode::Branch(existing) = slot.get_mut() {
                    for (k, v) in children {
                        merge_node(existing, k, v, &path, row, diagnostics);
                    }
                    return;
                }
                let old = slot.insert(SkeletonNode::Branch(children));
                report_shadowed(&old, &path, row, diagnostics);
            } else {
                let old = slot.insert(incoming);
                report_shadowed(&old, &path, row, diagnostics);
            }
        }
    }
}

fn report_shadowed(
    old: &SkeletonNode,
    path: &str,
    by_row: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut leaves = Vec::new();
    old.collect_leaves(path, &mut leaves);
    for (key, row) in leaves {
        diagnostics.push(Diagnostic::ShadowedKey {
            key,
            row: row + 1,
            by_row: by_row + 1,
        });
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn fill_map(
    map: &IndexMap<String, SkeletonNode>,
    table: &ParsedTable<'_>,
    column: usize,
    placeholder: Option<&str>,
) -> LangTree {
    let entries = map.iter().filter_map(|(key, node)| {
        let filled = match node {
            SkeletonNode::Leaf(row) => {
                let cell = table.cell(*row, column);
                if !cell.is_empty() {
                    Some(LangNode::Text(cell.to_string()))
                } else {
                    placeholder.map(|p| LangNode::Text(p.to_string()))
                }
            }
            SkeletonNode::Branch(children) => {
                Some(LangNode::Branch(fill_map(children, table, column, placeholder)))
            }
        };
        filled.map(|n| (key.clone(), n))
    });
    LangTree(entries.collect())
}

/// A filled tree position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LangNode {
    /// Translated text (or placeholder).
    Text(String),
    /// Nested object.
    Branch(LangTree),
}

/// A filled translation tree for one language column.
///
/// Serializes as a JSON object with keys in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangTree(IndexMap<String, LangNode>);

impl LangTree {
    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Look up a node by segment list, e.g. `&["a", "b"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<&LangNode> {
        let (first, rest) = path.split_first()?;
        let node = self.0.get(*first)?;
        if rest.is_empty() {
            return Some(node);
        }
        match node {
            LangNode::Branch(child) => child.get_path(rest),
            LangNode::Text(_) => None,
        }
    }

    /// Convert to a `serde_json::Value` (object key order is preserved).
    pub fn to_json_value(&self) -> LangResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Single-line JSON.
    pub fn to_json_compact(&self) -> LangResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pretty JSON with 4-space indentation, the on-disk format of output files.
    pub fn to_json_pretty(&self) -> LangResult<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_table;
    use crate::types::Table;

    fn table(rows: &[(&str, &str)]) -> Table {
        let mut out = vec![vec!["key".to_string(), "ENG".to_string()]];
        out.extend(rows.iter().map(|(k, v)| vec![k.to_string(), v.to_string()]));
        Table::new(out)
    }

    fn build(t: &Table, flat: bool, placeholder: Option<&str>) -> (LangTree, Vec<Diagnostic>) {
        let parsed = parse_table(t).unwrap();
        let skeleton = Skeleton::build(&parsed, flat);
        (skeleton.fill(&parsed, 1, placeholder), skeleton.diagnostics().to_vec())
    }

    fn compact(tree: &LangTree) -> String {
        tree.to_json_compact().unwrap()
    }

    #[test]
    fn nests_dotted_keys_in_first_seen_order() {
        let t = table(&[("a.b", "1"), ("a.c", "2"), ("d", "3")]);
        let (tree, diags) = build(&t, false, None);
        assert_eq!(compact(&tree), r#"{"a":{"b":"1","c":"2"},"d":"3"}"#);
        assert!(diags.is_empty());
    }

    #[test]
    fn empty_cell_is_omitted_but_parent_object_kept() {
        let t = table(&[("a.b", "")]);
        let (tree, _) = build(&t, false, None);
        assert_eq!(compact(&tree), r#"{"a":{}}"#);
        assert!(tree.get_path(&["a", "b"]).is_none());
    }

    #[test]
    fn empty_cell_uses_placeholder() {
        let t = table(&[("a.b", "")]);
        let (tree, _) = build(&t, false, Some("N/A"));
        assert_eq!(compact(&tree), r#"{"a":{"b":"N/A"}}"#);
    }

    #[test]
    fn empty_placeholder_behaves_like_none() {
        let t = table(&[("x", "")]);
        let (tree, _) = build(&t, false, Some(""));
        assert!(tree.is_empty());
    }

    #[test]
    fn flat_mode_keeps_dots_literal() {
        let t = table(&[("a.b", "v"), (".hidden", "h")]);
        let (tree, diags) = build(&t, true, None);
        assert_eq!(compact(&tree), r#"{"a.b":"v",".hidden":"h"}"#);
        assert!(diags.is_empty());
    }

    #[test]
    fn skips_empty_and_leading_dot_keys_with_diagnostics() {
        let t = table(&[("", "x"), (".a", "y"), ("ok", "z")]);
        let (tree, diags) = build(&t, false, None);
        assert_eq!(compact(&tree), r#"{"ok":"z"}"#);
        assert_eq!(
            diags,
            vec![
                Diagnostic::EmptyKey { row: 2 },
                Diagnostic::IllegalKey {
                    row: 3,
                    key: ".a".to_string()
                },
            ]
        );
    }

    #[test]
    fn duplicate_key_last_writer_wins_in_first_position() {
        let t = table(&[("a.b", "first"), ("z", "z"), ("a.b", "second")]);
        let (tree, diags) = build(&t, false, None);
        assert_eq!(compact(&tree), r#"{"a":{"b":"second"},"z":"z"}"#);
        assert_eq!(
            diags,
            vec![Diagnostic::ShadowedKey {
                key: "a.b".to_string(),
                row: 2,
                by_row: 4
            }]
        );
    }

    #[test]
    fn leaf_is_promoted_to_branch_by_longer_path() {
        let t = table(&[("a", "plain"), ("a.b", "nested")]);
        let (tree, diags) = build(&t, false, None);
        assert_eq!(compact(&tree), r#"{"a":{"b":"nested"}}"#);
        assert_eq!(
            diags,
            vec![Diagnostic::ShadowedKey {
                key: "a".to_string(),
                row: 2,
                by_row: 3
            }]
        );
    }

    #[test]
    fn later_leaf_replaces_branch() {
        let t = table(&[("a.b", "1"), ("a.c", "2"), ("a", "flat")]);
        let (tree, diags) = build(&t, false, None);
        assert_eq!(compact(&tree), r#"{"a":"flat"}"#);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn deep_merge_keeps_siblings() {
        let t = table(&[("a.b.c", "1"), ("a.b.d", "2"), ("a.e", "3")]);
        let (tree, _) = build(&t, false, None);
        assert_eq!(compact(&tree), r#"{"a":{"b":{"c":"1","d":"2"},"e":"3"}}"#);
    }

    #[test]
    fn columns_are_filled_independently() {
        let t = Table::from_rows([
            vec!["key", "ENG", "CHS"],
            vec!["greet.hi", "hello", ""],
            vec!["bye", "", "zaijian"],
        ]);
        let parsed = parse_table(&t).unwrap();
        let skeleton = Skeleton::build(&parsed, false);
        let eng = skeleton.fill(&parsed, 1, None);
        let chs = skeleton.fill(&parsed, 2, None);
        assert_eq!(compact(&eng), r#"{"greet":{"hi":"hello"}}"#);
        assert_eq!(compact(&chs), r#"{"greet":{},"bye":"zaijian"}"#);
    }

    #[test]
    fn missing_cells_in_ragged_rows_are_empty() {
        let t = Table::from_rows([vec!["key", "ENG", "CHS"], vec!["a", "x"]]);
        let parsed = parse_table(&t).unwrap();
        let skeleton = Skeleton::build(&parsed, false);
        assert!(skeleton.fill(&parsed, 2, None).is_empty());
        assert_eq!(compact(&skeleton.fill(&parsed, 2, Some("-"))), r#"{"a":"-"}"#);
    }

    #[test]
    fn json_round_trip_is_structurally_identical() {
        let t = table(&[("a.b", "1"), ("a.c", ""), ("d", "3"), ("e.f.g", "4")]);
        let (tree, _) = build(&t, false, None);
        let bytes = tree.to_json_pretty().unwrap();
        let back: LangTree = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn pretty_output_uses_four_space_indent() {
        let t = table(&[("a.b", "1")]);
        let (tree, _) = build(&t, false, None);
        let text = String::from_utf8(tree.to_json_pretty().unwrap()).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": \"1\"\n    }\n}");
    }
}
