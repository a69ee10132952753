use std::collections::{HashMap, HashSet};

use super::filter::matches;
use super::{Node, NodeId, Tree};

/// What a flattened row stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Node,
    /// Placeholder after a paginated folder's shown children.
    LoadMore { remaining: usize },
}

/// A flattened representation of a tree node for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    /// The node, or the paginated parent for a `LoadMore` row.
    pub id: NodeId,
    pub parent: NodeId,
    pub depth: usize,
    /// Depth below the display root; direct children are level 1.
    pub level: usize,
    pub visible: bool,
    /// Last visible row under its parent. Used for tree guides.
    pub is_last_sibling: bool,
    pub kind: RowKind,
}

impl FlatRow {
    pub fn is_load_more(&self) -> bool {
        matches!(self.kind, RowKind::LoadMore { .. })
    }
}

/// Inputs that decide which rows are visible.
#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions<'a> {
    /// Display root. Its strict descendants are emitted.
    pub scope: NodeId,
    /// Lowercased filter query. When set, collapse state and pagination are ignored.
    pub needle: Option<&'a str>,
    /// Children shown per expanded container before a `LoadMore` row.
    pub page_size: Option<usize>,
    /// Per-container limits raised by "load more".
    pub page_limits: Option<&'a HashMap<NodeId, usize>>,
}

impl<'a> FlattenOptions<'a> {
    pub fn new(scope: NodeId) -> Self {
        Self {
            scope,
            needle: None,
            page_size: None,
            page_limits: None,
        }
    }

    pub fn needle(mut self, needle: Option<&'a str>) -> Self {
        self.needle = needle;
        self
    }

    pub fn paginate(mut self, page_size: Option<usize>, limits: &'a HashMap<NodeId, usize>) -> Self {
        self.page_size = page_size;
        self.page_limits = Some(limits);
        self
    }

    fn limit_for(&self, id: NodeId) -> Option<usize> {
        if self.needle.is_some() {
            return None;
        }
        let size = self.page_size?;
        Some(
            self.page_limits
                .and_then(|limits| limits.get(&id).copied())
                .unwrap_or(size),
        )
    }
}

impl Default for FlattenOptions<'_> {
    fn default() -> Self {
        Self::new(NodeId::ROOT)
    }
}

/// Project the subtree under `opts.scope` into pre-order rows.
///
/// Every node below the scope gets a row; `visible` says whether it is shown.
/// Always a full pass over the subtree.
pub fn flatten(tree: &Tree, opts: &FlattenOptions<'_>) -> Vec<FlatRow> {
    let mut rows = Vec::with_capacity(tree.len());
    if let Some(scope) = tree.get(opts.scope) {
        walk(tree, scope, 1, true, opts, &mut rows);
    }
    mark_last_siblings(&mut rows);
    rows
}

/// `open` is true when the children of `node` may be shown.
fn walk(
    tree: &Tree,
    node: &Node,
    level: usize,
    open: bool,
    opts: &FlattenOptions<'_>,
    rows: &mut Vec<FlatRow>,
) {
    let total = node.children.len();
    let shown = opts
        .limit_for(node.id)
        .map_or(total, |limit| limit.min(total));

    for (i, child_id) in node.children.iter().enumerate() {
        let Some(child) = tree.get(*child_id) else {
            continue;
        };
        let paged_in = i < shown;
        let visible = match opts.needle {
            Some(needle) => matches(needle, &child.name),
            None => open && paged_in,
        };
        rows.push(FlatRow {
            id: child.id,
            parent: node.id,
            depth: child.depth,
            level,
            visible,
            is_last_sibling: false,
            kind: RowKind::Node,
        });
        walk(
            tree,
            child,
            level + 1,
            open && paged_in && !child.collapsed,
            opts,
            rows,
        );
    }

    if shown < total {
        rows.push(FlatRow {
            id: node.id,
            parent: node.id,
            depth: node.depth + 1,
            level,
            visible: open,
            is_last_sibling: false,
            kind: RowKind::LoadMore {
                remaining: total - shown,
            },
        });
    }
}

fn mark_last_siblings(rows: &mut [FlatRow]) {
    let mut seen: HashSet<NodeId> = HashSet::new();
    for row in rows.iter_mut().rev() {
        row.is_last_sibling = row.visible && seen.insert(row.parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeDraft;

    /// root → A → {B, C}, B → D; all collapsed.
    fn sample() -> (Tree, [NodeId; 4]) {
        let mut tree = Tree::new("sample");
        let a = tree.insert(NodeId::ROOT, NodeDraft::folder("A")).unwrap();
        let b = tree.insert(a, NodeDraft::folder("B")).unwrap();
        let c = tree.insert(a, NodeDraft::folder("C")).unwrap();
        let d = tree.insert(b, NodeDraft::folder("D")).unwrap();
        (tree, [a, b, c, d])
    }

    fn visible(rows: &[FlatRow]) -> Vec<NodeId> {
        rows.iter()
            .filter(|r| r.visible && !r.is_load_more())
            .map(|r| r.id)
            .collect()
    }

    #[test]
    fn emits_every_node_in_preorder() {
        let (tree, [a, b, c, d]) = sample();
        let rows = flatten(&tree, &FlattenOptions::default());
        let ids: Vec<NodeId> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b, d, c]);
    }

    #[test]
    fn collapsed_ancestor_hides_descendants() {
        let (mut tree, [a, b, c, _]) = sample();
        let rows = flatten(&tree, &FlattenOptions::default());
        assert_eq!(visible(&rows), vec![a]);

        tree.set_collapsed(a, false).unwrap();
        let rows = flatten(&tree, &FlattenOptions::default());
        assert_eq!(visible(&rows), vec![a, b, c]);
    }

    #[test]
    fn flatten_is_idempotent() {
        let (mut tree, [a, b, ..]) = sample();
        tree.set_collapsed(a, false).unwrap();
        tree.set_collapsed(b, false).unwrap();
        let first = flatten(&tree, &FlattenOptions::default());
        let second = flatten(&tree, &FlattenOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn filter_ignores_collapse_state() {
        let (tree, [_, _, _, d]) = sample();
        let rows = flatten(&tree, &FlattenOptions::default().needle(Some("d")));
        assert_eq!(visible(&rows), vec![d]);
    }

    #[test]
    fn scope_limits_rows_to_subtree() {
        let (tree, [a, b, c, d]) = sample();
        let rows = flatten(&tree, &FlattenOptions::new(a));
        let ids: Vec<NodeId> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b, d, c]);
        // children of the display root are shown even though A is collapsed
        assert_eq!(visible(&rows), vec![b, c]);
        assert_eq!(rows[0].level, 1);
        assert_eq!(rows[1].level, 2);
    }

    #[test]
    fn last_sibling_tracks_visible_rows() {
        let (mut tree, [a, b, c, _]) = sample();
        tree.set_collapsed(a, false).unwrap();
        let rows = flatten(&tree, &FlattenOptions::default());
        let last: Vec<NodeId> = rows
            .iter()
            .filter(|r| r.is_last_sibling)
            .map(|r| r.id)
            .collect();
        assert_eq!(last, vec![a, c]);
        assert!(!rows.iter().any(|r| r.id == b && r.is_last_sibling));
    }

    #[test]
    fn pagination_adds_load_more_row() {
        let mut tree = Tree::new("t");
        let folder = tree.insert(NodeId::ROOT, NodeDraft::folder("big")).unwrap();
        tree.set_collapsed(folder, false).unwrap();
        let files: Vec<NodeId> = (0..5)
            .map(|i| tree.insert(folder, NodeDraft::file(format!("f{i}"))).unwrap())
            .collect();

        let mut limits = HashMap::new();
        let rows = flatten(
            &tree,
            &FlattenOptions::default().paginate(Some(2), &limits),
        );
        assert_eq!(visible(&rows), vec![folder, files[0], files[1]]);
        let more = rows.iter().find(|r| r.is_load_more()).unwrap();
        assert_eq!(more.id, folder);
        assert_eq!(more.kind, RowKind::LoadMore { remaining: 3 });
        assert!(more.visible && more.is_last_sibling);

        limits.insert(folder, 5);
        let rows = flatten(
            &tree,
            &FlattenOptions::default().paginate(Some(2), &limits),
        );
        assert!(!rows.iter().any(|r| r.is_load_more()));
        assert_eq!(visible(&rows).len(), 6);
    }

    #[test]
    fn pagination_is_ignored_while_filtering() {
        let mut tree = Tree::new("t");
        let folder = tree.insert(NodeId::ROOT, NodeDraft::folder("big")).unwrap();
        for i in 0..4 {
            tree.insert(folder, NodeDraft::file(format!("f{i}"))).unwrap();
        }
        let limits = HashMap::new();
        let rows = flatten(
            &tree,
            &FlattenOptions::default()
                .paginate(Some(1), &limits)
                .needle(Some("f")),
        );
        assert!(!rows.iter().any(|r| r.is_load_more()));
        assert_eq!(visible(&rows).len(), 4);
    }
}
