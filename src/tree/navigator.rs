use tracing::warn;

use super::{NodeId, Tree};
use crate::error::{GridError, Result};

/// Breadcrumb drill-down state.
///
/// `path` is the chain from the top-level ancestor to the entered node.
/// Empty means the display root is the tree root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    path: Vec<NodeId>,
}

impl Navigator {
    pub fn current(&self) -> NodeId {
        self.path.last().copied().unwrap_or(NodeId::ROOT)
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn is_at_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Make `id` the display root. Unknown ids and files leave the state unchanged.
    pub fn enter(&mut self, tree: &Tree, id: NodeId) -> Result<()> {
        if id.is_root() {
            self.path.clear();
            return Ok(());
        }
        let node = match tree.node(id) {
            Ok(node) => node,
            Err(e) => {
                warn!(%id, "cannot navigate to missing node");
                return Err(e);
            }
        };
        if !node.is_container() {
            warn!(%id, "cannot navigate into a file");
            return Err(GridError::NotAContainer(id));
        }
        self.path = tree.path_to(id);
        Ok(())
    }

    /// Go up one level. Returns the node that was left.
    pub fn exit(&mut self) -> Option<NodeId> {
        self.path.pop()
    }

    /// Truncate to the `index`-th breadcrumb; `0` is the root.
    pub fn crumb(&mut self, index: usize) -> Result<()> {
        if index > self.path.len() {
            warn!(index, depth = self.path.len(), "breadcrumb out of range");
            return Err(GridError::InvalidCrumb(index));
        }
        self.path.truncate(index);
        Ok(())
    }

    /// Re-derive the path after structural changes.
    ///
    /// Keeps the longest prefix that still exists and rebuilds it from the
    /// current ancestor chain, so deletes fall back to the nearest survivor
    /// and moves pick up the new location.
    pub fn repair(&mut self, tree: &Tree) {
        let surviving = self
            .path
            .iter()
            .take_while(|id| tree.contains(**id))
            .last()
            .copied();
        self.path = match surviving {
            Some(id) => tree.path_to(id),
            None => Vec::new(),
        };
    }

    /// Labels for the breadcrumb bar, root title first.
    pub fn breadcrumbs(&self, tree: &Tree) -> Vec<(NodeId, String)> {
        let mut crumbs = vec![(NodeId::ROOT, tree.title().to_string())];
        crumbs.extend(
            self.path
                .iter()
                .filter_map(|id| tree.get(*id).map(|n| (*id, n.name.clone()))),
        );
        crumbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeDraft;

    fn sample() -> (Tree, [NodeId; 4]) {
        let mut tree = Tree::new("Lab");
        let a = tree.insert(NodeId::ROOT, NodeDraft::folder("A")).unwrap();
        let b = tree.insert(a, NodeDraft::folder("B")).unwrap();
        let c = tree.insert(a, NodeDraft::file("c.txt")).unwrap();
        let d = tree.insert(b, NodeDraft::folder("D")).unwrap();
        (tree, [a, b, c, d])
    }

    #[test]
    fn starts_at_root() {
        let nav = Navigator::default();
        assert_eq!(nav.current(), NodeId::ROOT);
        assert!(nav.is_at_root());
    }

    #[test]
    fn enter_builds_ancestor_path() {
        let (tree, [a, b, _, d]) = sample();
        let mut nav = Navigator::default();
        nav.enter(&tree, d).unwrap();
        assert_eq!(nav.path(), &[a, b, d]);
        assert_eq!(nav.current(), d);
    }

    #[test]
    fn enter_missing_or_file_keeps_state() {
        let (tree, [a, _, c, _]) = sample();
        let mut nav = Navigator::default();
        nav.enter(&tree, a).unwrap();
        assert!(matches!(nav.enter(&tree, NodeId(77)), Err(GridError::NotFound(_))));
        assert!(matches!(nav.enter(&tree, c), Err(GridError::NotAContainer(_))));
        assert_eq!(nav.current(), a);
    }

    #[test]
    fn exit_and_crumb_truncate() {
        let (tree, [a, b, _, d]) = sample();
        let mut nav = Navigator::default();
        nav.enter(&tree, d).unwrap();
        assert_eq!(nav.exit(), Some(d));
        assert_eq!(nav.current(), b);
        nav.crumb(1).unwrap();
        assert_eq!(nav.path(), &[a]);
        assert!(nav.crumb(5).is_err());
        nav.crumb(0).unwrap();
        assert!(nav.is_at_root());
        assert_eq!(nav.exit(), None);
    }

    #[test]
    fn repair_after_delete_falls_back_to_survivor() {
        let (mut tree, [a, b, _, d]) = sample();
        let mut nav = Navigator::default();
        nav.enter(&tree, d).unwrap();
        tree.delete(b).unwrap();
        nav.repair(&tree);
        assert_eq!(nav.path(), &[a]);
    }

    #[test]
    fn repair_after_move_follows_node() {
        let (mut tree, [_, b, _, d]) = sample();
        let mut nav = Navigator::default();
        nav.enter(&tree, d).unwrap();
        tree.move_node(b, NodeId::ROOT).unwrap();
        nav.repair(&tree);
        assert_eq!(nav.path(), &[b, d]);
    }

    #[test]
    fn breadcrumbs_start_with_title() {
        let (tree, [_, b, ..]) = sample();
        let mut nav = Navigator::default();
        nav.enter(&tree, b).unwrap();
        let labels: Vec<String> = nav.breadcrumbs(&tree).into_iter().map(|(_, l)| l).collect();
        assert_eq!(labels, ["Lab", "A", "B"]);
    }
}
