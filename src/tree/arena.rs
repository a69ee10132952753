use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use super::node::validate_name;
use super::{Mutation, Node, NodeDraft, NodeId, TreeChange};
use crate::error::{GridError, Result};

/// Ownership tree stored as an arena keyed by [`NodeId`].
///
/// The arena is the id index: every id in any `children` list resolves in it,
/// and every node except the root has exactly one parent. All mutators keep
/// that true or fail without touching anything.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: HashMap<NodeId, Node>,
    keys: HashMap<String, NodeId>,
    next_id: u64,
}

/// Serializable pre-order image of a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSnapshot {
    pub nodes: Vec<Node>,
}

/// Strict ancestors of a node, nearest first, ending at the root.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

impl Tree {
    /// Create an empty tree whose root sentinel carries `title`.
    pub fn new(title: impl Into<String>) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::ROOT, Node::root(title.into()));
        Self {
            nodes,
            keys: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn title(&self) -> &str {
        self.nodes
            .get(&NodeId::ROOT)
            .map_or("", |root| root.name.as_str())
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Like [`get`](Self::get), but a missing id is a `NotFound` error.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(GridError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(GridError::NotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_key(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Whether `ancestor` appears on the path from `id` up to the root.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// `id` is `scope` or lies below it.
    pub fn is_within(&self, id: NodeId, scope: NodeId) -> bool {
        id == scope || self.is_descendant_of(id, scope)
    }

    /// Chain from the top-level ancestor down to `id`, root excluded.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        if id.is_root() || !self.contains(id) {
            return Vec::new();
        }
        let mut path: Vec<NodeId> = self.ancestors(id).filter(|a| !a.is_root()).collect();
        path.reverse();
        path.push(id);
        path
    }

    /// Pre-order ids of the subtree rooted at `id`, `id` first.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Pre-order ids of every node except the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut ids = self.subtree(NodeId::ROOT);
        ids.remove(0);
        ids
    }

    // ── Mutators ─────────────────────────────────────────────────────────────

    /// Append a new node as the last child of `parent` and expand the parent.
    pub fn add(&mut self, parent: NodeId, mut draft: NodeDraft) -> Result<TreeChange> {
        validate_name(&draft.name)?;
        draft.name = draft.name.trim().to_string();
        let id = self.insert(parent, draft)?;
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.collapsed = false;
        }
        debug!(%id, %parent, "node added");
        Ok(TreeChange::Added { id, parent })
    }

    /// Append without name validation or expanding the parent. Used by seeding.
    pub(crate) fn insert(&mut self, parent: NodeId, draft: NodeDraft) -> Result<NodeId> {
        self.check_insert(parent, &draft)?;

        let id = NodeId(self.next_id);
        self.next_id += 1;
        let key = match draft.key {
            Some(key) => key,
            None => self.generate_key(id),
        };
        let depth = self.node(parent)?.depth + 1;

        self.keys.insert(key.clone(), id);
        self.nodes.insert(
            id,
            Node {
                id,
                key,
                name: draft.name,
                kind: draft.kind,
                parent: Some(parent),
                children: Vec::new(),
                depth,
                collapsed: true,
                attributes: draft.attributes,
            },
        );
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    fn check_insert(&self, parent: NodeId, draft: &NodeDraft) -> Result<()> {
        let p = self.node(parent)?;
        if !p.is_container() {
            return Err(GridError::NotAContainer(parent));
        }
        if let Some(key) = &draft.key {
            if key.is_empty() || self.keys.contains_key(key) {
                return Err(GridError::DuplicateKey(key.clone()));
            }
        }
        Ok(())
    }

    fn generate_key(&self, id: NodeId) -> String {
        let mut key = format!("local-{}", id.0);
        let mut n = 1;
        while self.keys.contains_key(&key) {
            key = format!("local-{}-{}", id.0, n);
            n += 1;
        }
        key
    }

    /// Re-parent `node` under `dest` as its last child.
    ///
    /// Rejected when `dest` is `node` or lies below it, so the tree stays acyclic.
    pub fn move_node(&mut self, node: NodeId, dest: NodeId) -> Result<TreeChange> {
        self.check_move(node, dest)?;
        let from = self.parent(node).ok_or(GridError::NotFound(node))?;

        self.node_mut(from)?.children.retain(|c| *c != node);
        let dest_depth = {
            let d = self.node_mut(dest)?;
            d.children.push(node);
            d.depth
        };
        self.node_mut(node)?.parent = Some(dest);
        self.reassign_depths(node, dest_depth + 1);

        debug!(%node, %from, to = %dest, "node moved");
        Ok(TreeChange::Moved {
            id: node,
            from,
            to: dest,
        })
    }

    fn check_move(&self, node: NodeId, dest: NodeId) -> Result<()> {
        if node.is_root() {
            return Err(GridError::InvalidMove { node, dest });
        }
        self.node(node)?;
        let d = self.node(dest)?;
        if dest == node || self.is_descendant_of(dest, node) {
            return Err(GridError::InvalidMove { node, dest });
        }
        if !d.is_container() {
            return Err(GridError::NotAContainer(dest));
        }
        Ok(())
    }

    fn reassign_depths(&mut self, id: NodeId, depth: usize) {
        let mut stack = vec![(id, depth)];
        while let Some((current, d)) = stack.pop() {
            if let Some(n) = self.nodes.get_mut(&current) {
                n.depth = d;
                stack.extend(n.children.iter().map(|c| (*c, d + 1)));
            }
        }
    }

    /// Remove `node` and its whole subtree. Deleting the root is a no-op.
    pub fn delete(&mut self, node: NodeId) -> Result<Option<TreeChange>> {
        if node.is_root() {
            return Ok(None);
        }
        let parent = self.node(node)?.parent.ok_or(GridError::NotFound(node))?;
        let removed = self.subtree(node);
        for id in &removed {
            if let Some(n) = self.nodes.remove(id) {
                self.keys.remove(&n.key);
            }
        }
        self.node_mut(parent)?.children.retain(|c| *c != node);

        debug!(%node, count = removed.len(), "subtree deleted");
        Ok(Some(TreeChange::Removed {
            id: node,
            parent,
            removed,
        }))
    }

    pub fn rename(&mut self, node: NodeId, name: &str) -> Result<TreeChange> {
        self.check_rename(node, name)?;
        let name = name.trim().to_string();
        self.node_mut(node)?.name = name.clone();
        Ok(TreeChange::Renamed { id: node, name })
    }

    fn check_rename(&self, node: NodeId, name: &str) -> Result<()> {
        if node.is_root() {
            return Err(GridError::InvalidName("the root cannot be renamed".into()));
        }
        self.node(node)?;
        validate_name(name)
    }

    /// Set the collapse flag. `None` when nothing changed (root, files, same state).
    pub fn set_collapsed(&mut self, node: NodeId, collapsed: bool) -> Result<Option<TreeChange>> {
        if node.is_root() {
            return Ok(None);
        }
        let n = self.node_mut(node)?;
        if !n.is_container() || n.collapsed == collapsed {
            return Ok(None);
        }
        n.collapsed = collapsed;
        Ok(Some(TreeChange::Toggled {
            id: node,
            collapsed,
        }))
    }

    pub fn toggle(&mut self, node: NodeId) -> Result<Option<TreeChange>> {
        let collapsed = self.node(node)?.collapsed;
        self.set_collapsed(node, !collapsed)
    }

    /// Run every check `apply` would run, without changing anything.
    pub fn validate(&self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::Add { parent, draft } => {
                validate_name(&draft.name)?;
                self.check_insert(*parent, draft)
            }
            Mutation::Move { node, dest } => self.check_move(*node, *dest),
            Mutation::Delete { node } => {
                if !node.is_root() {
                    self.node(*node)?;
                }
                Ok(())
            }
            Mutation::Rename { node, name } => self.check_rename(*node, name),
        }
    }

    pub fn apply(&mut self, mutation: Mutation) -> Result<Option<TreeChange>> {
        match mutation {
            Mutation::Add { parent, draft } => self.add(parent, draft).map(Some),
            Mutation::Move { node, dest } => self.move_node(node, dest).map(Some),
            Mutation::Delete { node } => self.delete(node),
            Mutation::Rename { node, name } => self.rename(node, &name).map(Some),
        }
    }

    /// Reorder the direct children of `parent` with a stable sort.
    pub(crate) fn sort_children_by<F>(&mut self, parent: NodeId, mut compare: F)
    where
        F: FnMut(&Node, &Node) -> Ordering,
    {
        let mut kids = match self.nodes.get_mut(&parent) {
            Some(n) => std::mem::take(&mut n.children),
            None => return,
        };
        let nodes = &self.nodes;
        kids.sort_by(|a, b| match (nodes.get(a), nodes.get(b)) {
            (Some(x), Some(y)) => compare(x, y),
            _ => Ordering::Equal,
        });
        if let Some(n) = self.nodes.get_mut(&parent) {
            n.children = kids;
        }
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            nodes: self
                .subtree(NodeId::ROOT)
                .into_iter()
                .filter_map(|id| self.nodes.get(&id).cloned())
                .collect(),
        }
    }

    /// Verify the structural invariants. Returns the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (id, node) in &self.nodes {
            if node.id != *id {
                return Err(format!("{} stored under {}", node.id, id));
            }
            match node.parent {
                None if id.is_root() => {
                    if node.depth != 0 {
                        return Err("root depth is not 0".into());
                    }
                }
                None => return Err(format!("{} has no parent", id)),
                Some(p) => {
                    let parent = self
                        .nodes
                        .get(&p)
                        .ok_or_else(|| format!("{} has dangling parent {}", id, p))?;
                    let count = parent.children.iter().filter(|c| *c == id).count();
                    if count != 1 {
                        return Err(format!("{} listed {} times under {}", id, count, p));
                    }
                    if node.depth != parent.depth + 1 {
                        return Err(format!("{} has depth {}", id, node.depth));
                    }
                }
            }
            for child in &node.children {
                match self.nodes.get(child) {
                    Some(c) if c.parent == Some(*id) => {}
                    Some(_) => return Err(format!("{} does not point back at {}", child, id)),
                    None => return Err(format!("{} lists missing child {}", id, child)),
                }
            }
            if !id.is_root() && self.keys.get(&node.key) != Some(id) {
                return Err(format!("key '{}' is not indexed for {}", node.key, id));
            }
        }
        let reachable: HashSet<NodeId> = self.subtree(NodeId::ROOT).into_iter().collect();
        if reachable.len() != self.nodes.len() {
            return Err("unreachable nodes in the arena".into());
        }
        if self.keys.len() != self.len() {
            return Err("key index out of sync".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root → A → {B, C}, B → D
    fn sample() -> (Tree, [NodeId; 4]) {
        let mut tree = Tree::new("sample");
        let a = tree.insert(NodeId::ROOT, NodeDraft::folder("A")).unwrap();
        let b = tree.insert(a, NodeDraft::folder("B")).unwrap();
        let c = tree.insert(a, NodeDraft::folder("C")).unwrap();
        let d = tree.insert(b, NodeDraft::folder("D")).unwrap();
        (tree, [a, b, c, d])
    }

    #[test]
    fn new_tree_is_empty() {
        let tree = Tree::new("empty");
        assert!(tree.is_empty());
        assert_eq!(tree.title(), "empty");
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn insert_sets_depth_and_parent() {
        let (tree, [a, b, _, d]) = sample();
        assert_eq!(tree.node(a).unwrap().depth, 1);
        assert_eq!(tree.node(d).unwrap().depth, 3);
        assert_eq!(tree.parent(d), Some(b));
        assert!(tree.node(a).unwrap().collapsed);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn add_appends_last_and_expands_parent() {
        let (mut tree, [a, b, c, _]) = sample();
        let change = tree.add(a, NodeDraft::file("notes.txt")).unwrap();
        let TreeChange::Added { id, parent } = change else {
            panic!("expected Added");
        };
        assert_eq!(parent, a);
        assert_eq!(tree.children(a), &[b, c, id]);
        assert!(!tree.node(a).unwrap().collapsed);
    }

    #[test]
    fn add_to_missing_parent_is_not_found() {
        let (mut tree, _) = sample();
        let err = tree.add(NodeId(99), NodeDraft::file("x")).unwrap_err();
        assert!(matches!(err, GridError::NotFound(NodeId(99))));
    }

    #[test]
    fn add_to_file_is_rejected() {
        let (mut tree, [a, ..]) = sample();
        let f = tree.insert(a, NodeDraft::file("f")).unwrap();
        let err = tree.add(f, NodeDraft::file("g")).unwrap_err();
        assert!(matches!(err, GridError::NotAContainer(id) if id == f));
    }

    #[test]
    fn add_duplicate_key_is_rejected() {
        let mut tree = Tree::new("t");
        tree.add(NodeId::ROOT, NodeDraft::file("a").with_key("k1"))
            .unwrap();
        let err = tree
            .add(NodeId::ROOT, NodeDraft::file("b").with_key("k1"))
            .unwrap_err();
        assert!(matches!(err, GridError::DuplicateKey(_)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn generated_keys_are_unique() {
        let mut tree = Tree::new("t");
        tree.add(NodeId::ROOT, NodeDraft::file("taken").with_key("local-2"))
            .unwrap();
        tree.add(NodeId::ROOT, NodeDraft::file("second")).unwrap();
        assert!(tree.check_invariants().is_ok());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn move_reparents_and_recomputes_depth() {
        let (mut tree, [a, b, c, d]) = sample();
        tree.move_node(c, d).unwrap();
        assert_eq!(tree.parent(c), Some(d));
        assert_eq!(tree.node(c).unwrap().depth, tree.node(d).unwrap().depth + 1);
        assert_eq!(tree.children(a), &[b]);
        assert_eq!(tree.preorder(), vec![a, b, d, c]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn move_subtree_updates_descendant_depths() {
        let (mut tree, [a, b, _, d]) = sample();
        tree.move_node(b, NodeId::ROOT).unwrap();
        assert_eq!(tree.node(b).unwrap().depth, 1);
        assert_eq!(tree.node(d).unwrap().depth, 2);
        assert!(!tree.is_descendant_of(d, a));
    }

    #[test]
    fn move_into_self_or_descendant_fails_unchanged() {
        let (mut tree, [a, b, _, d]) = sample();
        let before = serde_json::to_string(&tree.snapshot()).unwrap();
        for dest in [a, b, d] {
            let err = tree.move_node(a, dest).unwrap_err();
            assert!(matches!(err, GridError::InvalidMove { .. }));
        }
        assert_eq!(serde_json::to_string(&tree.snapshot()).unwrap(), before);
    }

    #[test]
    fn move_root_fails() {
        let (mut tree, [a, ..]) = sample();
        assert!(matches!(
            tree.move_node(NodeId::ROOT, a),
            Err(GridError::InvalidMove { .. })
        ));
    }

    #[test]
    fn delete_removes_whole_subtree() {
        let (mut tree, [a, b, c, d]) = sample();
        let change = tree.delete(b).unwrap().unwrap();
        assert_eq!(
            change,
            TreeChange::Removed {
                id: b,
                parent: a,
                removed: vec![b, d],
            }
        );
        assert!(!tree.contains(b));
        assert!(!tree.contains(d));
        assert_eq!(tree.children(a), &[c]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn delete_frees_keys() {
        let mut tree = Tree::new("t");
        let id = match tree
            .add(NodeId::ROOT, NodeDraft::file("a").with_key("k"))
            .unwrap()
        {
            TreeChange::Added { id, .. } => id,
            other => panic!("unexpected {other:?}"),
        };
        tree.delete(id).unwrap();
        assert_eq!(tree.find_by_key("k"), None);
        assert!(tree
            .add(NodeId::ROOT, NodeDraft::file("b").with_key("k"))
            .is_ok());
    }

    #[test]
    fn delete_root_is_noop() {
        let (mut tree, _) = sample();
        assert_eq!(tree.delete(NodeId::ROOT).unwrap(), None);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn add_stores_trimmed_name() {
        let (mut tree, [a, ..]) = sample();
        let TreeChange::Added { id, .. } = tree.add(a, NodeDraft::file("  notes.md  ")).unwrap() else {
            panic!("expected Added");
        };
        assert_eq!(tree.node(id).unwrap().name, "notes.md");
        assert!(matches!(
            tree.add(a, NodeDraft::file("   ")),
            Err(GridError::InvalidName(_))
        ));
    }

    #[test]
    fn rename_trims_and_validates() {
        let (mut tree, [a, ..]) = sample();
        tree.rename(a, "  Alpha ").unwrap();
        assert_eq!(tree.node(a).unwrap().name, "Alpha");
        assert!(matches!(tree.rename(a, ""), Err(GridError::InvalidName(_))));
        assert!(tree.rename(NodeId::ROOT, "x").is_err());
    }

    #[test]
    fn toggle_flips_containers_only() {
        let (mut tree, [a, ..]) = sample();
        let change = tree.toggle(a).unwrap();
        assert_eq!(
            change,
            Some(TreeChange::Toggled {
                id: a,
                collapsed: false
            })
        );
        let f = tree.insert(a, NodeDraft::file("f")).unwrap();
        assert_eq!(tree.toggle(f).unwrap(), None);
        assert_eq!(tree.set_collapsed(NodeId::ROOT, true).unwrap(), None);
    }

    #[test]
    fn validate_does_not_mutate() {
        let (tree, [a, b, ..]) = sample();
        let before = tree.snapshot();
        assert!(tree.validate(&Mutation::Move { node: a, dest: b }).is_err());
        assert!(tree
            .validate(&Mutation::Add {
                parent: b,
                draft: NodeDraft::file("ok"),
            })
            .is_ok());
        assert!(tree.validate(&Mutation::Delete { node: NodeId(42) }).is_err());
        assert_eq!(tree.snapshot(), before);
    }

    #[test]
    fn path_to_excludes_root() {
        let (tree, [a, b, _, d]) = sample();
        assert_eq!(tree.path_to(d), vec![a, b, d]);
        assert!(tree.path_to(NodeId::ROOT).is_empty());
        assert!(tree.is_within(d, a));
        assert!(tree.is_within(a, a));
        assert!(!tree.is_within(a, d));
    }

    #[test]
    fn sort_children_is_stable() {
        let mut tree = Tree::new("t");
        let x = tree.insert(NodeId::ROOT, NodeDraft::file("same")).unwrap();
        let y = tree.insert(NodeId::ROOT, NodeDraft::file("Same")).unwrap();
        let z = tree.insert(NodeId::ROOT, NodeDraft::file("a")).unwrap();
        tree.sort_children_by(NodeId::ROOT, |p, q| {
            p.name.to_lowercase().cmp(&q.name.to_lowercase())
        });
        assert_eq!(tree.children(NodeId::ROOT), &[z, x, y]);
    }
}
