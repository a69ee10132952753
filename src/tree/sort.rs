use std::cmp::Ordering;

use serde_json::Value;

use super::{Node, NodeId, Tree, TreeChange};

/// Keys offered when cycling the sort from the keyboard.
pub const SORT_KEYS: [&str; 4] = ["name", "kind", "size", "modified"];

/// Sort criteria for the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// `name`, `kind`, or any attribute name.
    pub key: String,
    pub descending: bool,
    /// Containers before files, regardless of direction.
    pub folders_first: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new("name")
    }
}

impl SortSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            descending: false,
            folders_first: true,
        }
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    pub fn folders_first(mut self, folders_first: bool) -> Self {
        self.folders_first = folders_first;
        self
    }

    /// Next key in [`SORT_KEYS`]; custom keys wrap back to `name`.
    pub fn next_key(&self) -> Self {
        let pos = SORT_KEYS.iter().position(|k| *k == self.key);
        let key = match pos {
            Some(i) => SORT_KEYS[(i + 1) % SORT_KEYS.len()],
            None => SORT_KEYS[0],
        };
        Self {
            key: key.to_string(),
            ..self.clone()
        }
    }

    pub fn label(&self) -> String {
        let arrow = if self.descending { "↓" } else { "↑" };
        format!("{} {}", self.key, arrow)
    }

    pub fn compare(&self, a: &Node, b: &Node) -> Ordering {
        let mut cmp = Ordering::Equal;

        if self.folders_first {
            cmp = b.is_container().cmp(&a.is_container());
        }

        cmp.then_with(|| match self.key.as_str() {
            "name" => directed(compare_names(&a.name, &b.name), self.descending),
            "kind" => directed(a.kind.label().cmp(b.kind.label()), self.descending),
            key => compare_values(a.attribute(key), b.attribute(key), self.descending),
        })
    }
}

fn directed(ord: Ordering, descending: bool) -> Ordering {
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Missing and null values sort last in both directions.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => directed(compare_present(x, y), descending),
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => compare_names(x, y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Sort the direct children of `parent` only.
pub fn sort_children(tree: &mut Tree, parent: NodeId, spec: &SortSpec) {
    tree.sort_children_by(parent, |a, b| spec.compare(a, b));
}

/// Sort every child list in the subtree under `id`. Never moves a node to another parent.
pub fn sort_subtree(tree: &mut Tree, id: NodeId, spec: &SortSpec) {
    for node in tree.subtree(id) {
        if !tree.children(node).is_empty() {
            sort_children(tree, node, spec);
        }
    }
}

/// Sort the whole tree.
pub fn sort_all(tree: &mut Tree, spec: &SortSpec) -> TreeChange {
    sort_subtree(tree, NodeId::ROOT, spec);
    TreeChange::Sorted {
        key: spec.key.clone(),
        descending: spec.descending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeDraft;

    fn names(tree: &Tree, parent: NodeId) -> Vec<String> {
        tree.children(parent)
            .iter()
            .map(|id| tree.get(*id).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn name_sort_is_case_insensitive_with_folders_first() {
        let mut tree = Tree::new("t");
        tree.insert(NodeId::ROOT, NodeDraft::file("beta.txt")).unwrap();
        tree.insert(NodeId::ROOT, NodeDraft::folder("Zeta")).unwrap();
        tree.insert(NodeId::ROOT, NodeDraft::file("Alpha.txt")).unwrap();
        tree.insert(NodeId::ROOT, NodeDraft::folder("alpha")).unwrap();

        sort_all(&mut tree, &SortSpec::default());
        assert_eq!(names(&tree, NodeId::ROOT), ["alpha", "Zeta", "Alpha.txt", "beta.txt"]);

        sort_all(&mut tree, &SortSpec::default().folders_first(false));
        assert_eq!(names(&tree, NodeId::ROOT), ["alpha", "Alpha.txt", "beta.txt", "Zeta"]);
    }

    #[test]
    fn descending_keeps_folders_first() {
        let mut tree = Tree::new("t");
        tree.insert(NodeId::ROOT, NodeDraft::file("a")).unwrap();
        tree.insert(NodeId::ROOT, NodeDraft::folder("m")).unwrap();
        tree.insert(NodeId::ROOT, NodeDraft::file("z")).unwrap();
        sort_all(&mut tree, &SortSpec::default().descending(true));
        assert_eq!(names(&tree, NodeId::ROOT), ["m", "z", "a"]);
    }

    #[test]
    fn attribute_sort_puts_missing_last() {
        let mut tree = Tree::new("t");
        tree.insert(NodeId::ROOT, NodeDraft::file("none")).unwrap();
        tree.insert(NodeId::ROOT, NodeDraft::file("big").with_attribute("size", 900))
            .unwrap();
        tree.insert(NodeId::ROOT, NodeDraft::file("small").with_attribute("size", 3))
            .unwrap();

        let spec = SortSpec::new("size").folders_first(false);
        sort_all(&mut tree, &spec);
        assert_eq!(names(&tree, NodeId::ROOT), ["small", "big", "none"]);

        sort_all(&mut tree, &spec.clone().descending(true));
        assert_eq!(names(&tree, NodeId::ROOT), ["big", "small", "none"]);
    }

    #[test]
    fn sort_never_crosses_parents() {
        let mut tree = Tree::new("t");
        let p = tree.insert(NodeId::ROOT, NodeDraft::folder("p")).unwrap();
        let q = tree.insert(NodeId::ROOT, NodeDraft::folder("q")).unwrap();
        tree.insert(p, NodeDraft::file("z")).unwrap();
        tree.insert(q, NodeDraft::file("a")).unwrap();
        tree.insert(p, NodeDraft::file("b")).unwrap();

        sort_all(&mut tree, &SortSpec::default());
        assert_eq!(names(&tree, p), ["b", "z"]);
        assert_eq!(names(&tree, q), ["a"]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn equal_keys_keep_their_order() {
        let mut tree = Tree::new("t");
        let first = tree
            .insert(NodeId::ROOT, NodeDraft::file("x").with_attribute("size", 1))
            .unwrap();
        let second = tree
            .insert(NodeId::ROOT, NodeDraft::file("y").with_attribute("size", 1))
            .unwrap();
        sort_all(&mut tree, &SortSpec::new("size").descending(true));
        assert_eq!(tree.children(NodeId::ROOT), &[first, second]);
    }

    #[test]
    fn next_key_cycles() {
        let spec = SortSpec::default();
        assert_eq!(spec.next_key().key, "kind");
        assert_eq!(spec.next_key().next_key().key, "size");
        assert_eq!(SortSpec::new("modified").next_key().key, "name");
        assert_eq!(SortSpec::new("downloads").next_key().key, "name");
    }

    #[test]
    fn mixed_value_types_rank_by_type() {
        let n = Value::from(5);
        let s = Value::from("5");
        assert_eq!(compare_values(Some(&n), Some(&s), false), Ordering::Less);
        assert_eq!(
            compare_values(Some(&Value::Null), Some(&n), false),
            Ordering::Greater
        );
    }
}
