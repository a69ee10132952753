//! Build a [`Tree`] from a node listing.
//!
//! The listing mirrors what the node/file API returns:
//!
//! ```json
//! {
//!   "meta": { "title": "My Lab" },
//!   "data": [
//!     { "id": "p1", "type": "projects", "attributes": { "name": "Survey" }, "parent": null },
//!     { "id": "f1", "type": "files", "attributes": { "name": "raw.csv", "size": 1200 }, "parent": "p1" }
//!   ]
//! }
//! ```
//!
//! Items may arrive in any order. Sibling order follows listing order.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use super::{NodeDraft, NodeId, NodeKind, Tree};
use crate::error::{GridError, Result};

/// Title used when the listing has no `meta.title`.
pub const DEFAULT_TITLE: &str = "Projects";

#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: Vec<ListingItem>,
    #[serde(default)]
    pub meta: Option<ListingMeta>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingMeta {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingItem {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub parent: Option<String>,
}

impl ListingItem {
    fn display_name(&self) -> String {
        ["name", "title"]
            .iter()
            .find_map(|k| self.attributes.get(*k).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.clone())
    }

    fn draft(&self) -> NodeDraft {
        NodeDraft {
            key: Some(self.id.clone()),
            name: self.display_name(),
            kind: NodeKind::from_type(&self.kind),
            attributes: self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Read and build a tree from a listing file.
pub fn load(path: &Path) -> Result<Tree> {
    let text = std::fs::read_to_string(path)?;
    let tree = from_json(&text)?;
    info!(path = %path.display(), nodes = tree.len(), "listing loaded");
    Ok(tree)
}

pub fn from_json(text: &str) -> Result<Tree> {
    let listing: Listing = serde_json::from_str(text)?;
    from_listing(listing)
}

/// Validate the listing and insert items parents-first. Nothing is expanded.
pub fn from_listing(listing: Listing) -> Result<Tree> {
    let title = listing
        .meta
        .and_then(|m| m.title)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let mut seen = HashSet::new();
    for item in &listing.data {
        if item.id.is_empty() || !seen.insert(item.id.as_str()) {
            return Err(GridError::DuplicateKey(item.id.clone()));
        }
    }

    // parent key (None = top level) -> listing indices in order
    let mut by_parent: HashMap<Option<&str>, Vec<usize>> = HashMap::new();
    for (i, item) in listing.data.iter().enumerate() {
        let parent = item.parent.as_deref().filter(|p| !p.is_empty());
        if let Some(p) = parent {
            if !seen.contains(p) {
                return Err(GridError::UnknownParent {
                    item: item.id.clone(),
                    parent: p.to_string(),
                });
            }
        }
        by_parent.entry(parent).or_default().push(i);
    }

    let mut tree = Tree::new(title);
    let mut queue: VecDeque<(Option<&str>, NodeId)> = VecDeque::new();
    queue.push_back((None, NodeId::ROOT));
    let mut placed = 0;

    while let Some((key, parent_id)) = queue.pop_front() {
        let Some(children) = by_parent.get(&key) else {
            continue;
        };
        for &i in children {
            let item = &listing.data[i];
            let id = tree.insert(parent_id, item.draft()).map_err(|e| match e {
                GridError::NotAContainer(_) => GridError::InvalidSeed(format!(
                    "item '{}' is listed under file '{}'",
                    item.id,
                    key.unwrap_or_default()
                )),
                other => other,
            })?;
            placed += 1;
            queue.push_back((Some(item.id.as_str()), id));
        }
    }

    if placed != listing.data.len() {
        return Err(GridError::InvalidSeed(format!(
            "{} items are part of a parent cycle",
            listing.data.len() - placed
        )));
    }
    Ok(tree)
}
