use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GridError, Result};

/// Longest display name accepted for a node.
pub const MAX_NAME_LEN: usize = 255;

/// Arena handle for a node. Allocated by the owning [`Tree`](super::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The sentinel root. Never emitted as a row.
    pub const ROOT: NodeId = NodeId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node represents in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Project,
    Component,
    Folder,
    File,
}

impl NodeKind {
    /// Map a listing `type` string onto a kind. Unknown types are files.
    pub fn from_type(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "project" | "projects" | "node" | "nodes" => NodeKind::Project,
            "component" | "components" => NodeKind::Component,
            "folder" | "folders" | "directory" => NodeKind::Folder,
            _ => NodeKind::File,
        }
    }

    /// Whether nodes of this kind may hold children.
    pub fn is_container(self) -> bool {
        !matches!(self, NodeKind::File)
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Project => "Project",
            NodeKind::Component => "Component",
            NodeKind::Folder => "Folder",
            NodeKind::File => "File",
        }
    }
}

/// A node in the tree arena.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    /// External id, unique across the tree. Empty for the root.
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: usize,
    pub collapsed: bool,
    pub attributes: BTreeMap<String, Value>,
}

impl Node {
    pub(crate) fn root(title: String) -> Self {
        Self {
            id: NodeId::ROOT,
            key: String::new(),
            name: title,
            kind: NodeKind::Folder,
            parent: None,
            children: Vec::new(),
            depth: 0,
            collapsed: false,
            attributes: BTreeMap::new(),
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// The fields a caller supplies when creating a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    /// External id. Generated by the tree when `None`.
    pub key: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    pub attributes: BTreeMap<String, Value>,
}

impl NodeDraft {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            key: None,
            name: name.into(),
            kind,
            attributes: BTreeMap::new(),
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Folder)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::File)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Check a display name: required, at most [`MAX_NAME_LEN`] characters, no `/`.
pub fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GridError::InvalidName("name is required".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(GridError::InvalidName(format!(
            "name is longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    if trimmed.contains('/') {
        return Err(GridError::InvalidName("name cannot contain '/'".into()));
    }
    Ok(())
}
