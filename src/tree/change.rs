use std::fmt;

use serde::Serialize;

use super::NodeId;

/// A structural change emitted by the tree.
///
/// Renderers drain these instead of being called from inside the mutators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeChange {
    Added {
        id: NodeId,
        parent: NodeId,
    },
    /// `removed` lists the whole subtree in pre-order, `id` first.
    Removed {
        id: NodeId,
        parent: NodeId,
        removed: Vec<NodeId>,
    },
    Moved {
        id: NodeId,
        from: NodeId,
        to: NodeId,
    },
    Renamed {
        id: NodeId,
        name: String,
    },
    Toggled {
        id: NodeId,
        collapsed: bool,
    },
    Sorted {
        key: String,
        descending: bool,
    },
}

impl TreeChange {
    /// The node the change is about, if any.
    pub fn subject(&self) -> Option<NodeId> {
        match self {
            TreeChange::Added { id, .. }
            | TreeChange::Removed { id, .. }
            | TreeChange::Moved { id, .. }
            | TreeChange::Renamed { id, .. }
            | TreeChange::Toggled { id, .. } => Some(*id),
            TreeChange::Sorted { .. } => None,
        }
    }

    /// Whether the change alters parent/child structure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            TreeChange::Added { .. } | TreeChange::Removed { .. } | TreeChange::Moved { .. }
        )
    }
}

impl fmt::Display for TreeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeChange::Added { id, parent } => write!(f, "added {} under {}", id, parent),
            TreeChange::Removed { id, removed, .. } => {
                write!(f, "removed {} ({} items)", id, removed.len())
            }
            TreeChange::Moved { id, from, to } => write!(f, "moved {} from {} to {}", id, from, to),
            TreeChange::Renamed { id, name } => write!(f, "renamed {} to '{}'", id, name),
            TreeChange::Toggled { id, collapsed } => {
                let state = if *collapsed { "collapsed" } else { "expanded" };
                write!(f, "{} {}", state, id)
            }
            TreeChange::Sorted { key, descending } => {
                let order = if *descending { "desc" } else { "asc" };
                write!(f, "sorted by {} ({})", key, order)
            }
        }
    }
}
