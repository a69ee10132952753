use std::fmt;

use super::{NodeDraft, NodeId};

/// A structural edit that needs remote confirmation before it is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Add { parent: NodeId, draft: NodeDraft },
    Move { node: NodeId, dest: NodeId },
    Delete { node: NodeId },
    Rename { node: NodeId, name: String },
}

impl Mutation {
    /// Nodes that must not have another change in flight.
    pub fn targets(&self) -> Vec<NodeId> {
        match self {
            Mutation::Add { parent, .. } => vec![*parent],
            Mutation::Move { node, dest } => vec![*node, *dest],
            Mutation::Delete { node } | Mutation::Rename { node, .. } => vec![*node],
        }
    }

    /// The node whose whole subtree this change claims, for moves and deletes.
    pub fn subtree_root(&self) -> Option<NodeId> {
        match self {
            Mutation::Move { node, .. } | Mutation::Delete { node } => Some(*node),
            Mutation::Add { .. } | Mutation::Rename { .. } => None,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Mutation::Add { .. } => "add",
            Mutation::Move { .. } => "move",
            Mutation::Delete { .. } => "delete",
            Mutation::Rename { .. } => "rename",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Add { parent, draft } => {
                write!(f, "add {} '{}' under {}", draft.kind.label(), draft.name, parent)
            }
            Mutation::Move { node, dest } => write!(f, "move {} into {}", node, dest),
            Mutation::Delete { node } => write!(f, "delete {}", node),
            Mutation::Rename { node, name } => write!(f, "rename {} to '{}'", node, name),
        }
    }
}
