use thiserror::Error;

use crate::tree::NodeId;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors raised by the grid engine and the terminal browser.
#[derive(Debug, Error)]
pub enum GridError {
    /// No node with this id exists in the index.
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    /// The destination is the moved node itself, one of its descendants, or the root.
    #[error("Invalid move: cannot move {node} into {dest}")]
    InvalidMove { node: NodeId, dest: NodeId },

    /// Files cannot hold children.
    #[error("{0} cannot contain other items")]
    NotAContainer(NodeId),

    /// An external key is already used by another node.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A listing item points at a parent that is not in the listing.
    #[error("Unknown parent '{parent}' for item '{item}'")]
    UnknownParent { item: String, parent: String },

    /// The listing cannot be turned into a tree.
    #[error("Invalid listing: {0}")]
    InvalidSeed(String),

    /// A display name failed validation.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Breadcrumb index past the end of the current path.
    #[error("Breadcrumb {0} is out of range")]
    InvalidCrumb(usize),

    /// The node already has a change awaiting confirmation.
    #[error("{0} has a pending change")]
    Busy(NodeId),

    /// The remote refused the change.
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// I/O errors from reading listings, configs or logs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON listing.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GridError = io_err.into();
        assert!(matches!(err, GridError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GridError = json_err.into();
        assert!(matches!(err, GridError::Json(_)));
    }

    #[test]
    fn invalid_move_display() {
        let err = GridError::InvalidMove {
            node: NodeId(3),
            dest: NodeId(7),
        };
        assert_eq!(err.to_string(), "Invalid move: cannot move #3 into #7");
    }

    #[test]
    fn unknown_parent_display() {
        let err = GridError::UnknownParent {
            item: "f1".into(),
            parent: "p9".into(),
        };
        assert_eq!(err.to_string(), "Unknown parent 'p9' for item 'f1'");
    }

    #[test]
    fn busy_display() {
        assert_eq!(GridError::Busy(NodeId(4)).to_string(), "#4 has a pending change");
    }
}
