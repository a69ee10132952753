//! The hierarchical grid engine.
//!
//! [`Tree`] owns the nodes, [`flatten`] projects them into rows,
//! [`GridState`] adds selection, filtering, navigation, sorting and
//! pagination on top and records a [`TreeChange`] for every edit.

mod arena;
mod change;
pub mod filter;
pub mod flatten;
mod mutation;
pub mod navigator;
mod node;
pub mod seed;
pub mod sort;
mod state;

pub use arena::{Ancestors, Tree, TreeSnapshot};
pub use change::TreeChange;
pub use filter::{Cursor, Filter};
pub use flatten::{flatten, FlatRow, FlattenOptions, RowKind};
pub use mutation::Mutation;
pub use navigator::Navigator;
pub use node::{validate_name, Node, NodeDraft, NodeId, NodeKind, MAX_NAME_LEN};
pub use sort::SortSpec;
pub use state::GridState;
