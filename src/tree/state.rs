use std::collections::HashMap;

use tracing::debug;

use super::flatten::{flatten, FlatRow, FlattenOptions};
use super::sort::{sort_all, sort_children};
use super::{
    Cursor, Filter, Mutation, Navigator, Node, NodeDraft, NodeId, SortSpec, Tree, TreeChange,
};
use crate::error::{GridError, Result};

/// State for the grid view: the tree plus everything derived from it.
///
/// Rows are recomputed synchronously after every edit, toggle, filter,
/// navigation or sort. Selection is an index into the visible rows and
/// follows the selected node across recomputes while it stays visible.
#[derive(Debug)]
pub struct GridState {
    tree: Tree,
    rows: Vec<FlatRow>,
    /// Positions in `rows` of the visible rows.
    view: Vec<usize>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    filter: Filter,
    navigator: Navigator,
    sort: Option<SortSpec>,
    page_size: Option<usize>,
    page_limits: HashMap<NodeId, usize>,
    /// Nodes with a change in flight; `true` when the change claims the whole subtree.
    pending: HashMap<NodeId, bool>,
    changes: Vec<TreeChange>,
}

impl GridState {
    pub fn new(tree: Tree) -> Self {
        let mut state = Self {
            tree,
            rows: Vec::new(),
            view: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            filter: Filter::default(),
            navigator: Navigator::default(),
            sort: None,
            page_size: None,
            page_limits: HashMap::new(),
            pending: HashMap::new(),
            changes: Vec::new(),
        };
        state.flatten();
        state
    }

    pub fn with_sort(mut self, spec: SortSpec) -> Self {
        self.set_sort(spec);
        self
    }

    pub fn with_page_size(mut self, page_size: Option<usize>) -> Self {
        self.set_page_size(page_size);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Every row under the display root, visible or not.
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &FlatRow> + '_ {
        self.view.iter().filter_map(move |i| self.rows.get(*i))
    }

    pub fn visible_len(&self) -> usize {
        self.view.len()
    }

    pub fn visible_row(&self, index: usize) -> Option<&FlatRow> {
        self.view.get(index).and_then(|i| self.rows.get(*i))
    }

    /// Ids of the visible node rows, in display order.
    pub fn visible_ids(&self) -> Vec<NodeId> {
        self.visible_rows()
            .filter(|r| !r.is_load_more())
            .map(|r| r.id)
            .collect()
    }

    pub fn selected_row(&self) -> Option<&FlatRow> {
        self.visible_row(self.selected_index)
    }

    /// The selected node. `None` on a "load more" row.
    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected_row()
            .filter(|r| !r.is_load_more())
            .map(|r| r.id)
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected_id().and_then(|id| self.tree.get(id))
    }

    /// Visible index of a node row.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.visible_rows()
            .position(|r| r.id == id && !r.is_load_more())
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn is_filtering(&self) -> bool {
        self.filter.is_active()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn breadcrumbs(&self) -> Vec<(NodeId, String)> {
        self.navigator.breadcrumbs(&self.tree)
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    /// Take the changes recorded since the last call.
    pub fn drain_changes(&mut self) -> Vec<TreeChange> {
        std::mem::take(&mut self.changes)
    }

    // ── Flattening & cursor ──────────────────────────────────────────────────

    /// Rebuild the rows from the tree and keep the selection on the same row.
    pub fn flatten(&mut self) {
        let anchor = self
            .selected_row()
            .map(|r| (r.id, r.is_load_more()));

        let opts = FlattenOptions::new(self.navigator.current())
            .needle(self.filter.needle())
            .paginate(self.page_size, &self.page_limits);
        self.rows = flatten(&self.tree, &opts);
        self.view = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.visible)
            .map(|(i, _)| i)
            .collect();

        let anchored = anchor.and_then(|(id, more)| {
            self.visible_rows()
                .position(|r| r.id == id && r.is_load_more() == more)
        });
        match anchored {
            Some(i) => self.selected_index = i,
            None => self.clamp_selection(),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.view.len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    pub fn cursor(&self) -> Cursor {
        Cursor {
            selected: self.selected_id(),
            index: self.selected_index,
            scroll_offset: self.scroll_offset,
        }
    }

    fn restore_cursor(&mut self, cursor: Cursor) {
        self.selected_index = cursor
            .selected
            .and_then(|id| self.index_of(id))
            .unwrap_or(cursor.index);
        self.clamp_selection();
        self.scroll_offset = cursor.scroll_offset;
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }

    pub fn select_next(&mut self) {
        let len = self.view.len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.view.len();
        if len > 0 {
            self.selected_index = len - 1;
        }
    }

    /// Move the selection to a visible node. Returns false when it is not visible.
    pub fn select(&mut self, id: NodeId) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.selected_index = i;
                true
            }
            None => false,
        }
    }

    /// Jump to the parent row of the selection, if it is visible.
    pub fn select_parent(&mut self) -> bool {
        let Some(row) = self.selected_row() else {
            return false;
        };
        let parent = if row.is_load_more() { row.id } else { row.parent };
        self.select(parent)
    }

    // ── Collapse / expand ────────────────────────────────────────────────────

    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> Result<()> {
        if let Some(change) = self.tree.set_collapsed(id, collapsed)? {
            self.record(change);
        }
        Ok(())
    }

    pub fn toggle(&mut self, id: NodeId) -> Result<()> {
        if let Some(change) = self.tree.toggle(id)? {
            self.record(change);
        }
        Ok(())
    }

    /// Expand every container under the display root.
    pub fn expand_all(&mut self) {
        let scope = self.navigator.current();
        let changes: Vec<TreeChange> = self
            .tree
            .subtree(scope)
            .into_iter()
            .filter_map(|id| self.tree.set_collapsed(id, false).ok().flatten())
            .collect();
        debug!(expanded = changes.len(), "expanded all");
        self.changes.extend(changes);
        self.flatten();
    }

    /// Expand the selected container. No-op on files.
    pub fn expand_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            let _ = self.set_collapsed(id, false);
        }
    }

    /// Collapse the selected container, or jump to the parent when already collapsed.
    pub fn collapse_selected(&mut self) {
        let Some(node) = self.selected_node() else {
            self.select_parent();
            return;
        };
        if node.is_container() && !node.collapsed {
            let id = node.id;
            let _ = self.set_collapsed(id, true);
        } else {
            self.select_parent();
        }
    }

    // ── Filter ───────────────────────────────────────────────────────────────

    /// Apply a name filter. An empty query clears it and restores the saved cursor.
    pub fn set_filter(&mut self, query: &str) {
        let restore = self.filter.set_query(query, self.cursor());
        self.flatten();
        if let Some(cursor) = restore {
            self.restore_cursor(cursor);
        }
    }

    pub fn clear_filter(&mut self) {
        let restore = self.filter.clear();
        self.flatten();
        if let Some(cursor) = restore {
            self.restore_cursor(cursor);
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────────

    /// Use `id` as the display root. Unknown ids leave everything unchanged.
    pub fn enter(&mut self, id: NodeId) -> Result<()> {
        self.navigator.enter(&self.tree, id)?;
        self.selected_index = 0;
        self.scroll_offset = 0;
        self.flatten();
        Ok(())
    }

    /// Leave the current display root and select it in its parent's listing.
    pub fn exit(&mut self) -> Option<NodeId> {
        let left = self.navigator.exit()?;
        self.flatten();
        self.select(left);
        Some(left)
    }

    /// Jump to breadcrumb `index` (0 = root) and select the node that was left.
    pub fn crumb(&mut self, index: usize) -> Result<()> {
        let left = self.navigator.path().get(index).copied();
        self.navigator.crumb(index)?;
        self.flatten();
        if let Some(id) = left {
            self.select(id);
        }
        Ok(())
    }

    /// Enter the selected container, or grow the page on a "load more" row.
    pub fn activate_selected(&mut self) -> Result<()> {
        let Some(row) = self.selected_row().cloned() else {
            return Ok(());
        };
        if row.is_load_more() {
            return self.load_more(row.id);
        }
        match self.tree.get(row.id) {
            Some(node) if node.is_container() => self.enter(row.id),
            _ => Ok(()),
        }
    }

    // ── Sorting & pagination ─────────────────────────────────────────────────

    pub fn set_sort(&mut self, spec: SortSpec) {
        let change = sort_all(&mut self.tree, &spec);
        self.sort = Some(spec);
        self.record(change);
    }

    pub fn set_page_size(&mut self, page_size: Option<usize>) {
        self.page_size = page_size.filter(|n| *n > 0);
        self.page_limits.clear();
        self.flatten();
    }

    /// Show another page of `parent`'s children.
    pub fn load_more(&mut self, parent: NodeId) -> Result<()> {
        self.tree.node(parent)?;
        let Some(size) = self.page_size else {
            return Ok(());
        };
        let limit = self.page_limits.entry(parent).or_insert(size);
        *limit += size;
        debug!(%parent, limit = *limit, "page extended");
        self.flatten();
        Ok(())
    }

    // ── Edits ────────────────────────────────────────────────────────────────

    pub fn validate(&self, mutation: &Mutation) -> Result<()> {
        self.tree.validate(mutation)
    }

    pub fn apply(&mut self, mutation: Mutation) -> Result<Option<TreeChange>> {
        let change = self.tree.apply(mutation)?;
        if let Some(change) = &change {
            self.after_edit(change.clone());
        }
        Ok(change)
    }

    pub fn add(&mut self, parent: NodeId, draft: NodeDraft) -> Result<NodeId> {
        let change = self.tree.add(parent, draft)?;
        let id = match &change {
            TreeChange::Added { id, .. } => *id,
            _ => parent,
        };
        self.after_edit(change);
        Ok(id)
    }

    pub fn move_node(&mut self, node: NodeId, dest: NodeId) -> Result<()> {
        let change = self.tree.move_node(node, dest)?;
        self.after_edit(change);
        Ok(())
    }

    pub fn delete(&mut self, node: NodeId) -> Result<()> {
        if let Some(change) = self.tree.delete(node)? {
            self.after_edit(change);
        }
        Ok(())
    }

    pub fn rename(&mut self, node: NodeId, name: &str) -> Result<()> {
        let change = self.tree.rename(node, name)?;
        self.after_edit(change);
        Ok(())
    }

    fn after_edit(&mut self, change: TreeChange) {
        let selected = self.selected_id();
        let mut fallback = None;

        match &change {
            TreeChange::Added { parent, .. } => self.resort(*parent),
            TreeChange::Moved { to, .. } => self.resort(*to),
            TreeChange::Renamed { id, .. } => {
                if let Some(parent) = self.tree.parent(*id) {
                    self.resort(parent);
                }
            }
            TreeChange::Removed {
                parent, removed, ..
            } => {
                for id in removed {
                    self.page_limits.remove(id);
                    self.pending.remove(id);
                }
                if selected.is_some_and(|s| removed.contains(&s)) {
                    fallback = Some(*parent);
                }
            }
            TreeChange::Toggled { .. } | TreeChange::Sorted { .. } => {}
        }
        if change.is_structural() {
            self.navigator.repair(&self.tree);
        }

        self.record(change);
        if let Some(parent) = fallback {
            self.select(parent);
        }
    }

    fn resort(&mut self, parent: NodeId) {
        if let Some(spec) = &self.sort {
            sort_children(&mut self.tree, parent, spec);
        }
    }

    fn record(&mut self, change: TreeChange) {
        debug!(%change, "tree changed");
        self.changes.push(change);
        self.flatten();
    }

    // ── Pending confirmations ────────────────────────────────────────────────

    /// Reserve the mutation's nodes.
    ///
    /// Refused while any target is pending, while a moved or deleted node has
    /// a change in flight somewhere below it, or while a target lies under a
    /// node that is itself being moved or deleted.
    pub fn mark_pending(&mut self, mutation: &Mutation) -> Result<()> {
        let targets = mutation.targets();
        if let Some(busy) = targets.iter().find(|t| self.pending.contains_key(*t)) {
            return Err(GridError::Busy(*busy));
        }
        if let Some(root) = mutation.subtree_root() {
            if let Some(busy) = self.pending.keys().find(|p| self.tree.is_within(**p, root)) {
                return Err(GridError::Busy(*busy));
            }
        }
        let claimed = self
            .pending
            .iter()
            .filter(|(_, subtree)| **subtree)
            .map(|(p, _)| *p)
            .find(|p| targets.iter().any(|t| self.tree.is_within(*t, *p)));
        if let Some(busy) = claimed {
            return Err(GridError::Busy(busy));
        }

        let root = mutation.subtree_root();
        for target in targets {
            self.pending.insert(target, root == Some(target));
        }
        Ok(())
    }

    pub fn clear_pending(&mut self, mutation: &Mutation) {
        for target in mutation.targets() {
            self.pending.remove(&target);
        }
    }

    pub fn is_pending(&self, id: NodeId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
