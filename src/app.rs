use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::GridError;
use crate::event::{Confirmation, Event};
use crate::remote::Remote;
use crate::theme::{self, ThemeColors};
use crate::tree::{validate_name, GridState, Mutation, NodeDraft, NodeId, SortSpec, TreeChange};

/// How long a flash message stays in the status bar.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    AddFile { parent: NodeId },
    AddFolder { parent: NodeId },
    Rename { node: NodeId, original: String },
    DeleteConfirm { node: NodeId, name: String, descendants: usize },
    Error { message: String },
}

impl DialogKind {
    pub fn has_input(&self) -> bool {
        matches!(
            self,
            DialogKind::AddFile { .. } | DialogKind::AddFolder { .. } | DialogKind::Rename { .. }
        )
    }
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Typing a filter query.
    Filter,
    Dialog(DialogKind),
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
    /// Inline validation error; blocks submission while set.
    pub error: Option<String>,
}

/// Transient message in the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub created: Instant,
    pub is_error: bool,
}

/// Main application state.
pub struct App {
    pub grid: GridState,
    pub config: AppConfig,
    pub theme: ThemeColors,
    pub should_quit: bool,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    /// Filter text as typed, kept separately so leading spaces survive editing.
    pub filter_input: String,
    pub status_message: Option<StatusMessage>,
    /// Node picked with `x`, moved on `p`.
    pub marked: Option<NodeId>,
    /// Area of the tree rows in the last frame, for mouse hits.
    pub tree_area: Rect,
    remote: Arc<dyn Remote>,
    event_tx: Option<UnboundedSender<Event>>,
    next_ticket: u64,
    in_flight: HashMap<u64, Mutation>,
}

impl App {
    pub fn new(grid: GridState, config: AppConfig, remote: Arc<dyn Remote>) -> Self {
        let theme = theme::resolve_theme(&config.theme);
        Self {
            grid,
            config,
            theme,
            should_quit: false,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            filter_input: String::new(),
            status_message: None,
            marked: None,
            tree_area: Rect::default(),
            remote,
            event_tx: None,
            next_ticket: 1,
            in_flight: HashMap::new(),
        }
    }

    /// Route confirmations through the event loop instead of leaving them queued.
    pub fn with_event_sender(mut self, tx: UnboundedSender<Event>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Dialogs ──────────────────────────────────────────────────────────────

    /// Open a dialog of the given kind.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        if let DialogKind::Rename { ref original, .. } = kind {
            self.dialog_state.input = original.clone();
            self.dialog_state.cursor_position = original.len();
        }
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    fn show_error(&mut self, err: &GridError) {
        self.open_dialog(DialogKind::Error {
            message: err.to_string(),
        });
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
        self.revalidate_input();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
            self.revalidate_input();
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    /// Only clears a shown error; a fresh dialog starts without one.
    fn revalidate_input(&mut self) {
        if self.dialog_state.error.is_some() {
            self.dialog_state.error = validate_name(&self.dialog_state.input)
                .err()
                .map(|e| e.to_string());
        }
    }

    /// Enter in an input dialog. Invalid names keep the dialog open with an inline error.
    pub fn submit_dialog(&mut self) {
        let AppMode::Dialog(kind) = self.mode.clone() else {
            return;
        };
        let name = self.dialog_state.input.trim().to_string();
        let mutation = match kind {
            DialogKind::AddFile { parent } => Mutation::Add {
                parent,
                draft: NodeDraft::file(name.clone()),
            },
            DialogKind::AddFolder { parent } => Mutation::Add {
                parent,
                draft: NodeDraft::folder(name.clone()),
            },
            DialogKind::Rename { node, ref original } => {
                if name == *original {
                    self.close_dialog();
                    return;
                }
                Mutation::Rename {
                    node,
                    name: name.clone(),
                }
            }
            DialogKind::DeleteConfirm { node, .. } => {
                self.close_dialog();
                self.submit(Mutation::Delete { node });
                return;
            }
            DialogKind::Error { .. } => {
                self.close_dialog();
                return;
            }
        };
        if let Err(e) = validate_name(&name) {
            self.dialog_state.error = Some(e.to_string());
            return;
        }
        self.close_dialog();
        self.submit(mutation);
    }

    // ── Status messages ──────────────────────────────────────────────────────

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            created: Instant::now(),
            is_error: false,
        });
    }

    pub fn set_error_message(&mut self, msg: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            created: Instant::now(),
            is_error: true,
        });
    }

    /// Clear the status message once it has been shown for [`STATUS_TIMEOUT`].
    pub fn clear_expired_status(&mut self) {
        if let Some(msg) = &self.status_message {
            if msg.created.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    // ── Tree actions ─────────────────────────────────────────────────────────

    /// Container that new items go into: the selection, or its parent for files.
    pub fn target_container(&self) -> NodeId {
        let Some(row) = self.grid.selected_row() else {
            return self.grid.navigator().current();
        };
        match self.grid.tree().get(row.id) {
            Some(node) if node.is_container() && !row.is_load_more() => row.id,
            _ => row.parent,
        }
    }

    pub fn start_add(&mut self, folder: bool) {
        let parent = self.target_container();
        self.open_dialog(if folder {
            DialogKind::AddFolder { parent }
        } else {
            DialogKind::AddFile { parent }
        });
    }

    pub fn start_rename(&mut self) {
        if let Some(node) = self.grid.selected_node() {
            let kind = DialogKind::Rename {
                node: node.id,
                original: node.name.clone(),
            };
            self.open_dialog(kind);
        }
    }

    pub fn start_delete(&mut self) {
        let Some(node) = self.grid.selected_node() else {
            return;
        };
        let id = node.id;
        if self.config.confirm_delete() {
            let kind = DialogKind::DeleteConfirm {
                node: id,
                name: node.name.clone(),
                descendants: self.grid.tree().subtree(id).len() - 1,
            };
            self.open_dialog(kind);
        } else {
            self.submit(Mutation::Delete { node: id });
        }
    }

    pub fn mark_selected(&mut self) {
        let Some(node) = self.grid.selected_node() else {
            return;
        };
        let (id, name) = (node.id, node.name.clone());
        if self.marked == Some(id) {
            self.marked = None;
            self.set_status_message(format!("Unmarked '{}'", name));
        } else {
            self.marked = Some(id);
            self.set_status_message(format!("Marked '{}' for move", name));
        }
    }

    /// Move the marked node into the selected container.
    pub fn move_marked(&mut self) {
        let Some(node) = self.marked else {
            self.set_error_message("Nothing marked (x to mark)");
            return;
        };
        let dest = self.target_container();
        self.marked = None;
        self.submit(Mutation::Move { node, dest });
    }

    pub fn cycle_sort(&mut self) {
        let next = match self.grid.sort() {
            Some(spec) => spec.next_key(),
            None => SortSpec::default().folders_first(self.config.folders_first()),
        };
        self.apply_sort(next);
    }

    pub fn flip_sort(&mut self) {
        let spec = self
            .grid
            .sort()
            .cloned()
            .unwrap_or_else(|| SortSpec::default().folders_first(self.config.folders_first()));
        let descending = !spec.descending;
        self.apply_sort(spec.descending(descending));
    }

    fn apply_sort(&mut self, spec: SortSpec) {
        let label = spec.label();
        self.grid.set_sort(spec);
        self.set_status_message(format!("Sorted by {}", label));
    }

    pub fn activate_selected(&mut self) {
        if let Err(e) = self.grid.activate_selected() {
            self.set_error_message(e.to_string());
        }
    }

    pub fn jump_to_crumb(&mut self, index: usize) {
        if let Err(e) = self.grid.crumb(index) {
            self.set_error_message(e.to_string());
        }
    }

    // ── Filter ───────────────────────────────────────────────────────────────

    pub fn start_filter(&mut self) {
        self.filter_input = self.grid.filter().query().to_string();
        self.mode = AppMode::Filter;
    }

    pub fn filter_push(&mut self, c: char) {
        self.filter_input.push(c);
        self.grid.set_filter(&self.filter_input);
    }

    pub fn filter_pop(&mut self) {
        self.filter_input.pop();
        self.grid.set_filter(&self.filter_input);
    }

    /// Keep the filter and go back to browsing.
    pub fn accept_filter(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn clear_filter(&mut self) {
        self.filter_input.clear();
        self.grid.clear_filter();
        self.mode = AppMode::Normal;
    }

    // ── Confirmation flow ────────────────────────────────────────────────────

    /// Validate and reserve a mutation, then ask the remote to confirm it.
    ///
    /// Structural errors open the error dialog. A busy node only flashes.
    pub fn submit(&mut self, mutation: Mutation) {
        if let Err(e) = self.grid.validate(&mutation) {
            self.show_error(&e);
            return;
        }
        if let Err(e) = self.grid.mark_pending(&mutation) {
            self.set_error_message(e.to_string());
            return;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        debug!(ticket, %mutation, "awaiting confirmation");
        self.set_status_message(format!("Saving: {}…", mutation.verb()));

        if let Some(tx) = self.event_tx.clone() {
            let remote = Arc::clone(&self.remote);
            let request = mutation.clone();
            tokio::spawn(async move {
                let result = remote.confirm(&request).await;
                let _ = tx.send(Event::Confirmed(Confirmation { ticket, result }));
            });
        }
        self.in_flight.insert(ticket, mutation);
    }

    /// Apply or drop a mutation once the remote has answered.
    pub fn handle_confirmation(&mut self, confirmation: Confirmation) {
        let Some(mutation) = self.in_flight.remove(&confirmation.ticket) else {
            warn!(ticket = confirmation.ticket, "confirmation for unknown request");
            return;
        };
        self.grid.clear_pending(&mutation);

        if let Err(e) = confirmation.result {
            warn!(%mutation, error = %e, "mutation rejected");
            self.set_error_message(e.to_string());
            return;
        }

        let verb = mutation.verb();
        match self.grid.apply(mutation) {
            Ok(Some(change)) => {
                if let TreeChange::Added { id, .. } = change {
                    self.grid.select(id);
                }
                self.set_status_message(format!("Done: {}", verb));
            }
            Ok(None) => {}
            Err(e) => self.show_error(&e),
        }
        self.sync_changes();
    }

    /// Requests still waiting on the remote.
    pub fn in_flight(&self) -> impl Iterator<Item = (u64, &Mutation)> + '_ {
        self.in_flight.iter().map(|(t, m)| (*t, m))
    }

    /// Consume tree change events.
    pub fn sync_changes(&mut self) {
        for change in self.grid.drain_changes() {
            match &change {
                TreeChange::Removed { removed, .. } => {
                    if self.marked.is_some_and(|m| removed.contains(&m)) {
                        self.marked = None;
                    }
                    info!(%change, "applied");
                }
                TreeChange::Added { .. } | TreeChange::Moved { .. } | TreeChange::Renamed { .. } => {
                    info!(%change, "applied");
                }
                TreeChange::Toggled { .. } | TreeChange::Sorted { .. } => {
                    debug!(%change, "view changed");
                }
            }
        }
    }

    // ── Mouse ────────────────────────────────────────────────────────────────

    /// Select the row under a click in the tree area.
    pub fn click_row(&mut self, column: u16, row: u16) {
        let area = self.tree_area;
        if column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return;
        }
        let index = self.grid.scroll_offset + (row - area.y) as usize;
        if index < self.grid.visible_len() {
            self.grid.selected_index = index;
        }
    }
}
