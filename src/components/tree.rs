use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::tree::{FlatRow, GridState, NodeId, NodeKind, RowKind};
use crate::theme::ThemeColors;

/// Tree widget that renders the visible rows with box-drawing guides.
pub struct TreeWidget<'a> {
    grid: &'a GridState,
    theme: &'a ThemeColors,
    use_icons: bool,
    marked: Option<NodeId>,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(grid: &'a GridState, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            grid,
            theme,
            use_icons,
            marked: None,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn marked(mut self, marked: Option<NodeId>) -> Self {
        self.marked = marked;
        self
    }

    /// Build the indentation prefix for a row.
    ///
    /// Walks back through the rows above to find each ancestor level and
    /// whether it was the last sibling, to draw continuation lines correctly.
    pub(crate) fn build_prefix(row: &FlatRow, rows: &[&FlatRow], index: usize) -> String {
        let mut prefix = String::new();
        for level in 1..row.level {
            let ancestor_is_last = rows[..index]
                .iter()
                .rev()
                .take_while(|r| r.level >= level)
                .find(|r| r.level == level)
                .is_some_and(|r| r.is_last_sibling);
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix.push_str(if row.is_last_sibling { "└──" } else { "├──" });
        prefix
    }

    fn row_line(&self, row: &FlatRow, prefix: String, selected: bool) -> Line<'static> {
        let guide_style = Style::default().fg(self.theme.tree_guide_fg);

        if let RowKind::LoadMore { remaining } = row.kind {
            let style = if selected {
                self.selected_style()
            } else {
                Style::default()
                    .fg(self.theme.info_fg)
                    .add_modifier(Modifier::ITALIC)
            };
            return Line::from(vec![
                Span::styled(prefix, guide_style),
                Span::styled(
                    format!("{}{} more…", indicator(self.use_icons, None, false), remaining),
                    style,
                ),
            ]);
        }

        let Some(node) = self.grid.tree().get(row.id) else {
            return Line::default();
        };
        let pending = self.grid.is_pending(node.id);
        let marked = self.marked == Some(node.id);

        let style = if selected {
            self.selected_style()
        } else if pending {
            Style::default()
                .fg(self.theme.pending_fg)
                .add_modifier(Modifier::ITALIC)
        } else if marked {
            Style::default()
                .fg(self.theme.marked_fg)
                .add_modifier(Modifier::BOLD)
        } else if self.grid.is_filtering() {
            Style::default().fg(self.theme.match_fg)
        } else if node.is_container() {
            Style::default()
                .fg(self.theme.tree_container_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.tree_file_fg)
        };

        let marker = match (pending, marked) {
            (true, _) => "… ",
            (false, true) => "● ",
            _ => "",
        };
        let text = format!(
            "{}{}{}",
            marker,
            indicator(self.use_icons, Some(node.kind), node.collapsed),
            node.name
        );
        Line::from(vec![
            Span::styled(prefix, guide_style),
            Span::styled(text, style),
        ])
    }

    fn selected_style(&self) -> Style {
        Style::default()
            .bg(self.theme.tree_selected_bg)
            .fg(self.theme.tree_selected_fg)
            .add_modifier(Modifier::BOLD)
    }
}

/// Icon or ASCII tag for a row. `None` is the load-more row.
pub(crate) fn indicator(use_icons: bool, kind: Option<NodeKind>, collapsed: bool) -> &'static str {
    match (use_icons, kind) {
        (true, Some(NodeKind::Project)) => " ",
        (true, Some(NodeKind::Component)) => " ",
        (true, Some(NodeKind::Folder)) if collapsed => " ",
        (true, Some(NodeKind::Folder)) => " ",
        (true, Some(NodeKind::File)) => " ",
        (true, None) => "▼ ",
        (false, Some(NodeKind::Project)) => "[P] ",
        (false, Some(NodeKind::Component)) => "[C] ",
        (false, Some(NodeKind::Folder)) => "[D] ",
        (false, Some(NodeKind::File)) => "[F] ",
        (false, None) => "[+] ",
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        let rows: Vec<&FlatRow> = self.grid.visible_rows().collect();
        let visible_height = inner_area.height as usize;
        if visible_height == 0 {
            return;
        }
        if rows.is_empty() {
            let hint = if self.grid.is_filtering() {
                "No matches"
            } else {
                "Empty"
            };
            let line = Line::from(Span::styled(hint, Style::default().fg(self.theme.dim_fg)));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        // Guides only make sense when every ancestor row is on screen.
        let guides = !self.grid.is_filtering();
        let selected = self.grid.selected_index;

        for (i, (idx, row)) in rows
            .iter()
            .enumerate()
            .skip(self.grid.scroll_offset)
            .take(visible_height)
            .enumerate()
        {
            let prefix = if guides {
                Self::build_prefix(row, &rows, idx)
            } else {
                String::new()
            };
            let line = self.row_line(row, prefix, idx == selected);
            let y = inner_area.y + i as u16;
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
