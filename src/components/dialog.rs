use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::theme::ThemeColors;

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width.min(area.width), height.min(area.height))
    }

    /// Clear the dialog area, draw the frame, and return the inner area.
    fn frame(&self, title: &str, width: u16, height: u16, border: Style, area: Rect, buf: &mut Buffer) -> Rect {
        let rect = Self::centered_rect(width, height, area);
        Clear.render(rect, buf);
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(border)
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &'static str, inner: Rect, buf: &mut Buffer) {
        if inner.height > 1 {
            let style = Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM);
            buf.set_line(
                inner.x,
                inner.y + inner.height - 1,
                &Line::from(Span::styled(text, style)),
                inner.width,
            );
        }
    }

    fn render_input(&self, title: &str, area: Rect, buf: &mut Buffer) {
        let border = Style::default().fg(self.theme.dialog_border_fg);
        let inner = self.frame(title, 50.min(area.width.saturating_sub(4)), 6, border, area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let state = self.dialog_state;
        let input = state.input.as_str();
        let cursor = state.cursor_position.min(input.len());
        let (before, rest) = input.split_at(cursor);
        let mut rest_chars = rest.chars();
        let cursor_char = rest_chars
            .next()
            .map(String::from)
            .unwrap_or_else(|| " ".to_string());
        let after = rest_chars.as_str();

        // Keep the cursor in view on long input.
        let max_width = inner.width as usize;
        let before_len = before.chars().count();
        let before_display: String = if before_len + 1 > max_width {
            before.chars().skip(before_len + 1 - max_width).collect()
        } else {
            before.to_string()
        };

        let input_style = Style::default().fg(self.theme.tree_fg);
        let cursor_style = Style::default()
            .bg(self.theme.tree_fg)
            .fg(self.theme.dialog_bg)
            .add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(before_display, input_style),
            Span::styled(cursor_char, cursor_style),
            Span::styled(after, input_style),
        ]);
        buf.set_line(inner.x, inner.y, &line, inner.width);

        if let Some(err) = &state.error {
            let line = Line::from(Span::styled(
                err.as_str(),
                Style::default().fg(self.theme.error_fg),
            ));
            buf.set_line(inner.x, inner.y + 1, &line, inner.width);
        }

        self.hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
    }

    fn render_delete(&self, name: &str, descendants: usize, area: Rect, buf: &mut Buffer) {
        let width = (name.chars().count() as u16 + 12)
            .max(40)
            .min(area.width.saturating_sub(4));
        let border = Style::default().fg(self.theme.error_fg);
        let inner = self.frame("Delete Confirmation", width, 7, border, area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let header = Line::from(Span::styled(
            format!("Delete '{}'?", name),
            Style::default()
                .fg(self.theme.warning_fg)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(inner.x, inner.y, &header, inner.width);

        if descendants > 0 && inner.height > 2 {
            let noun = if descendants == 1 { "item" } else { "items" };
            let line = Line::from(Span::styled(
                format!("  and {} nested {}", descendants, noun),
                Style::default().fg(self.theme.tree_fg),
            ));
            buf.set_line(inner.x, inner.y + 1, &line, inner.width);
        }

        self.hint("[y] Yes  [n/Esc] Cancel", inner, buf);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = (message.chars().count() as u16 + 6)
            .max(30)
            .min(area.width.saturating_sub(4));
        let border = Style::default().fg(self.theme.error_fg);
        let inner = self.frame("Error", width, 5, border, area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let line = Line::from(Span::styled(message, Style::default().fg(self.theme.error_fg)));
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

        self.hint("[Enter/Esc] Dismiss", inner, buf);
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::AddFile { .. } => self.render_input("New File", area, buf),
            DialogKind::AddFolder { .. } => self.render_input("New Folder", area, buf),
            DialogKind::Rename { .. } => self.render_input("Rename", area, buf),
            DialogKind::DeleteConfirm {
                name, descendants, ..
            } => self.render_delete(name, *descendants, area, buf),
            DialogKind::Error { message } => self.render_error(message, area, buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use crate::tree::NodeId;

    fn render(mode: &AppMode, state: &DialogState) -> String {
        let tc = theme::dark_theme();
        let widget = DialogWidget::new(mode, state, &tc);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buffer_to_string(&buf, area)
    }

    #[test]
    fn test_input_dialog_renders() {
        let mode = AppMode::Dialog(DialogKind::AddFile { parent: NodeId(1) });
        let state = DialogState {
            input: "test.txt".to_string(),
            cursor_position: 8,
            error: None,
        };
        let content = render(&mode, &state);
        assert!(content.contains("New File"));
        assert!(content.contains("test.txt"));
        assert!(content.contains("[Enter] Confirm"));
    }

    #[test]
    fn test_input_dialog_shows_inline_error() {
        let mode = AppMode::Dialog(DialogKind::AddFolder { parent: NodeId(1) });
        let state = DialogState {
            input: "a/b".to_string(),
            cursor_position: 3,
            error: Some("Invalid name: name cannot contain '/'".to_string()),
        };
        let content = render(&mode, &state);
        assert!(content.contains("New Folder"));
        assert!(content.contains("cannot contain"));
    }

    #[test]
    fn test_cursor_inside_multibyte_input() {
        let mode = AppMode::Dialog(DialogKind::Rename {
            node: NodeId(2),
            original: "données".to_string(),
        });
        let state = DialogState {
            input: "données".to_string(),
            cursor_position: 2,
            error: None,
        };
        let content = render(&mode, &state);
        assert!(content.contains("Rename"));
        assert!(content.contains("données"));
    }

    #[test]
    fn test_confirm_dialog_renders() {
        let mode = AppMode::Dialog(DialogKind::DeleteConfirm {
            node: NodeId(3),
            name: "raw-data".to_string(),
            descendants: 4,
        });
        let content = render(&mode, &DialogState::default());
        assert!(content.contains("Delete 'raw-data'?"));
        assert!(content.contains("4 nested items"));
        assert!(content.contains("[y] Yes"));
    }

    #[test]
    fn test_error_dialog_renders() {
        let mode = AppMode::Dialog(DialogKind::Error {
            message: "Invalid move: cannot move #3 into #7".to_string(),
        });
        let content = render(&mode, &DialogState::default());
        assert!(content.contains("Error"));
        assert!(content.contains("cannot move #3 into #7"));
    }

    #[test]
    fn test_no_dialog_mode_noop() {
        let content = render(&AppMode::Normal, &DialogState::default());
        assert!(content.trim().is_empty());
    }

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }
}
