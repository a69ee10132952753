use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " a:add  A:folder  r:ren  d:del  x/p:move  /:filter ";

/// Status bar widget: selection info, filter prompt, key hints, or a flash message.
pub struct StatusBarWidget<'a> {
    info: &'a str,
    theme: &'a ThemeColors,
    filter: Option<(&'a str, bool)>,
    status_message: Option<&'a str>,
    is_error: bool,
    pending: usize,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            info,
            theme,
            filter: None,
            status_message: None,
            is_error: false,
            pending: 0,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    /// Show the filter query; `editing` adds a cursor.
    pub fn filter(mut self, query: &'a str, editing: bool) -> Self {
        self.filter = Some((query, editing));
        self
    }

    pub fn pending(mut self, count: usize) -> Self {
        self.pending = count;
        self
    }
}

/// Cut `s` to at most `width` characters.
fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;
        buf.set_style(area, Style::default().bg(self.theme.status_bg));

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let display = format!("{:<width$}", truncate(msg, width), width = width);
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let mut spans = Vec::new();
        if let Some((query, editing)) = self.filter {
            let cursor = if editing { "▏" } else { "" };
            spans.push(Span::styled(
                format!("/{}{} ", query, cursor),
                Style::default()
                    .fg(self.theme.match_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::styled(
            self.info.to_string(),
            Style::default().fg(self.theme.status_fg),
        ));
        if self.pending > 0 {
            spans.push(Span::styled(
                format!("  ⟳ {} pending", self.pending),
                Style::default()
                    .fg(self.theme.pending_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let hints_len = KEY_HINTS.len();
        if used + hints_len <= width {
            spans.push(Span::raw(" ".repeat(width - used - hints_len)));
            spans.push(Span::styled(
                KEY_HINTS,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
