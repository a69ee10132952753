use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;
use crate::tree::NodeId;

const SEPARATOR: &str = " › ";

/// Breadcrumb bar. Each crumb is numbered with the key that jumps to it.
pub struct BreadcrumbWidget<'a> {
    crumbs: &'a [(NodeId, String)],
    theme: &'a ThemeColors,
}

impl<'a> BreadcrumbWidget<'a> {
    pub fn new(crumbs: &'a [(NodeId, String)], theme: &'a ThemeColors) -> Self {
        Self { crumbs, theme }
    }
}

impl<'a> Widget for BreadcrumbWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 || self.crumbs.is_empty() {
            return;
        }

        let last = self.crumbs.len() - 1;
        let key_style = Style::default().fg(self.theme.dim_fg);
        let crumb_style = Style::default().fg(self.theme.crumb_fg);
        let current_style = crumb_style.add_modifier(Modifier::BOLD);

        let mut spans = Vec::with_capacity(self.crumbs.len() * 3);
        for (i, (_, label)) in self.crumbs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(SEPARATOR, key_style));
            }
            if i <= 9 {
                spans.push(Span::styled(format!("{}:", i), key_style));
            }
            let style = if i == last { current_style } else { crumb_style };
            spans.push(Span::styled(label.as_str(), style));
        }

        // Keep the tail visible when the path is wider than the bar.
        let total: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let width = area.width as usize;
        if total > width {
            let mut skip = total - width + 1;
            let mut kept = vec![Span::styled("…", key_style)];
            for span in spans {
                let len = span.content.chars().count();
                if skip >= len {
                    skip -= len;
                    continue;
                }
                if skip > 0 {
                    let tail: String = span.content.chars().skip(skip).collect();
                    kept.push(Span::styled(tail, span.style));
                    skip = 0;
                } else {
                    kept.push(span);
                }
            }
            spans = kept;
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn render(crumbs: &[(NodeId, String)], width: u16) -> String {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        BreadcrumbWidget::new(crumbs, &tc).render(area, &mut buf);
        (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn crumbs(labels: &[&str]) -> Vec<(NodeId, String)> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| (NodeId(i as u64), l.to_string()))
            .collect()
    }

    #[test]
    fn numbers_each_crumb() {
        let line = render(&crumbs(&["Lab", "Survey", "data"]), 60);
        assert_eq!(line, "0:Lab › 1:Survey › 2:data");
    }

    #[test]
    fn narrow_bar_keeps_the_tail() {
        let line = render(&crumbs(&["Lab", "Survey", "data"]), 12);
        assert_eq!(line.chars().count(), 12);
        assert!(line.starts_with('…'));
        assert!(line.ends_with("2:data"));
    }

    #[test]
    fn current_crumb_is_bold() {
        let tc = theme::dark_theme();
        let c = crumbs(&["Lab", "A"]);
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        BreadcrumbWidget::new(&c, &tc).render(area, &mut buf);
        // "0:Lab › 1:A": 'A' at column 10
        assert!(buf.cell((10, 0)).unwrap().modifier.contains(Modifier::BOLD));
        assert!(!buf.cell((2, 0)).unwrap().modifier.contains(Modifier::BOLD));
    }
}
