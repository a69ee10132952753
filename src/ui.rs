use ratatui::{
    layout::{Constraint, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::breadcrumb::BreadcrumbWidget;
use crate::components::dialog::DialogWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI: breadcrumbs, tree, status bar, and any dialog on top.
pub fn render(app: &mut App, frame: &mut Frame) {
    app.clear_expired_status();

    let [crumb_area, tree_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let crumbs = app.grid.breadcrumbs();
    frame.render_widget(BreadcrumbWidget::new(&crumbs, &app.theme), crumb_area);

    // Keep the selection inside the bordered tree panel.
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));
    let inner = block.inner(tree_area);
    app.tree_area = inner;
    app.grid.update_scroll(inner.height as usize);

    let tree_widget = TreeWidget::new(&app.grid, &app.theme, app.config.use_icons())
        .marked(app.marked)
        .block(block);
    frame.render_widget(tree_widget, tree_area);

    let info = selection_info(app);
    let mut status = StatusBarWidget::new(&info, &app.theme).pending(app.grid.pending_count());
    if app.mode == AppMode::Filter || app.grid.is_filtering() {
        status = status.filter(&app.filter_input, app.mode == AppMode::Filter);
    }
    if let Some(msg) = &app.status_message {
        status = status.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(status, status_area);

    if matches!(app.mode, AppMode::Dialog(_)) {
        frame.render_widget(
            DialogWidget::new(&app.mode, &app.dialog_state, &app.theme),
            frame.area(),
        );
    }
}

/// "3/12 · folder · name ↑"
fn selection_info(app: &App) -> String {
    let total = app.grid.visible_len();
    let position = if total == 0 {
        0
    } else {
        app.grid.selected_index + 1
    };
    let mut parts = vec![format!("{}/{}", position, total)];
    if let Some(node) = app.grid.selected_node() {
        parts.push(node.kind.label().to_lowercase());
    }
    if let Some(sort) = app.grid.sort() {
        parts.push(sort.label());
    }
    parts.join(" · ")
}
