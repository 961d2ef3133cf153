//! Files screen: tree, viewer and optimize panel

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::components::render_log_panel;
use crate::app::{App, FilesPane};
use crate::views::FilesView;

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

pub fn render_files(f: &mut Frame, area: Rect, app: &App) {
    let Some(view) = app.files.as_ref() else {
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(8)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(8)])
        .split(columns[1]);

    render_tree(f, left[0], app, view);
    render_optimize_panel(f, left[1], view);
    render_viewer(f, right[0], app, view);
    render_log_panel(f, right[1], &view.logs, "Activity");
}

fn render_tree(f: &mut Frame, area: Rect, app: &App, view: &FilesView) {
    let focused = app.files_pane == FilesPane::Tree;
    let title = if app.filter.is_empty() {
        " Files ".to_string()
    } else {
        format!(" Files /{} ", app.filter)
    };

    if view.tree_loading {
        f.render_widget(
            Paragraph::new("Loading file tree…").block(pane_block(title, focused)),
            area,
        );
        return;
    }
    if let Some(error) = &view.tree_error {
        f.render_widget(
            Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::Red)))
                .wrap(Wrap { trim: true })
                .block(pane_block(title, focused)),
            area,
        );
        return;
    }

    let rows = app.file_rows();
    let height = area.height.saturating_sub(2) as usize;
    let offset = app.tree_cursor.saturating_sub(height.saturating_sub(1));
    let filtering = !app.filter.is_empty();

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(idx, entry)| {
            let marker = if view.selected_for_optimization.contains(&entry.path) {
                Span::styled("[x] ", Style::default().fg(Color::Green))
            } else {
                Span::raw("[ ] ")
            };
            let label = if filtering {
                entry.path.clone()
            } else {
                let indent = "  ".repeat(entry.depth);
                let icon = if !entry.is_dir() {
                    "  "
                } else if entry.depth == 0 || view.expanded.contains(&entry.path) {
                    "▼ "
                } else {
                    "▶ "
                };
                format!("{}{}{}", indent, icon, entry.name)
            };

            let mut style = if entry.is_dir() {
                Style::default().fg(Color::Blue)
            } else {
                Style::default()
            };
            if view.selected_file.as_deref() == Some(entry.path.as_str()) {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if idx == app.tree_cursor {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(vec![marker, Span::styled(label, style)]))
        })
        .collect();

    f.render_widget(List::new(items).block(pane_block(title, focused)), area);
}

fn render_viewer(f: &mut Frame, area: Rect, app: &App, view: &FilesView) {
    let focused = app.files_pane == FilesPane::Viewer;
    let title = match &view.selected_file {
        Some(path) => format!(" {} ", path),
        None => " Viewer ".to_string(),
    };

    let body = if view.content_loading {
        Paragraph::new("Loading…")
    } else if let Some(error) = &view.content_error {
        Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::Red)))
            .wrap(Wrap { trim: true })
    } else if let Some(content) = &view.content {
        Paragraph::new(content.as_str()).scroll((app.viewer_scroll, 0))
    } else {
        Paragraph::new(Span::styled(
            "Select a file to view its contents",
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(body.block(pane_block(title, focused)), area);
}

fn render_optimize_panel(f: &mut Frame, area: Rect, view: &FilesView) {
    let mut lines = Vec::new();
    if view.optimize_in_progress {
        lines.push(Line::from(Span::styled(
            "Optimizing…",
            Style::default().fg(Color::Yellow),
        )));
    } else if view.optimize_results.is_empty() {
        let selected = view.selected_for_optimization.len();
        lines.push(Line::from(format!("{} file(s) selected", selected)));
    }

    for result in &view.optimize_results {
        let (icon, style) = if result.success {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("✗", Style::default().fg(Color::Red))
        };
        let mut spans = vec![
            Span::styled(format!("{} ", icon), style),
            Span::raw(result.path.clone()),
        ];
        if !result.message.is_empty() {
            spans.push(Span::styled(
                format!(": {}", result.message),
                Style::default().fg(Color::Gray),
            ));
        }
        lines.push(Line::from(spans));
    }

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Optimize "));
    f.render_widget(panel, area);
}
