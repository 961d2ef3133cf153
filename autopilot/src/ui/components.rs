//! Shared widgets and helpers

use autopilot_sdk::Severity;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::views::LogPanel;

pub fn severity_style(severity: Severity) -> (Style, &'static str) {
    match severity {
        Severity::Info => (Style::default().fg(Color::Cyan), "ℹ"),
        Severity::Success => (Style::default().fg(Color::Green), "✓"),
        Severity::Warning => (Style::default().fg(Color::Yellow), "⚠"),
        Severity::Error => (Style::default().fg(Color::Red), "✗"),
    }
}

/// Log panel showing the newest entries that fit
pub fn render_log_panel(f: &mut Frame, area: Rect, logs: &LogPanel, title: &str) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = logs.len().saturating_sub(visible);

    let items: Vec<ListItem> = logs
        .entries()
        .iter()
        .skip(skip)
        .map(|entry| {
            let (style, icon) = severity_style(entry.severity);
            ListItem::new(Line::from(vec![
                Span::styled(
                    entry.timestamp.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{} ", icon), style),
                Span::raw(entry.message.clone()),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", title)),
    );
    f.render_widget(list, area);
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = ratatui::layout::Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    ratatui::layout::Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
