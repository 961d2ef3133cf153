//! Header and footer rendering functions

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Screen};

pub fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let page = match app.screen {
        Screen::Status => "Generation Status",
        Screen::Files => "Generated Files",
    };
    let name = app
        .status
        .project
        .as_ref()
        .map(|p| p.name.as_str())
        .unwrap_or("…");

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("AutoPilot - {}", page),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(name.to_string(), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("  ({})", app.project_id()),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn key(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
}

fn dimmed(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::default().fg(Color::DarkGray))
}

pub fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let footer_text = match app.screen {
        Screen::Status => {
            let mut spans = Vec::new();
            if app.status.can_retry() {
                spans.push(key("[R]"));
                spans.push(Span::raw(" Retry generation  "));
            } else {
                spans.push(dimmed("[R] Retry generation  "));
            }
            if app.status.actions_enabled() {
                spans.push(key("[F]"));
                spans.push(Span::raw(" View files  "));
            } else {
                spans.push(dimmed("[F] View files  "));
            }
            spans.push(key("[Q]"));
            spans.push(Span::raw(" Quit"));
            Line::from(spans)
        }
        Screen::Files if app.filter_active => Line::from(vec![
            Span::styled("FILTER", Style::default().fg(Color::Black).bg(Color::Yellow)),
            Span::raw(format!(" /{}  ", app.filter)),
            key("[Enter]"),
            Span::raw(" Open  "),
            key("[Esc]"),
            Span::raw(" Cancel"),
        ]),
        Screen::Files => {
            let can_optimize = app.files.as_ref().map_or(false, |v| v.can_optimize());
            let mut spans = vec![
                key("[↑↓]"),
                Span::raw(" Navigate  "),
                key("[Enter]"),
                Span::raw(" Open  "),
                key("[Space]"),
                Span::raw(" Select  "),
                key("[/]"),
                Span::raw(" Filter  "),
            ];
            if can_optimize {
                spans.push(key("[O]"));
                spans.push(Span::raw(" Optimize  "));
            } else {
                spans.push(dimmed("[O] Optimize  "));
            }
            spans.extend([
                key("[Tab]"),
                Span::raw(" Pane  "),
                key("[Esc]"),
                Span::raw(" Back  "),
                key("[Q]"),
                Span::raw(" Quit"),
            ]);
            Line::from(spans)
        }
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
