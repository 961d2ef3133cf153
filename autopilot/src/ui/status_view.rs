//! Status screen

use autopilot_sdk::{StepState, StepStatus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::components::{centered_rect, render_log_panel};
use crate::app::App;

fn badge_style(step: StepStatus) -> Style {
    let bg = match step {
        StepStatus::Uploaded => Color::Blue,
        StepStatus::Parsing | StepStatus::Generating => Color::Yellow,
        StepStatus::Ready => Color::Green,
        StepStatus::Error => Color::Red,
    };
    Style::default()
        .fg(Color::Black)
        .bg(bg)
        .add_modifier(Modifier::BOLD)
}

fn render_steps(step: StepStatus) -> Line<'static> {
    let mut spans = Vec::new();
    for (idx, (s, state)) in step.indicator().into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" ─── ", Style::default().fg(Color::DarkGray)));
        }
        let (icon, style) = match state {
            StepState::Completed => ("✓", Style::default().fg(Color::Green)),
            StepState::Current => (
                "●",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            StepState::Pending => ("○", Style::default().fg(Color::DarkGray)),
        };
        spans.push(Span::styled(format!("{} {}", icon, s.caption()), style));
    }
    Line::from(spans)
}

pub fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let view = &app.status;

    if view.loading && view.project.is_none() {
        let loading = Paragraph::new("Loading project…")
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(loading, area);
        return;
    }

    if let Some(error) = &view.load_error {
        let popup = centered_rect(60, 30, area);
        f.render_widget(Clear, popup);
        let text = vec![
            Line::from(Span::styled(
                "Could not load project",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(error.clone()),
            Line::from(""),
            Line::from(Span::styled("Press [Q] to quit", Style::default().fg(Color::Gray))),
        ];
        let paragraph = Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Error "));
        f.render_widget(paragraph, popup);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(5),
        ])
        .split(area);

    let mut summary = vec![Line::from(vec![
        Span::raw("Status: "),
        Span::styled(format!(" {} ", view.step.label()), badge_style(view.step)),
        Span::raw("  "),
        Span::styled(
            view.status().map(|s| s.to_string()).unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
        ),
    ])];
    if let Some(project) = &view.project {
        summary.push(Line::from(format!("Tech stack: {}", project.tech_stack)));
        if let Some(step) = &project.current_step {
            summary.push(Line::from(Span::styled(
                step.clone(),
                Style::default().fg(Color::Gray),
            )));
        }
    }
    if view.poll_failures > 0 {
        summary.push(Line::from(Span::styled(
            format!("{} status poll(s) failed, still retrying", view.poll_failures),
            Style::default().fg(Color::Yellow),
        )));
    }
    let summary = Paragraph::new(summary)
        .block(Block::default().borders(Borders::ALL).title(" Project "));
    f.render_widget(summary, chunks[0]);

    let steps = Paragraph::new(render_steps(view.step))
        .block(Block::default().borders(Borders::ALL).title(" Progress "));
    f.render_widget(steps, chunks[1]);

    let title = if view.retry_in_progress {
        "Logs (requesting generation…)"
    } else {
        "Logs"
    };
    render_log_panel(f, chunks[2], &view.logs, title);
}
