//! UI rendering for the interactive client
//!
//! Rendering is read-only over [`App`]; all state changes happen in the
//! app module between frames.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::app::{App, Screen};

mod components;
mod files_view;
mod header_footer;
mod status_view;

pub use components::{centered_rect, render_log_panel, severity_style};
pub use files_view::render_files;
pub use header_footer::{render_footer, render_header};
pub use status_view::render_status;

/// Main UI rendering function
pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, chunks[0], app);

    match app.screen {
        Screen::Status => render_status(f, chunks[1], app),
        Screen::Files => render_files(f, chunks[1], app),
    }

    render_footer(f, chunks[2], app);
}
