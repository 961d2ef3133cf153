//! Keyboard handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{App, FilesPane, Screen};

impl App {
    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.screen {
            Screen::Status => self.on_status_key(key.code),
            Screen::Files if self.filter_active => self.on_filter_key(key.code),
            Screen::Files => self.on_files_key(key.code),
        }
    }

    fn on_status_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => self.retry_generation(),
            KeyCode::Char('f') | KeyCode::Enter => self.open_files(),
            _ => {}
        }
    }

    fn on_files_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Char('b') => {
                if self.filter.is_empty() {
                    self.close_files();
                } else {
                    self.filter.clear();
                    self.tree_cursor = 0;
                }
            }
            KeyCode::Tab => {
                self.files_pane = match self.files_pane {
                    FilesPane::Tree => FilesPane::Viewer,
                    FilesPane::Viewer => FilesPane::Tree,
                };
            }
            KeyCode::Char('/') => {
                self.filter_active = true;
                self.files_pane = FilesPane::Tree;
            }
            KeyCode::Char('o') => self.submit_optimize(),
            KeyCode::Char(' ') => self.toggle_row_selection(),
            KeyCode::Enter => self.activate_row(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::PageDown => {
                self.viewer_scroll = self.viewer_scroll.saturating_add(20);
            }
            KeyCode::PageUp => {
                self.viewer_scroll = self.viewer_scroll.saturating_sub(20);
            }
            _ => {}
        }
    }

    fn on_filter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.filter_active = false;
                self.filter.clear();
                self.tree_cursor = 0;
            }
            KeyCode::Enter => {
                self.filter_active = false;
                self.activate_row();
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.tree_cursor = 0;
            }
            KeyCode::Down => self.move_down(),
            KeyCode::Up => self.move_up(),
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.tree_cursor = 0;
            }
            _ => {}
        }
    }

    fn move_down(&mut self) {
        match self.files_pane {
            FilesPane::Tree => {
                let rows = self.file_rows().len();
                if rows > 0 && self.tree_cursor + 1 < rows {
                    self.tree_cursor += 1;
                }
            }
            FilesPane::Viewer => {
                self.viewer_scroll = self.viewer_scroll.saturating_add(1);
            }
        }
    }

    fn move_up(&mut self) {
        match self.files_pane {
            FilesPane::Tree => self.tree_cursor = self.tree_cursor.saturating_sub(1),
            FilesPane::Viewer => self.viewer_scroll = self.viewer_scroll.saturating_sub(1),
        }
    }
}
