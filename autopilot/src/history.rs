//! Recently created projects
//!
//! Stored as `history.json` in the platform data directory, newest first.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentProject {
    pub id: String,
    pub name: String,
    pub tech_stack: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentProjects {
    pub projects: Vec<RecentProject>,
}

/// Get the path to the history file
pub fn history_file_path() -> PathBuf {
    crate::config::data_dir().join("history.json")
}

impl RecentProjects {
    /// A missing or unreadable file is an empty history
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write history to {}", path.display()))?;
        Ok(())
    }

    /// Put `project` first, dropping an older entry with the same id and
    /// anything past `limit`
    pub fn record(&mut self, project: RecentProject, limit: usize) {
        self.projects.retain(|p| p.id != project.id);
        self.projects.insert(0, project);
        self.projects.truncate(limit);
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
