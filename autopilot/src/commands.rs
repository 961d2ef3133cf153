//! One-shot command handlers
//!
//! Each command talks to the backend through the same view state the
//! terminal UI uses, then prints the result. Output goes to a caller-supplied
//! writer so commands can be exercised against an in-memory backend.

use anyhow::{bail, Context as _, Result};
use autopilot_sdk::{GenerationBackend, LogEntry, Severity, SpecKind};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::Command;
use crate::config::Settings;
use crate::history::{RecentProject, RecentProjects};
use crate::pipeline::Pipeline;
use crate::poller::StatusPoller;
use crate::tree::FileTree;
use crate::upload::{is_xlsx, UploadForm};
use crate::views::{FilesView, StatusView};

/// Everything a command needs besides its arguments
pub struct Context {
    pub backend: Arc<dyn GenerationBackend>,
    pub settings: Settings,
    pub history_path: PathBuf,
}

impl Context {
    pub fn new(backend: Arc<dyn GenerationBackend>, settings: Settings) -> Self {
        Self {
            backend,
            settings,
            history_path: crate::history::history_file_path(),
        }
    }

    fn remember(&self, project: RecentProject) -> Result<()> {
        let mut history = RecentProjects::load_from(&self.history_path);
        history.record(project, self.settings.history_limit);
        history.save_to(&self.history_path)
    }
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "ℹ",
        Severity::Success => "✓",
        Severity::Warning => "⚠",
        Severity::Error => "✗",
    }
}

pub fn format_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {} {}",
        entry.timestamp.format("%H:%M:%S"),
        severity_icon(entry.severity),
        entry.message
    )
}

/// Indented listing of the whole tree, directories suffixed with `/`
pub fn render_tree(tree: &FileTree) -> Vec<String> {
    tree.visible_rows(&tree.directories())
        .into_iter()
        .map(|entry| {
            let indent = "  ".repeat(entry.depth);
            if entry.is_dir() {
                format!("{}{}/", indent, entry.name)
            } else {
                format!("{}{}", indent, entry.name)
            }
        })
        .collect()
}

pub async fn run(ctx: &Context, command: Command, out: &mut dyn Write) -> Result<()> {
    let backend = ctx.backend.as_ref();
    match command {
        Command::Health => {
            let health = backend.health().await?;
            writeln!(out, "API {} is {}", ctx.settings.api_url, health.status)?;
        }

        Command::Create { name, tech_stack } => {
            let form = UploadForm::new(name, tech_stack);
            let request = form.create_request();
            if request.name.is_empty() || request.tech_stack.is_empty() {
                bail!("Project name and tech stack are required");
            }
            let created = backend.create_project(&request).await?;
            ctx.remember(RecentProject {
                id: created.id.clone(),
                name: request.name,
                tech_stack: request.tech_stack,
                created_at: created.created_at.clone(),
            })?;
            writeln!(out, "{} ({})", created.id, created.status)?;
        }

        Command::Upload {
            project_id,
            features,
            apis,
            database,
            tech_stack,
        } => {
            let mut form = UploadForm::default();
            let chosen = [
                (SpecKind::Features, features),
                (SpecKind::Apis, apis),
                (SpecKind::Database, database),
                (SpecKind::TechStack, tech_stack),
            ];
            for (kind, path) in chosen {
                if let Some(path) = path {
                    if !is_xlsx(&path) {
                        bail!(
                            "{} file must be an .xlsx spreadsheet: {}",
                            kind.label(),
                            path.display()
                        );
                    }
                    form.set_file(kind, path);
                }
            }
            if form.missing_kinds().len() == SpecKind::ALL.len() {
                bail!("Nothing to upload: pass at least one spreadsheet");
            }
            let upload = form.read_upload().await?;
            let response = backend.upload_specs(&project_id, &upload).await?;
            writeln!(out, "{}", response.message)?;
            for file in &response.uploaded_files {
                writeln!(out, "  {}", file)?;
            }
        }

        Command::Generate { project_id } => {
            let response = backend.generate(&project_id).await?;
            writeln!(out, "{}", response.message)?;
        }

        Command::New {
            name,
            tech_stack,
            features,
            apis,
            database,
            tech_stack_file,
            no_watch,
        } => {
            let form = UploadForm::new(name, tech_stack)
                .with_file(SpecKind::Features, features)
                .with_file(SpecKind::Apis, apis)
                .with_file(SpecKind::Database, database)
                .with_file(SpecKind::TechStack, tech_stack_file);

            let launched = Pipeline::new(backend).launch(&form).await?;
            let request = form.create_request();
            ctx.remember(RecentProject {
                id: launched.project_id.clone(),
                name: request.name,
                tech_stack: request.tech_stack,
                created_at: launched.created.created_at.clone(),
            })?;
            writeln!(out, "Project {} created", launched.project_id)?;
            writeln!(out, "{}", launched.generate.message)?;

            if !no_watch {
                watch_status(ctx, &launched.project_id, true, out).await?;
            }
        }

        Command::Status { project_id, watch } => {
            watch_status(ctx, &project_id, watch, out).await?;
        }

        Command::Tree { project_id } => {
            let root = backend.get_files(&project_id).await?;
            let tree = FileTree::build(&root, ctx.settings.max_tree_depth)?;
            for line in render_tree(&tree) {
                writeln!(out, "{}", line)?;
            }
        }

        Command::Cat { project_id, path } => {
            let response = backend.get_file_content(&project_id, &path).await?;
            write!(out, "{}", response.content)?;
            if !response.content.ends_with('\n') {
                writeln!(out)?;
            }
        }

        Command::Optimize { project_id, paths } => {
            optimize(ctx, &project_id, &paths, out).await?;
        }

        Command::Recent => {
            let history = RecentProjects::load_from(&ctx.history_path);
            if history.is_empty() {
                writeln!(out, "No recent projects")?;
            }
            for project in &history.projects {
                writeln!(
                    out,
                    "{}  {}  {}  {}",
                    project.id, project.name, project.tech_stack, project.created_at
                )?;
            }
        }

        Command::Open { .. } => {
            bail!("The open command needs an interactive terminal");
        }
    }
    Ok(())
}

/// Print the project's log, optionally following it until a terminal status
async fn watch_status(
    ctx: &Context,
    project_id: &str,
    follow: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let mut view = StatusView::new(project_id);
    view.load(ctx.backend.as_ref()).await?;
    for entry in view.logs.entries() {
        writeln!(out, "{}", format_entry(entry))?;
    }

    if follow && view.needs_polling() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = StatusPoller::spawn(
            Arc::clone(&ctx.backend),
            project_id,
            ctx.settings.poll_interval(),
            tx,
        );

        while let Some(event) = rx.recv().await {
            let before = view.logs.len();
            let stopped = view.apply_poll(event);
            for entry in view.logs.entries().iter().skip(before) {
                writeln!(out, "{}", format_entry(entry))?;
            }
            if stopped {
                break;
            }
        }
        poller.join().await;
    }

    if view.actions_enabled() {
        info!(project_id = %project_id, "generation finished");
        writeln!(out, "Files are ready: autopilot tree {}", project_id)?;
    } else if view.step == autopilot_sdk::StepStatus::Error {
        bail!("Project generation failed");
    }
    Ok(())
}

async fn optimize(
    ctx: &Context,
    project_id: &str,
    paths: &[String],
    out: &mut dyn Write,
) -> Result<()> {
    let mut view = FilesView::new(project_id, ctx.settings.max_tree_depth);
    view.load_tree(ctx.backend.as_ref())
        .await
        .context("Failed to load the file tree")?;
    for path in paths {
        if !view.select_for_optimization(path) {
            bail!("Not in the generated file tree: {}", path);
        }
    }

    let outcome = view.optimize(ctx.backend.as_ref()).await;
    for entry in view.logs.entries() {
        if entry.severity == Severity::Warning {
            writeln!(out, "{}", format_entry(entry))?;
        }
    }
    outcome?;

    for line in &view.optimize_results {
        let mark = if line.success { "✓" } else { "✗" };
        if line.message.is_empty() {
            writeln!(out, "{} {}", mark, line.path)?;
        } else {
            writeln!(out, "{} {}: {}", mark, line.path, line.message)?;
        }
    }
    Ok(())
}
