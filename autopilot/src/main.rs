use anyhow::{Context, Result};
use autopilot::app::App;
use autopilot::cli::{Args, Command};
use autopilot::client::HttpBackend;
use autopilot::commands;
use autopilot::config::{self, Settings};
use autopilot::ui::ui;
use autopilot_sdk::GenerationBackend;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let interactive = matches!(args.command, Command::Open { .. });
    init_tracing(&args.log_level, interactive)?;

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(url) = &args.api_url {
        settings.api_url = url.clone();
    }
    if let Some(ms) = args.poll_interval_ms {
        settings.poll_interval_ms = ms;
    }
    settings.validate()?;

    let backend: Arc<dyn GenerationBackend> = Arc::new(
        HttpBackend::new(&settings.api_url, settings.request_timeout())?,
    );

    match args.command {
        Command::Open { project_id } => run_tui(backend, settings, project_id),
        command => {
            let runtime =
                tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
            let ctx = commands::Context::new(backend, settings);
            let mut stdout = io::stdout();
            runtime.block_on(commands::run(&ctx, command, &mut stdout))
        }
    }
}

/// Log to stderr for one-shot commands; to a file under the data directory
/// for the terminal UI so output never lands on the screen
fn init_tracing(level: &str, interactive: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level: {}", level))?,
    };

    if interactive {
        let dir = config::data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join("autopilot.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

fn run_tui(
    backend: Arc<dyn GenerationBackend>,
    settings: Settings,
    project_id: String,
) -> Result<()> {
    let mut app = App::new(backend, settings, project_id)?;
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown();
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.drain_events();

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
