mod app;
mod commands;
mod surface;
mod ui;
mod watcher;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event as CEvent, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info};

use opsdeck_core::config::OpsdeckConfig;

use app::App;

#[derive(Parser)]
#[command(name = "opsdeck")]
#[command(about = "Terminal command center for field operations", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of searching for opsdeck.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file for the TUI (defaults to <preferences dir>/opsdeck.log)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive command center (default)
    Tui,
    /// Print the keyboard map
    Keys,
    /// Check configuration, preferences and terminal
    Doctor,
}

/// Resolve the config and the directory relative paths hang off.
fn load_config(explicit: Option<&Path>) -> io::Result<(Option<PathBuf>, PathBuf, OpsdeckConfig)> {
    let cwd = std::env::current_dir()?;
    let (path, config) = match explicit {
        Some(path) => (Some(path.to_path_buf()), OpsdeckConfig::load(path).map_err(io::Error::other)?),
        None => OpsdeckConfig::discover_or_default(&cwd).map_err(io::Error::other)?,
    };
    let base = path
        .as_deref()
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or(cwd, Path::to_path_buf);
    Ok((path, base, config))
}

fn init_tracing(log_file: Option<&Path>) -> io::Result<()> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

// --- Terminal setup/teardown ---
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_tui(cli: &Cli) -> io::Result<()> {
    let (path, base, config) = load_config(cli.config.as_deref())?;
    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| config.preferences_dir(&base).join("opsdeck.log"));
    init_tracing(Some(&log_path))?;
    match &path {
        Some(path) => info!(config = %path.display(), "configuration loaded"),
        None => info!("no configuration file, using defaults"),
    }

    let mut app = App::new(&config, &base)?;
    let mut terminal = setup_terminal()?;
    app.resize(terminal.size()?.width);

    let result = event_loop(&mut terminal, &mut app);
    if let Err(e) = &result {
        error!(error = %e, "terminal loop failed");
    }

    app.shutdown();
    restore_terminal(terminal)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    while !app.quit {
        app.tick();
        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        match event::read()? {
            CEvent::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => app.handle_key(code, modifiers),
            CEvent::Resize(width, _) => app.resize(width),
            _ => {}
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Keys) => {
            commands::run_keys();
            Ok(())
        }
        Some(Commands::Doctor) => {
            init_tracing(None)?;
            match commands::run_doctor(cli.config.as_deref()) {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Tui) | None => run_tui(&cli).await,
    }
}
