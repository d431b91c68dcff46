//! Terminal dashboard for inspecting Pub/Sub topics and
//! subscriptions: current resource details, recents history, and
//! one-hour metric charts, all driven by single keystrokes.

mod commands;
mod picker;
mod theme;
mod view;
mod window;

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_subscriber::EnvFilter;

use pubsub_meta_core::config::{Config, LOG_FILTER_ENV};
use pubsub_meta_core::fake::FakeCloud;

use window::{Remotes, Window};

#[derive(Parser)]
#[command(name = "pubsub-meta")]
#[command(about = "Terminal dashboard for Pub/Sub topics and subscriptions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the home directory
    Init,
    /// Print the resolved configuration
    Info,
    /// Rebuild the local project roster from the remote directory
    FetchProjects,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let home = Config::resolve_home();

    if let Some(Commands::Init) = cli.command {
        return commands::run_init(&home);
    }
    if !home.is_dir() {
        eprintln!(
            "{} is not initialized, run: pubsub-meta init",
            home.display()
        );
        std::process::exit(1);
    }

    let config = Config::load(home).context("loading configuration")?;
    init_logging(&config.log_file())?;

    let remotes = connect();
    match cli.command {
        Some(Commands::Info) => {
            commands::run_info(&config);
            Ok(())
        }
        Some(Commands::FetchProjects) => {
            commands::run_fetch_projects(&config, remotes.projects.as_ref()).await
        }
        Some(Commands::Init) => unreachable!("handled before config load"),
        None => run_dashboard(config, remotes).await,
    }
}

/// File logger; the alternate screen owns stdout, so nothing may
/// print there while the dashboard runs.
fn init_logging(log_file: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Remote service handles. Concrete API clients live outside this
/// binary; the bundled in-memory backend serves the demo fleet.
fn connect() -> Remotes {
    let cloud = Arc::new(FakeCloud::demo());
    Remotes {
        topics: cloud.clone(),
        subscriptions: cloud.clone(),
        projects: cloud.clone(),
        metrics: cloud,
    }
}

async fn run_dashboard(config: Config, remotes: Remotes) -> anyhow::Result<()> {
    let mut terminal = setup_terminal()?;
    let mut win = Window::new(config, remotes);
    let result = win.run(&mut terminal).await;
    restore_terminal(terminal)?;
    result.context("dashboard loop")
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
