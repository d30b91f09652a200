mod api;
mod app;
mod classify;
mod config;
mod error;
mod format;
mod keys;
mod mock;
mod model;
mod pagination;
mod ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{execute, queue};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{Backend, CF_API_BASE, CloudflareBackend, DnsBackend};
use crate::app::{App, Task};
use crate::config::State;
use crate::mock::MockBackend;

/// Manage Cloudflare DNS records and inspect Worker routes from the terminal.
#[derive(Parser, Debug)]
#[command(name = "flaredns", version, about)]
struct Cli {
    /// API token to use instead of the stored one
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Where the token and current zone are remembered
    #[arg(long, default_value_os_t = config::default_state_path())]
    state_file: PathBuf,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, default_value_os_t = config::default_log_path())]
    log_file: PathBuf,

    /// Cloudflare API base URL
    #[arg(long, default_value = CF_API_BASE)]
    api_base: String,

    /// Use built-in demo data instead of the Cloudflare API
    #[arg(long, env = "FLAREDNS_OFFLINE")]
    offline: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("flaredns={level}")));

    let dir = cli.log_file.parent().unwrap_or(Path::new("."));
    let file_name = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("flaredns.log"));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    guard
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_tracing(&cli);

    let mut state = State::load(&cli.state_file)?;
    if let Some(token) = cli.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        state.api_token = Some(token.to_string());
    }

    let backend = if cli.offline {
        info!("running against demo data");
        Backend::Mock(MockBackend::new())
    } else {
        Backend::Cloudflare(CloudflareBackend::new_with_base(cli.api_base.as_str())?)
    };

    let mut app = App::new(&cli.state_file, state, backend);
    app.queue(Task::Startup);

    enable_raw_mode()?;
    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(err) => {
            let _ = disable_raw_mode();
            return Err(err);
        }
    };

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Application error: {err:?}");
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    queue!(stdout, EnterAlternateScreen)?;
    stdout.flush()?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn run_app<B: DnsBackend>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<B>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if app.is_loading() {
            app.run_pending();
            continue;
        }

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && keys::handle_key(key.code, app)
        {
            return Ok(());
        }
    }
}
