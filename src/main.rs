//! restoview - Browse restaurant reviews from the terminal
//!
//! A terminal UI over the restaurant-review server that keeps working offline
//! from a local cache. Print-only modes (`--list`, `--cuisines`,
//! `--neighborhoods`, `--show`) write to stdout and exit.

use std::fs::OpenOptions;
use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use restoview::app::{App, AppState};
use restoview::cache::CacheManager;
use restoview::cli::{format_listing_line, Cli, Mode, StartupConfig};
use restoview::data::RestaurantGateway;
use restoview::ui;

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written inside the cache directory while the TUI owns the screen
const LOG_FILE: &str = "restoview.log";

/// Initialize the tracing subscriber for logging
///
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug). Print modes log
/// to stderr; the TUI logs to a file in the cache directory, or nowhere if
/// there is no cache directory.
fn init_tracing(mode: &Mode, cache: Option<&CacheManager>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if mode.is_print() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return;
    }

    let log_file = cache.and_then(|cache| {
        std::fs::create_dir_all(cache.cache_dir()).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(cache.cache_dir().join(LOG_FILE))
            .ok()
    });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(filter)
            .init();
    }
}

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match &app.state {
        AppState::Loading => {
            render_message(frame, "Loading restaurants...", ratatui::style::Color::Cyan);
        }
        AppState::LoadFailed(message) => {
            let text = format!("{}\n\nPress r to retry or q to quit", message);
            render_message(frame, &text, ratatui::style::Color::Red);
        }
        AppState::RestaurantList => {
            ui::render_restaurant_list(frame, app);
        }
        AppState::RestaurantDetail(id) => {
            ui::render_restaurant_detail(frame, app, id);
        }
        AppState::Map => {
            ui::render_restaurant_map(frame, app);
        }
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Renders a centered message while there is nothing else to show
fn render_message(frame: &mut ratatui::Frame, text: &str, color: ratatui::style::Color) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::Style,
        widgets::{Paragraph, Wrap},
    };

    let area = frame.area();

    // Center the message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(5),
            Constraint::Percentage(40),
        ])
        .split(area);

    let paragraph = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, chunks[1]);
}

/// Runs the interactive terminal UI until the user quits
async fn run_tui(mut app: App) -> Result<(), Box<dyn std::error::Error>> {
    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Initial render to show loading state
    terminal.draw(|f| render_ui(f, &app))?;

    // Trigger initial data load
    app.load_all_data().await;

    // Main event loop
    loop {
        // Render UI
        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }

        app.process_requests().await;
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    app.gateway().settle().await;
    Ok(())
}

/// Prints the requested view to stdout
async fn run_print(
    gateway: &RestaurantGateway,
    config: &StartupConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = &config.filter;
    match &config.mode {
        Mode::Browse => {}
        Mode::List => {
            let restaurants = gateway
                .filter_by_cuisine_and_neighborhood(&filter.cuisine, &filter.neighborhood)
                .await?;
            for restaurant in &restaurants {
                println!("{}", format_listing_line(restaurant));
            }
        }
        Mode::Cuisines => {
            for cuisine in gateway.list_cuisines().await? {
                println!("{}", cuisine);
            }
        }
        Mode::Neighborhoods => {
            for neighborhood in gateway.list_neighborhoods().await? {
                println!("{}", neighborhood);
            }
        }
        Mode::Show(id) => {
            let restaurant = gateway.get_by_id(id.clone()).await?;
            println!("{}", serde_json::to_string_pretty(&restaurant)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    let cache = config.cache_manager();
    init_tracing(&config.mode, cache.as_ref());
    info!(server = %config.server, mode = ?config.mode, "restoview starting");

    let gateway = RestaurantGateway::with_config(config.gateway_config(), cache)?;

    if config.mode.is_print() {
        let result = run_print(&gateway, &config).await;
        gateway.settle().await;
        return match result {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                eprintln!("error: {}", e);
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let app = App::new(gateway, config.filter.clone());
    run_tui(app).await?;

    info!("restoview shutting down");
    Ok(ExitCode::SUCCESS)
}
