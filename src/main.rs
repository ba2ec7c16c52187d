use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::info;

use statusdeck::app::{App, Services, View};
use statusdeck::data::{
    normalize_events, reconcile, select_visible, VisibilityPolicy, VisibilityWindow,
};
use statusdeck::settings::{Overrides, Settings};
use statusdeck::source::{HttpClient, StatsClient};
use statusdeck::{events, logging, ui};

#[derive(Parser, Debug)]
#[command(name = "statusdeck")]
#[command(about = "Terminal status dashboard: live gauges, upcoming events and a day schedule")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the stats service (e.g. http://127.0.0.1:8001)
    #[arg(short, long)]
    url: Option<String>,

    /// Poll interval in milliseconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Per-fetch timeout in milliseconds (must be below the interval)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Which events the dashboard list shows
    #[arg(long, value_parser = parse_visibility)]
    visibility: Option<VisibilityPolicy>,

    /// Log file (the terminal is used by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fetch once, print reconciled metrics and visible events as JSON, and exit
    #[arg(long)]
    once: bool,
}

fn parse_visibility(s: &str) -> Result<VisibilityPolicy, String> {
    match s {
        "list-view" => Ok(VisibilityPolicy::ListView),
        "recent-start" => Ok(VisibilityPolicy::RecentStart),
        other => Err(format!(
            "unknown visibility {:?} (expected list-view or recent-start)",
            other
        )),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = Overrides {
        base_url: args.url.clone(),
        poll_interval_ms: args.interval,
        fetch_timeout_ms: args.timeout,
        visibility: args.visibility,
        log_file: args.log_file.clone(),
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    let runtime = tokio::runtime::Runtime::new()?;

    if args.once {
        logging::init_stderr(&settings.log);
        return runtime.block_on(print_once(&settings));
    }

    logging::init(&settings.log)
        .with_context(|| format!("cannot open log file {}", settings.log.file.display()))?;
    info!(url = %settings.source.base_url, "starting statusdeck");

    let services = Services::start(&settings, runtime.handle().clone())?;
    let result = run_tui(settings, services);

    // Let in-flight fetches wind down
    runtime.shutdown_timeout(Duration::from_millis(500));
    info!("statusdeck exited");
    result
}

/// Headless mode: one fetch, JSON on stdout.
async fn print_once(settings: &Settings) -> Result<()> {
    let client = HttpClient::builder()
        .base_url(settings.source.base_url.as_str())
        .timeout(settings.fetch_timeout())
        .build()?;
    let payload = client.fetch_stats().await?;

    let metrics = reconcile(&payload);
    let window = VisibilityWindow::new(Local::now())
        .with_buffer_minutes(settings.events.buffer_minutes);
    let events = normalize_events(&payload.events);
    let visible = select_visible(&events, &window, settings.events.visibility);

    let now = Local::now();
    let export = serde_json::json!({
        "source": client.description(),
        "metrics": {
            "cpu": metrics.cpu,
            "mem": metrics.mem,
            "net": metrics.net,
            "power": metrics.power,
        },
        "visibility": settings.events.visibility.label(),
        "events": visible.events().iter().map(|e| serde_json::json!({
            "title": e.display_title(),
            "start": e.start.map(|t| t.to_rfc3339()),
            "end": e.end.map(|t| t.to_rfc3339()),
            "slot": e.slot_label(now),
            "location": e.location,
            "organizer": e.organizer,
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(settings: Settings, services: Services) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(settings, Some(services));
    app.theme = ui::Theme::auto_detect();

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    // Short frames keep the gauge animation smooth
    const FRAME: Duration = Duration::from_millis(50);

    while app.running {
        app.reload_data();
        app.tick(Instant::now(), Local::now());

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(12),   // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Dashboard => ui::dashboard::render(frame, app, chunks[2]),
                View::Schedule => ui::schedule::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(FRAME)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }

    Ok(())
}
