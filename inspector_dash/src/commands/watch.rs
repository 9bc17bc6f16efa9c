//! Live dashboard: snapshot plus live stream, in the TUI or as plain lines

use crate::commands::output;
use crate::config::Settings;
use crate::dashboard::{Dashboard, DashboardMsg, SnapshotStatus};
use crate::live::{self, Backoff, StreamStatus};
use crate::platform::{FullscreenPlatform, PlatformEvent, TerminalFullscreen};
use crate::presentation::PlatformIntent;
use crate::snapshot::{self, SnapshotClient};
use crate::tui::TuiApp;
use anyhow::Result;
use console::style;
use crossterm::{
    cursor,
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Options for the watch command
pub struct WatchOptions {
    pub settings: Settings,
    pub tui: bool,
}

pub async fn run(opts: WatchOptions) -> Result<()> {
    if opts.tui {
        run_with_tui(opts.settings).await
    } else {
        run_simple(opts.settings).await
    }
}

/// Background tasks feeding the dashboard, released together
struct Subscriptions {
    tasks: Vec<JoinHandle<()>>,
}

impl Subscriptions {
    /// Start the snapshot fetch and the live subscription
    fn start(settings: &Settings, tx: mpsc::Sender<DashboardMsg>) -> Result<Self> {
        let snapshot = SnapshotClient::new(&settings.backend_url, settings.snapshot_timeout)?;
        tracing::info!("Fetching snapshot from {}", snapshot.url());

        let backoff = Backoff::new(INITIAL_RECONNECT_DELAY, settings.reconnect_max);
        let stream = live::spawn_subscriber(settings.socket_url(), backoff, tx.clone());
        let loader = snapshot::spawn_loader(snapshot, tx);

        Ok(Self {
            tasks: vec![stream, loader],
        })
    }

    fn release_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Raw mode plus alternate screen, undone on `restore` or on drop
struct TerminalSession<W: Write> {
    out: W,
    active: bool,
}

impl TerminalSession<io::Stdout> {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut session = Self {
            out: io::stdout(),
            active: true,
        };
        execute!(session.out, EnterAlternateScreen)?;
        Ok(session)
    }
}

impl<W: Write> TerminalSession<W> {
    fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.out, LeaveAlternateScreen, cursor::Show)?;
        Ok(())
    }
}

impl<W: Write> Drop for TerminalSession<W> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!("Failed to restore terminal: {:#}", e);
        }
    }
}

/// Print requests as they arrive
async fn run_simple(settings: Settings) -> Result<()> {
    println!(
        "{} {}",
        style(" request-inspector ").on_cyan().black(),
        style(&settings.backend_url).cyan()
    );

    let (tx, mut rx) = mpsc::channel::<DashboardMsg>(256);
    let mut subscriptions = Subscriptions::start(&settings, tx)?;
    let mut dashboard = Dashboard::new(settings.feed_capacity);

    println!(
        "{}  {}",
        style("◆").green(),
        style("Waiting for requests... (Ctrl+C to stop)").dim()
    );
    println!();

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                print_message(&msg, &dashboard);
                dashboard.update(msg);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    dashboard.teardown();
    subscriptions.release_all();
    Ok(())
}

/// Log line for one message, printed before it reaches the dashboard
fn print_message(msg: &DashboardMsg, dashboard: &Dashboard) {
    match msg {
        DashboardMsg::SnapshotLoaded(records) => {
            println!(
                "{} {}",
                style("Snapshot:").dim(),
                style(format!("{} stored requests", records.len())).white()
            );
            // Oldest first, so the log reads top to bottom
            for record in records.iter().rev() {
                output::print_request(record, false);
            }
            println!();
        }
        DashboardMsg::SnapshotFailed(error) => {
            println!("{} {}", style("Snapshot unavailable:").red(), error);
        }
        DashboardMsg::LiveRequest(record) => output::print_request(record, true),
        DashboardMsg::StreamStatus(status) if *status != dashboard.stream_status() => {
            let label = match status {
                StreamStatus::Online => style(status.as_str()).green().bold(),
                StreamStatus::Offline => style(status.as_str()).red(),
                _ => style(status.as_str()).yellow(),
            };
            println!("{} {}", style("Live stream:").dim(), label);
        }
        _ => {}
    }
}

/// Run with full TUI
async fn run_with_tui(settings: Settings) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<DashboardMsg>(256);
    let mut subscriptions = Subscriptions::start(&settings, tx)?;

    let mut app = TuiApp::new(
        Dashboard::new(settings.feed_capacity),
        settings.backend_url.clone(),
    );

    // Setup terminal; any early return below drops the session and restores it
    let mut session = TerminalSession::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let area = terminal.size()?;
    let (mut platform, mut platform_rx) = TerminalFullscreen::new(area.width, area.height);

    let result = run_tui_loop(&mut terminal, &mut app, &mut platform, &mut rx, &mut platform_rx).await;

    // Late snapshot or stream deliveries are dropped from here on
    app.dashboard.teardown();
    subscriptions.release_all();

    // Restore terminal
    session.restore()?;

    if let SnapshotStatus::Failed(error) = app.dashboard.snapshot_status() {
        tracing::warn!("Snapshot was unavailable: {}", error);
    }

    result
}

async fn run_tui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut TuiApp,
    platform: &mut TerminalFullscreen,
    rx: &mut mpsc::Receiver<DashboardMsg>,
    platform_rx: &mut mpsc::UnboundedReceiver<PlatformEvent>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(100));
    let mut pending: Vec<PlatformIntent> = Vec::new();

    loop {
        // Draw UI
        let frame = terminal.draw(|f| crate::tui::draw(f, app))?;
        platform.set_area(frame.area.width, frame.area.height);

        // The focused card is on screen now, so enter requests can go out
        for intent in pending.drain(..) {
            carry_out(intent, app, platform);
        }

        if app.should_quit {
            return Ok(());
        }

        tokio::select! {
            // Handle keyboard events (non-blocking)
            _ = tick_interval.tick() => {
                while event::poll(Duration::from_millis(0))? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if platform.intercept_key(&key) {
                                continue;
                            }
                            if let Some(msg) = app.handle_key(key) {
                                pending.extend(app.apply(msg));
                            }
                        }
                        Event::Resize(width, height) => platform.set_area(width, height),
                        _ => {}
                    }
                }

                if let Some(msg) = app.reconcile_focus() {
                    pending.extend(app.apply(msg));
                }
            }

            // Snapshot, live records and stream status
            Some(msg) = rx.recv() => {
                pending.extend(app.apply(msg));
            }

            // Fullscreen notifications
            Some(event) = platform_rx.recv() => {
                pending.extend(app.apply(DashboardMsg::Platform(event)));
            }
        }
    }
}

fn carry_out(intent: PlatformIntent, app: &TuiApp, platform: &mut impl FullscreenPlatform) {
    match intent {
        PlatformIntent::EnterFullscreen(surface) => {
            if app.dashboard.wants_surface(surface) {
                platform.request_fullscreen(surface);
            } else {
                tracing::debug!("Focus moved on, skipping fullscreen for {}", surface.as_u64());
            }
        }
        PlatformIntent::ExitFullscreen => {
            if platform.fullscreen_element().is_some() {
                platform.exit_fullscreen();
            } else {
                tracing::debug!("Platform already left fullscreen, skipping exit");
            }
        }
    }
}
