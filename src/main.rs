// ============================================================================
// marketdash : terminal stock dashboard
// ============================================================================
// Synchronous TUI event loop with a background worker thread. The worker
// owns a tokio runtime, the HTTP client and the fetch cache; the UI sends
// it commands over a channel and applies its results between frames.
// ============================================================================

use std::collections::BTreeMap;
use std::io;
use std::sync::{mpsc, Arc, Mutex};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use marketdash::api::cache::{fetch_cached, FetchCache};
use marketdash::api::yahoo::build_client;
use marketdash::app::{App, InputField, HEADLINES};
use marketdash::export;
use marketdash::models::{
    ComparisonTable, MetricSnapshot, PriceSeries, TickerSet, BASKET,
};
use marketdash::ui::{dashboard, events, EventHandler};

// ============================================================================
// Worker protocol
// ============================================================================

/// Commands sent to the worker thread.
#[derive(Debug, Clone)]
enum AppCommand {
    /// Initial load: headline cards, comparison basket, default ticker.
    Bootstrap,
    /// (Re)fetch the user-selected ticker set.
    Refresh { tickers: TickerSet },
}

/// Results sent back by the worker thread.
#[derive(Debug)]
enum AppResult {
    Headlines(Vec<Option<MetricSnapshot>>),
    Basket(ComparisonTable),
    Fetched {
        tickers: TickerSet,
        fetched: BTreeMap<String, PriceSeries>,
    },
    Failed {
        message: String,
    },
}

// ============================================================================
// Logging
// ============================================================================

/// File logging with daily rotation. println! is useless once the alternate
/// screen is up, so everything goes to ./logs/marketdash.log.
///
/// `RUST_LOG` overrides the default filter, e.g.
/// `RUST_LOG=marketdash=trace cargo run`.
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::PathBuf::from("./logs");
    std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "marketdash.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketdash=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialized");
    Ok(())
}

// ============================================================================
// Entry point
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("Warning: failed to initialize logging: {}", e);
    });

    info!("marketdash starting up");

    let mut terminal = setup_terminal()?;

    let app = Arc::new(Mutex::new(App::new()));

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx, app.clone());

    // Kick off the initial load before the first frame
    let _ = command_tx.send(AppCommand::Bootstrap);

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app.clone(), &events, command_tx, result_rx);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }
    result
}

// ============================================================================
// Background worker
// ============================================================================

/// Worker thread: owns the tokio runtime, the HTTP client and the fetch
/// cache, so cached series never cross a lock. `block_on` blocks this
/// thread only; the UI keeps drawing.
fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    app: Arc<Mutex<App>>,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create tokio runtime");
                let _ = result_tx.send(AppResult::Failed {
                    message: format!("Worker startup failed: {}", e),
                });
                return;
            }
        };
        let client = match build_client() {
            Ok(client) => client,
            Err(e) => {
                error!(error = ?e, "Failed to build HTTP client");
                let _ = result_tx.send(AppResult::Failed {
                    message: format!("Worker startup failed: {}", e),
                });
                return;
            }
        };
        let mut cache = FetchCache::new();

        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");
            match command {
                AppCommand::Bootstrap => {
                    set_loading(&app, Some("Loading dashboard data...".to_string()));

                    let headlines = runtime.block_on(fetch_headlines(&mut cache, &client));
                    let _ = result_tx.send(AppResult::Headlines(headlines));

                    match runtime.block_on(fetch_basket(&mut cache, &client)) {
                        Ok(table) => {
                            let _ = result_tx.send(AppResult::Basket(table));
                        }
                        Err(e) => {
                            warn!(error = ?e, "Basket fetch failed");
                        }
                    }

                    let tickers = TickerSet::single(marketdash::app::DEFAULT_TICKER);
                    send_fetch_result(&runtime, &mut cache, &client, &result_tx, tickers);

                    clear_loading(&app);
                }

                AppCommand::Refresh { tickers } => {
                    set_loading(&app, Some(format!("Fetching {}...", tickers.label())));
                    send_fetch_result(&runtime, &mut cache, &client, &result_tx, tickers);
                    clear_loading(&app);
                }
            }
        }
        info!("Worker thread exiting (channel closed)");
    });
}

fn set_loading(app: &Arc<Mutex<App>>, message: Option<String>) {
    if let Ok(mut app_lock) = app.lock() {
        app_lock.start_loading(message);
    }
}

fn clear_loading(app: &Arc<Mutex<App>>) {
    if let Ok(mut app_lock) = app.lock() {
        app_lock.stop_loading();
    }
}

/// Fetches a ticker set and reports either the full map or the first error.
/// A failed symbol is dropped from the cache so a retry refetches it.
fn send_fetch_result(
    runtime: &tokio::runtime::Runtime,
    cache: &mut FetchCache,
    client: &reqwest::Client,
    result_tx: &mpsc::Sender<AppResult>,
    tickers: TickerSet,
) {
    let result = runtime.block_on(fetch_ticker_set(cache, client, &tickers));
    match result {
        Ok(fetched) => {
            info!(tickers = %tickers.label(), count = fetched.len(), "Ticker set fetched");
            let _ = result_tx.send(AppResult::Fetched { tickers, fetched });
        }
        Err((symbol, e)) => {
            error!(ticker = %symbol, error = ?e, "Ticker fetch failed");
            cache.invalidate(&symbol);
            let _ = result_tx.send(AppResult::Failed {
                message: format!("{}: {}", symbol, e),
            });
        }
    }
}

async fn fetch_ticker_set(
    cache: &mut FetchCache,
    client: &reqwest::Client,
    tickers: &TickerSet,
) -> std::result::Result<BTreeMap<String, PriceSeries>, (String, anyhow::Error)> {
    let mut fetched = BTreeMap::new();
    for symbol in tickers.iter() {
        let series = fetch_cached(cache, client, symbol)
            .await
            .map_err(|e| (symbol.clone(), e))?;
        fetched.insert(symbol.clone(), series);
    }
    Ok(fetched)
}

/// One snapshot per headline card. A failed headline degrades to `None`
/// instead of failing the whole bootstrap.
async fn fetch_headlines(
    cache: &mut FetchCache,
    client: &reqwest::Client,
) -> Vec<Option<MetricSnapshot>> {
    let mut snapshots = Vec::with_capacity(HEADLINES.len());
    for &(_, symbol) in HEADLINES.iter() {
        let snapshot = match fetch_cached(cache, client, symbol).await {
            Ok(series) => MetricSnapshot::from_series(&series),
            Err(e) => {
                warn!(ticker = %symbol, error = ?e, "Headline fetch failed");
                None
            }
        };
        snapshots.push(snapshot);
    }
    snapshots
}

async fn fetch_basket(
    cache: &mut FetchCache,
    client: &reqwest::Client,
) -> Result<ComparisonTable> {
    let mut series: Vec<(String, PriceSeries)> = Vec::with_capacity(BASKET.len());
    for &(symbol, label) in BASKET.iter() {
        let fetched = fetch_cached(cache, client, symbol).await?;
        series.push((label.to_string(), fetched));
    }
    let labeled: Vec<(String, &PriceSeries)> = series
        .iter()
        .map(|(label, s)| (label.clone(), s))
        .collect();
    Ok(ComparisonTable::from_series(&labeled))
}

// ============================================================================
// Event loop
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    loop {
        {
            let app_lock = app.lock().unwrap();
            if !app_lock.is_running() {
                break;
            }
        }

        // Apply worker results without blocking
        match result_rx.try_recv() {
            Ok(result) => {
                let mut app_lock = app.lock().unwrap();
                match result {
                    AppResult::Headlines(snapshots) => {
                        app_lock.apply_headlines(snapshots);
                    }
                    AppResult::Basket(table) => {
                        app_lock.apply_comparison(table);
                    }
                    AppResult::Fetched { tickers, fetched } => {
                        app_lock.apply_fetched(tickers, fetched);
                    }
                    AppResult::Failed { message } => {
                        app_lock.set_fetch_error(message);
                    }
                }
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("Worker thread disconnected");
            }
        }

        {
            let app_clone = app.clone();
            terminal.draw(|frame| {
                let app_lock = app_clone.lock().unwrap();
                dashboard::render(frame, &app_lock);
            })?;
        }

        if let Ok(event) = events.next() {
            let mut app_lock = app.lock().unwrap();
            handle_event(&mut app_lock, event, &command_tx);
        }
    }

    Ok(())
}

// ============================================================================
// Event handling
// ============================================================================

fn handle_event(app: &mut App, event: events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use marketdash::ui::events::{
        get_char_from_event, is_backspace_event, is_candlestick_event, is_end_date_event,
        is_enter_event, is_escape_event, is_export_event, is_input_char_event, is_next_ma_event,
        is_next_section_event, is_previous_ma_event, is_previous_section_event, is_quit_event,
        is_retry_event, is_start_date_event, is_ticker_input_event, is_volume_event,
        selection_index, Event,
    };

    match event {
        // ========================================
        // Modal input line
        // ========================================
        Event::Key(_) if is_escape_event(&event) && app.is_in_input_mode() => {
            debug!("Input cancelled");
            app.cancel_input();
        }

        Event::Key(_) if is_enter_event(&event) && app.is_in_input_mode() => {
            if let Some((field, value)) = app.submit_input() {
                apply_input(app, field, value, command_tx);
            }
        }

        Event::Key(_) if is_backspace_event(&event) && app.is_in_input_mode() => {
            app.backspace();
        }

        Event::Key(_) if is_input_char_event(&event) && app.is_in_input_mode() => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }

        Event::Key(_) if app.is_in_input_mode() => {}

        // ========================================
        // Dashboard controls
        // ========================================
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        Event::Key(_) if is_next_section_event(&event) => {
            app.cancel_quit();
            app.next_section();
        }
        Event::Key(_) if is_previous_section_event(&event) => {
            app.cancel_quit();
            app.previous_section();
        }

        Event::Key(_) if is_ticker_input_event(&event) => {
            app.cancel_quit();
            app.start_input(InputField::Ticker);
        }
        Event::Key(_) if is_start_date_event(&event) => {
            app.cancel_quit();
            app.start_input(InputField::StartDate);
        }
        Event::Key(_) if is_end_date_event(&event) => {
            app.cancel_quit();
            app.start_input(InputField::EndDate);
        }

        Event::Key(_) if is_candlestick_event(&event) => {
            app.cancel_quit();
            app.toggle_candlestick();
        }
        Event::Key(_) if is_volume_event(&event) => {
            app.cancel_quit();
            app.press_volume();
        }

        Event::Key(_) if is_next_ma_event(&event) => {
            app.cancel_quit();
            app.next_ma_window();
        }
        Event::Key(_) if is_previous_ma_event(&event) => {
            app.cancel_quit();
            app.previous_ma_window();
        }

        Event::Key(_) if is_export_event(&event) => {
            app.cancel_quit();
            export_current(app);
        }

        Event::Key(_) if is_retry_event(&event) => {
            app.cancel_quit();
            if app.fetch_error.take().is_some() {
                info!(tickers = %app.tickers.label(), "Retrying fetch");
                let _ = command_tx.send(AppCommand::Refresh {
                    tickers: app.tickers.clone(),
                });
            }
        }

        Event::Key(_) => {
            if let Some(index) = selection_index(&event) {
                app.cancel_quit();
                app.toggle_selection(index);
            } else {
                // Any other key cancels an armed quit
                app.cancel_quit();
            }
        }

        Event::Tick => {}
    }
}

/// Applies a submitted input value: ticker edits trigger a refetch, date
/// edits are pure recomputes over already-fetched data.
fn apply_input(
    app: &mut App,
    field: InputField,
    value: String,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    match field {
        InputField::Ticker => match TickerSet::parse(&value) {
            Some(tickers) => {
                info!(tickers = %tickers.label(), "Ticker input submitted");
                let _ = command_tx.send(AppCommand::Refresh { tickers });
            }
            None => {
                debug!("Empty ticker input, ignoring");
            }
        },
        InputField::StartDate => {
            if !value.is_empty() {
                app.start_date_input = value;
            }
        }
        InputField::EndDate => {
            if !value.is_empty() {
                app.end_date_input = value;
            }
        }
    }
}

fn export_current(app: &mut App) {
    let series = app.series_in_order();
    if series.is_empty() {
        app.export_status = Some("Nothing to export yet".to_string());
        return;
    }
    match export::write_export(&series, std::path::Path::new(".")) {
        Ok(path) => {
            app.export_status = Some(format!("Wrote {}", path.display()));
        }
        Err(e) => {
            error!(error = ?e, "Export failed");
            app.export_status = Some(format!("Export failed: {}", e));
        }
    }
}

// ============================================================================
// Terminal setup / restore
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Always called before exit, error paths included: a TUI that leaves raw
/// mode on breaks the user's shell.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
