// ============================================================================
// App : dashboard state
// ============================================================================
// Single source of truth for the UI. All widgets read from App; all control
// changes go through its methods, and the event loop re-renders every
// output from this state on each iteration.
// ============================================================================

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};

use crate::models::{ComparisonTable, MaWindow, MetricSnapshot, PriceSeries, TickerSet, BASKET};

/// The five fixed headline tickers shown as metric cards.
pub const HEADLINES: [(&str, &str); 5] = [
    ("Microsoft", "MSFT"),
    ("Amazon", "AMZN"),
    ("Netflix", "NFLX"),
    ("Google", "GOOG"),
    ("Apple", "AAPL"),
];

/// Default ticker input and date filter bounds.
pub const DEFAULT_TICKER: &str = "AAPL";
pub const DEFAULT_START_DATE: &str = "1980-01-01";

/// Main-panel output sections, in the page's top-to-bottom order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Overview,
    Price,
    Volume,
    Stats,
    Comparison,
    MovingAverage,
}

impl Section {
    pub fn all() -> [Section; 6] {
        [
            Section::Overview,
            Section::Price,
            Section::Volume,
            Section::Stats,
            Section::Comparison,
            Section::MovingAverage,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Price => "Price Chart",
            Section::Volume => "Volume",
            Section::Stats => "Summary Statistics",
            Section::Comparison => "MANGA Comparison",
            Section::MovingAverage => "Moving Average",
        }
    }

    pub fn next(&self) -> Section {
        match self {
            Section::Overview => Section::Price,
            Section::Price => Section::Volume,
            Section::Volume => Section::Stats,
            Section::Stats => Section::Comparison,
            Section::Comparison => Section::MovingAverage,
            Section::MovingAverage => Section::Overview,
        }
    }

    pub fn previous(&self) -> Section {
        match self {
            Section::Overview => Section::MovingAverage,
            Section::Price => Section::Overview,
            Section::Volume => Section::Price,
            Section::Stats => Section::Volume,
            Section::Comparison => Section::Stats,
            Section::MovingAverage => Section::Comparison,
        }
    }
}

/// Text inputs that can be edited through the modal input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Ticker,
    StartDate,
    EndDate,
}

impl InputField {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputField::Ticker => "Type ticker(s): ",
            InputField::StartDate => "Start date (YYYY-MM-DD): ",
            InputField::EndDate => "End date (YYYY-MM-DD): ",
        }
    }
}

/// Active screen: the dashboard, or the dashboard with the input line open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Input(InputField),
}

/// One headline metric card.
#[derive(Debug, Clone)]
pub struct Headline {
    pub label: &'static str,
    pub symbol: &'static str,
    pub snapshot: Option<MetricSnapshot>,
}

/// Dashboard state.
pub struct App {
    pub running: bool,
    pub confirm_quit: bool,
    pub screen: Screen,
    pub section: Section,

    // Controls
    pub tickers: TickerSet,
    pub candlestick: bool,
    pub volume_requested: bool,
    pub start_date_input: String,
    pub end_date_input: String,
    pub ma_window: MaWindow,
    /// Basket multi-select; all false means "show everything".
    pub selection: [bool; BASKET.len()],

    // Modal input line
    pub input_buffer: String,

    // Fetched data
    pub headlines: Vec<Headline>,
    pub fetched: BTreeMap<String, PriceSeries>,
    pub comparison: Option<ComparisonTable>,

    // Status
    pub is_loading: bool,
    pub loading_message: Option<String>,
    pub fetch_error: Option<String>,
    pub export_status: Option<String>,
}

impl App {
    pub fn new() -> Self {
        let headlines = HEADLINES
            .iter()
            .map(|&(label, symbol)| Headline {
                label,
                symbol,
                snapshot: None,
            })
            .collect();

        Self {
            running: true,
            confirm_quit: false,
            screen: Screen::Dashboard,
            section: Section::Overview,
            tickers: TickerSet::single(DEFAULT_TICKER),
            candlestick: false,
            volume_requested: false,
            start_date_input: DEFAULT_START_DATE.to_string(),
            end_date_input: today_string(),
            ma_window: MaWindow::default(),
            selection: [false; BASKET.len()],
            input_buffer: String::new(),
            headlines,
            fetched: BTreeMap::new(),
            comparison: None,
            is_loading: false,
            loading_message: None,
            fetch_error: None,
            export_status: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    // Two-step quit: first 'q' arms, second confirms.
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Sections
    // ========================================================================

    pub fn next_section(&mut self) {
        self.section = self.section.next();
    }

    pub fn previous_section(&mut self) {
        self.section = self.section.previous();
    }

    // ========================================================================
    // Controls
    // ========================================================================

    pub fn toggle_candlestick(&mut self) {
        self.candlestick = !self.candlestick;
    }

    /// The "picked one ticker" button in front of the volume chart.
    pub fn press_volume(&mut self) {
        self.volume_requested = true;
    }

    pub fn next_ma_window(&mut self) {
        self.ma_window = self.ma_window.next();
    }

    pub fn previous_ma_window(&mut self) {
        self.ma_window = self.ma_window.previous();
    }

    /// Toggles one basket column in the comparison multi-select.
    /// Display-only: never triggers a refetch.
    pub fn toggle_selection(&mut self, index: usize) {
        if let Some(slot) = self.selection.get_mut(index) {
            *slot = !*slot;
        }
    }

    // ========================================================================
    // Modal input line
    // ========================================================================

    pub fn start_input(&mut self, field: InputField) {
        self.input_buffer.clear();
        // Editing a date starts from its current value; tickers start fresh.
        match field {
            InputField::StartDate => self.input_buffer = self.start_date_input.clone(),
            InputField::EndDate => self.input_buffer = self.end_date_input.clone(),
            InputField::Ticker => {}
        }
        self.screen = Screen::Input(field);
    }

    pub fn cancel_input(&mut self) {
        self.input_buffer.clear();
        self.screen = Screen::Dashboard;
    }

    /// Returns the edited field and its submitted value.
    pub fn submit_input(&mut self) -> Option<(InputField, String)> {
        let Screen::Input(field) = self.screen else {
            return None;
        };
        let value = self.input_buffer.trim().to_string();
        self.input_buffer.clear();
        self.screen = Screen::Dashboard;
        Some((field, value))
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn is_in_input_mode(&self) -> bool {
        matches!(self.screen, Screen::Input(_))
    }

    // ========================================================================
    // Data updates (applied from worker results)
    // ========================================================================

    /// Replaces the fetched ticker tables after a (re)fetch. Switching the
    /// ticker set resets the one-shot volume button.
    pub fn apply_fetched(&mut self, tickers: TickerSet, fetched: BTreeMap<String, PriceSeries>) {
        if tickers != self.tickers {
            self.volume_requested = false;
        }
        self.tickers = tickers;
        self.fetched = fetched;
        self.fetch_error = None;
        self.export_status = None;
    }

    pub fn apply_headlines(&mut self, snapshots: Vec<Option<MetricSnapshot>>) {
        for (headline, snapshot) in self.headlines.iter_mut().zip(snapshots) {
            headline.snapshot = snapshot;
        }
    }

    pub fn apply_comparison(&mut self, table: ComparisonTable) {
        self.comparison = Some(table);
    }

    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn set_fetch_error(&mut self, message: String) {
        self.fetch_error = Some(message);
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    /// Series of the first ticker in the set, when fetched.
    pub fn primary_series(&self) -> Option<&PriceSeries> {
        self.fetched.get(self.tickers.first())
    }

    /// Fetched series in ticker-set order, for export.
    pub fn series_in_order(&self) -> Vec<&PriceSeries> {
        self.tickers
            .iter()
            .filter_map(|symbol| self.fetched.get(symbol))
            .collect()
    }

    /// The volume chart renders when the button was pressed or exactly one
    /// ticker is selected; the builder still enforces the one-ticker rule.
    pub fn volume_gate_open(&self) -> bool {
        self.volume_requested || self.tickers.is_single()
    }

    /// True while the date inputs still hold their defaults, in which case
    /// the statistics cover the full history.
    pub fn is_default_range(&self) -> bool {
        self.start_date_input == DEFAULT_START_DATE && self.end_date_input == today_string()
    }

    /// Parses the date filter. `Err` carries the inline message to render.
    pub fn parsed_range(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let start = NaiveDate::parse_from_str(&self.start_date_input, "%Y-%m-%d")
            .map_err(|_| format!("Invalid start date: {}", self.start_date_input))?;
        let end = NaiveDate::parse_from_str(&self.end_date_input, "%Y-%m-%d")
            .map_err(|_| format!("Invalid end date: {}", self.end_date_input))?;
        Ok((start, end))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Today in the date-input format.
pub fn today_string() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;

    fn sample_series(symbol: &str) -> PriceSeries {
        let bars = (1..=3)
            .map(|d| {
                Bar::new(
                    NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                    100.0,
                    110.0,
                    95.0,
                    105.0,
                    1000,
                )
            })
            .collect();
        PriceSeries::from_bars(symbol.to_string(), bars)
    }

    #[test]
    fn test_new_defaults() {
        let app = App::new();
        assert!(app.is_running());
        assert_eq!(app.tickers.symbols(), [DEFAULT_TICKER]);
        assert_eq!(app.start_date_input, DEFAULT_START_DATE);
        assert_eq!(app.ma_window.days(), 20);
        assert!(!app.candlestick);
        assert!(app.is_default_range());
        assert_eq!(app.headlines.len(), 5);
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = App::new();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        assert!(app.is_running());

        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_section_cycle_covers_all() {
        let mut app = App::new();
        let mut seen = vec![app.section];
        for _ in 0..5 {
            app.next_section();
            seen.push(app.section);
        }
        assert_eq!(seen.len(), Section::all().len());
        app.next_section();
        assert_eq!(app.section, Section::Overview);

        app.previous_section();
        assert_eq!(app.section, Section::MovingAverage);
    }

    #[test]
    fn test_input_mode_round_trip() {
        let mut app = App::new();
        app.start_input(InputField::Ticker);
        assert!(app.is_in_input_mode());

        app.append_char('a');
        app.append_char('b');
        app.backspace();
        app.append_char('c');

        let (field, value) = app.submit_input().unwrap();
        assert_eq!(field, InputField::Ticker);
        assert_eq!(value, "ac");
        assert!(!app.is_in_input_mode());
    }

    #[test]
    fn test_date_input_starts_from_current_value() {
        let mut app = App::new();
        app.start_input(InputField::StartDate);
        assert_eq!(app.input_buffer, DEFAULT_START_DATE);
        app.cancel_input();
        assert!(!app.is_in_input_mode());
    }

    #[test]
    fn test_parsed_range_rejects_garbage() {
        let mut app = App::new();
        app.start_date_input = "not-a-date".to_string();
        assert!(app.parsed_range().is_err());

        app.start_date_input = "2020-05-01".to_string();
        app.end_date_input = "2021-05-01".to_string();
        let (start, end) = app.parsed_range().unwrap();
        assert!(start < end);
        assert!(!app.is_default_range());
    }

    #[test]
    fn test_volume_gate() {
        let mut app = App::new();
        // Single default ticker: gate open without the button
        assert!(app.volume_gate_open());

        let tickers = TickerSet::parse("AAPL MSFT").unwrap();
        let mut fetched = BTreeMap::new();
        fetched.insert("AAPL".to_string(), sample_series("AAPL"));
        fetched.insert("MSFT".to_string(), sample_series("MSFT"));
        app.apply_fetched(tickers, fetched);
        assert!(!app.volume_gate_open());

        app.press_volume();
        assert!(app.volume_gate_open());
    }

    #[test]
    fn test_apply_fetched_resets_volume_button_on_new_tickers() {
        let mut app = App::new();
        app.press_volume();

        let tickers = TickerSet::parse("TSLA").unwrap();
        let mut fetched = BTreeMap::new();
        fetched.insert("TSLA".to_string(), sample_series("TSLA"));
        app.apply_fetched(tickers, fetched);

        assert!(!app.volume_requested);
        // Still gated open because the new set is a single ticker
        assert!(app.volume_gate_open());
    }

    #[test]
    fn test_selection_toggle() {
        let mut app = App::new();
        assert!(app.selection.iter().all(|&s| !s));
        app.toggle_selection(2);
        assert!(app.selection[2]);
        app.toggle_selection(2);
        assert!(!app.selection[2]);
        // Out of range is a no-op
        app.toggle_selection(99);
    }

    #[test]
    fn test_series_in_order_follows_ticker_set() {
        let mut app = App::new();
        let tickers = TickerSet::parse("MSFT AAPL").unwrap();
        let mut fetched = BTreeMap::new();
        fetched.insert("AAPL".to_string(), sample_series("AAPL"));
        fetched.insert("MSFT".to_string(), sample_series("MSFT"));
        app.apply_fetched(tickers, fetched);

        let ordered: Vec<&str> = app
            .series_in_order()
            .iter()
            .map(|s| s.symbol.as_str())
            .collect();
        assert_eq!(ordered, ["MSFT", "AAPL"]);
    }
}
