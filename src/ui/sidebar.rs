// ============================================================================
// Sidebar : controls and help
// ============================================================================
// Left-hand panel mirroring the input widgets: ticker entry with its help
// text, the date filters, the moving-average window selector and the basket
// multi-select. Everything here is read from App; edits go through the
// modal input line in the footer.
// ============================================================================

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::{MaWindow, BASKET};

const TICKER_HELP: [&str; 5] = [
    "(AAPL) Apple",
    "(MSFT) Microsoft",
    "(GOOG) Google",
    "(NFLX) Netflix",
    "(BTC-USD) Bitcoin",
];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Controls ");

    let label = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let value = Style::default().fg(Color::White);
    let dim = Style::default().fg(Color::Gray).add_modifier(Modifier::DIM);
    let key = Style::default().fg(Color::Yellow);

    let mut lines: Vec<Line> = Vec::new();

    // Ticker entry
    lines.push(Line::from(vec![
        Span::styled("Ticker [t]: ", label),
        Span::styled(app.tickers.label(), value),
    ]));
    lines.push(Line::from(Span::styled(
        "Popular symbols:",
        dim,
    )));
    for help in TICKER_HELP {
        lines.push(Line::from(Span::styled(format!("  {}", help), dim)));
    }
    lines.push(Line::from(Span::styled(
        "Several tickers: separate with spaces",
        dim,
    )));
    lines.push(Line::from(""));

    // Date filter
    lines.push(Line::from(vec![
        Span::styled("Start [b]: ", label),
        Span::styled(app.start_date_input.clone(), value),
    ]));
    lines.push(Line::from(vec![
        Span::styled("End   [e]: ", label),
        Span::styled(app.end_date_input.clone(), value),
    ]));
    lines.push(Line::from(""));

    // Price view toggles
    lines.push(Line::from(vec![
        Span::styled("Candlestick [c]: ", label),
        Span::styled(if app.candlestick { "on" } else { "off" }, value),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Volume [v]: ", label),
        Span::styled(
            if app.volume_gate_open() {
                "shown"
            } else {
                "pick one ticker"
            },
            value,
        ),
    ]));
    lines.push(Line::from(""));

    // Moving-average window selector
    lines.push(Line::from(Span::styled("MA window  [ / ]", label)));
    let mut window_spans: Vec<Span> = vec![Span::raw("  ")];
    for window in MaWindow::all() {
        let style = if window == app.ma_window {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            dim
        };
        window_spans.push(Span::styled(format!(" {} ", window.days()), style));
    }
    lines.push(Line::from(window_spans));
    lines.push(Line::from(""));

    // Basket multi-select
    lines.push(Line::from(Span::styled("Comparison [1-6]", label)));
    for (idx, &(symbol, column)) in BASKET.iter().enumerate() {
        let selected = app.selection[idx];
        let mark = if selected { "[x]" } else { "[ ]" };
        let style = if selected { value } else { dim };
        lines.push(Line::from(Span::styled(
            format!("  {} {} {} ({})", idx + 1, mark, symbol, column),
            style,
        )));
    }
    if app.selection.iter().all(|&s| !s) {
        lines.push(Line::from(Span::styled("  none selected: all shown", dim)));
    }
    lines.push(Line::from(""));

    // Export
    lines.push(Line::from(vec![
        Span::styled("[x] ", key),
        Span::styled("Export ticker_data.csv", value),
    ]));
    if let Some(status) = &app.export_status {
        lines.push(Line::from(Span::styled(
            format!("  {}", status),
            Style::default().fg(Color::Green),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
