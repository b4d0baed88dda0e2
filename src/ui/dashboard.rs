// ============================================================================
// Dashboard rendering
// ============================================================================
// Full-frame layout: title bar, the five headline metric cards, the sidebar
// next to the active section, and the footer (shortcuts, input line, status).
// Every widget is rebuilt from App on each draw.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, Screen, Section};
use crate::charts;
use crate::models::{PriceSeries, SummaryStats};
use crate::ui::{chart, sidebar};

const SIDEBAR_WIDTH: u16 = 36;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.size());

    render_header(frame, app, chunks[0]);
    render_headlines(frame, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(chunks[2]);
    sidebar::render(frame, app, body[0]);
    render_section(frame, app, body[1]);

    render_footer(frame, app, chunks[3]);
}

// ============================================================================
// Header and metric cards
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans: Vec<Span> = vec![Span::styled(
        " Stock Dashboard ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    for section in Section::all() {
        let style = if section == app.section {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", section.title()), style));
        spans.push(Span::raw(" "));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    frame.render_widget(header, area);
}

fn render_headlines(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20); 5])
        .split(area);

    for (headline, card) in app.headlines.iter().zip(cards.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", headline.label));

        let body = match &headline.snapshot {
            Some(snapshot) => {
                let delta_color = if snapshot.percent_change >= 0.0 {
                    Color::Green
                } else {
                    Color::Red
                };
                Line::from(vec![
                    Span::styled(
                        format!("{:.2} ", snapshot.latest_close),
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{:+.2}%", snapshot.percent_change),
                        Style::default().fg(delta_color),
                    ),
                ])
            }
            None => Line::from(Span::styled(
                "n/a",
                Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            )),
        };

        frame.render_widget(Paragraph::new(body).block(block), *card);
    }
}

// ============================================================================
// Main panel sections
// ============================================================================

fn render_section(frame: &mut Frame, app: &App, area: Rect) {
    match app.section {
        Section::Overview => render_overview(frame, app, area),
        Section::Price => render_price(frame, app, area),
        Section::Volume => render_volume(frame, app, area),
        Section::Stats => render_stats(frame, app, area),
        Section::Comparison => render_comparison(frame, app, area),
        Section::MovingAverage => render_moving_average(frame, app, area),
    }
}

fn render_overview(frame: &mut Frame, app: &App, area: Rect) {
    let series = app.series_in_order();
    if series.is_empty() {
        chart::render_no_data(frame, area, "No ticker data fetched yet");
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} : last rows ", app.tickers.label()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // One table per ticker plus the date-span summary
    let mut constraints: Vec<Constraint> = series.iter().map(|_| Constraint::Length(8)).collect();
    constraints.push(Constraint::Min(3));
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (s, slot) in series.iter().zip(slots.iter()) {
        render_tail_table(frame, s, *slot);
    }
    render_span_summary(frame, &series, *slots.last().unwrap_or(&inner));
}

fn render_tail_table(frame: &mut Frame, series: &PriceSeries, area: Rect) {
    let header = Row::new(
        ["date", "open", "high", "low", "close", "volume"]
            .map(|label| Cell::from(label).style(Style::default().fg(Color::Cyan))),
    );

    let rows: Vec<Row> = series
        .tail(5)
        .iter()
        .map(|bar| {
            Row::new(vec![
                Cell::from(bar.date.to_string()),
                Cell::from(format!("{:.2}", bar.open)),
                Cell::from(format!("{:.2}", bar.high)),
                Cell::from(format!("{:.2}", bar.low)),
                Cell::from(format!("{:.2}", bar.close)),
                Cell::from(bar.volume.to_string()),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(12); 6])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", series.symbol)),
        );
    frame.render_widget(table, area);
}

fn render_span_summary(frame: &mut Frame, series: &[&PriceSeries], area: Rect) {
    let Some(primary) = series.first().filter(|s| !s.is_empty()) else {
        return;
    };
    let (Some(first), Some(last), Some(span)) =
        (primary.first_date(), primary.last_date(), primary.span_days())
    else {
        return;
    };

    let line = Line::from(vec![
        Span::styled("Start: ", Style::default().fg(Color::Cyan)),
        Span::raw(first.to_string()),
        Span::styled("   End: ", Style::default().fg(Color::Cyan)),
        Span::raw(last.to_string()),
        Span::styled("   Difference: ", Style::default().fg(Color::Cyan)),
        Span::raw(format!("{} days", span)),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" Date span ")),
        area,
    );
}

fn render_price(frame: &mut Frame, app: &App, area: Rect) {
    let result = if app.candlestick {
        charts::candlestick(&app.tickers, &app.fetched)
    } else {
        charts::price_line(&app.tickers, &app.fetched)
    };
    match result {
        Ok(spec) => chart::render_chart_spec(frame, &spec, area),
        Err(err) => chart::render_rejection(frame, area, &err.to_string()),
    }
}

fn render_volume(frame: &mut Frame, app: &App, area: Rect) {
    if !app.volume_gate_open() {
        chart::render_rejection(
            frame,
            area,
            "Cannot show volume of multiple tickers. Please select one.",
        );
        return;
    }
    match charts::volume(&app.tickers, &app.fetched) {
        Ok(spec) => chart::render_chart_spec(frame, &spec, area),
        Err(err) => chart::render_rejection(frame, area, &err.to_string()),
    }
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let Some(series) = app.primary_series() else {
        chart::render_no_data(frame, area, "No ticker data fetched yet");
        return;
    };

    let stats = if app.is_default_range() {
        series.summary_stats()
    } else {
        match app.parsed_range() {
            Ok((start, end)) => series.summary_stats_range(start, end),
            Err(message) => {
                chart::render_rejection(frame, area, &message);
                return;
            }
        }
    };

    if stats.is_empty() {
        chart::render_no_data(frame, area, "No rows in the selected date range");
        return;
    }
    render_stats_table(frame, &series.symbol, &stats, area);
}

fn render_stats_table(frame: &mut Frame, symbol: &str, stats: &SummaryStats, area: Rect) {
    let header = Row::new(
        ["column", "count", "mean", "std", "min", "max"]
            .map(|label| Cell::from(label).style(Style::default().fg(Color::Cyan))),
    );

    let rows: Vec<Row> = stats
        .rows()
        .iter()
        .map(|(label, column)| {
            Row::new(vec![
                Cell::from(*label),
                Cell::from(column.count.to_string()),
                Cell::from(format!("{:.2}", column.mean)),
                Cell::from(format!("{:.2}", column.std)),
                Cell::from(format!("{:.2}", column.min)),
                Cell::from(format!("{:.2}", column.max)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(14); 6])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} summary statistics ", symbol)),
        );
    frame.render_widget(table, area);
}

fn render_comparison(frame: &mut Frame, app: &App, area: Rect) {
    let Some(table) = &app.comparison else {
        chart::render_no_data(frame, area, "Comparison data not fetched yet");
        return;
    };
    let spec = charts::comparison_line(table, &app.selection);
    if spec.series.is_empty() {
        chart::render_no_data(frame, area, "Nothing to plot");
        return;
    }
    chart::render_chart_spec(frame, &spec, area);
}

fn render_moving_average(frame: &mut Frame, app: &App, area: Rect) {
    let Some(table) = &app.comparison else {
        chart::render_no_data(frame, area, "Comparison data not fetched yet");
        return;
    };
    let spec = charts::moving_average_overlay(table, app.ma_window);
    if spec.series.iter().all(|s| s.points.is_empty()) {
        chart::render_no_data(frame, area, "Not enough history for this window");
        return;
    }
    chart::render_chart_spec(frame, &spec, area);
}

// ============================================================================
// Footer
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    let line = if let Screen::Input(field) = app.screen {
        // Modal input line with a block cursor
        Line::from(vec![
            Span::styled(
                field.prompt(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(app.input_buffer.clone(), Style::default().fg(Color::White)),
            Span::styled("█", Style::default().fg(Color::White)),
        ])
    } else if app.is_awaiting_quit_confirmation() {
        Line::from(Span::styled(
            "Press q again to quit, any other key to stay",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ))
    } else if let Some(error) = &app.fetch_error {
        Line::from(vec![
            Span::styled(
                format!("Fetch failed: {} ", error),
                Style::default().fg(Color::Red),
            ),
            Span::styled("[r] Retry", Style::default().fg(Color::Yellow)),
        ])
    } else if app.is_loading {
        Line::from(Span::styled(
            app.loading_message
                .clone()
                .unwrap_or_else(|| "Loading...".to_string()),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            "h/l sections | t ticker | b/e dates | c candles | v volume | [ ] MA | 1-6 select | x export | q quit",
            Style::default().fg(Color::Gray),
        ))
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}
