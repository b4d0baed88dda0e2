// ============================================================================
// Chart rendering : ChartSpec -> ratatui widgets
// ============================================================================
// Line and trendline specs map onto the ratatui Chart widget; candlestick
// specs are drawn with Unicode glyphs, one column per trading day.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::charts::{ChartKind, ChartSpec};
use crate::models::Bar;

const SERIES_PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::LightRed,
];

const BULLISH_COLOR: Color = Color::Green;
const BEARISH_COLOR: Color = Color::Red;
const Y_AXIS_WIDTH: u16 = 11;

const GLYPH_BODY: char = '┃';
const GLYPH_WICK: char = '│';
const GLYPH_VOID: char = ' ';

/// Draws any ChartSpec into `area`.
pub fn render_chart_spec(frame: &mut Frame, spec: &ChartSpec, area: Rect) {
    match spec.kind {
        ChartKind::Candlestick => render_candles(frame, spec, area),
        ChartKind::Line | ChartKind::ScatterTrend => render_lines(frame, spec, area),
    }
}

/// Inline rejection panel for charts that cannot be built.
pub fn render_rejection(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ");

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Neutral "no data" panel.
pub fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
        .title(" No data ");

    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(block)
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Line / trendline charts
// ============================================================================

fn render_lines(frame: &mut Frame, spec: &ChartSpec, area: Rect) {
    // Log-scale series are transformed up front; the axis labels undo it.
    let transformed: Vec<(String, Vec<(f64, f64)>)> = spec
        .series
        .iter()
        .map(|series| {
            let points = series
                .points
                .iter()
                .map(|&(x, y)| if spec.log_y { (x, y.max(1.0).log10()) } else { (x, y) })
                .collect();
            (series.name.clone(), points)
        })
        .collect();

    let all_points = transformed.iter().flat_map(|(_, p)| p.iter());
    let (mut x_max, mut y_min, mut y_max) = (0.0f64, f64::MAX, f64::MIN);
    let mut any = false;
    for &(x, y) in all_points {
        any = true;
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !any {
        render_no_data(frame, area, "Nothing to plot");
        return;
    }

    // 5% headroom so lines do not hug the frame
    let margin = (y_max - y_min).abs().max(1e-9) * 0.05;
    let y_lo = y_min - margin;
    let y_hi = y_max + margin;

    let datasets: Vec<Dataset> = transformed
        .iter()
        .enumerate()
        .map(|(i, (name, points))| {
            let color = SERIES_PALETTE[i % SERIES_PALETTE.len()];
            let mut dataset = Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(points);
            if spec.show_legend {
                dataset = dataset.name(name.as_str());
            }
            dataset
        })
        .collect();

    let y_label = |v: f64| -> String {
        if spec.log_y {
            format!("{:.1e}", 10f64.powf(v))
        } else {
            format!("{:.2}", v)
        }
    };

    let x_axis = Axis::default()
        .title("Days")
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, x_max.max(1.0)])
        .labels(vec![
            Span::raw("0"),
            Span::raw(format!("{}", (x_max / 2.0) as i64)),
            Span::raw(format!("{}", x_max as i64)),
        ]);

    let y_axis = Axis::default()
        .title(if spec.log_y { "Volume (log)" } else { "USD" })
        .style(Style::default().fg(Color::Gray))
        .bounds([y_lo, y_hi])
        .labels(vec![
            Span::raw(y_label(y_lo)),
            Span::raw(y_label((y_lo + y_hi) / 2.0)),
            Span::raw(y_label(y_hi)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", spec.title)),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

// ============================================================================
// Candlestick chart
// ============================================================================

fn render_candles(frame: &mut Frame, spec: &ChartSpec, area: Rect) {
    if spec.candles.is_empty() {
        render_no_data(frame, area, "Nothing to plot");
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", spec.title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width <= Y_AXIS_WIDTH + 4 || inner.height <= 3 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    let plot = chunks[0];
    let x_axis_area = chunks[1];

    let columns = (plot.width - Y_AXIS_WIDTH) as usize;
    let rows = plot.height as usize;

    // Fixed viewport over the most recent candles; no range slider.
    let start = spec.candles.len().saturating_sub(columns);
    let visible = &spec.candles[start..];

    let (min_price, max_price) = price_bounds(visible);
    let step = ((max_price - min_price) / rows as f64).max(1e-9);

    let mut lines: Vec<Line> = Vec::with_capacity(rows);
    for row in 0..rows {
        let band_high = max_price - row as f64 * step;
        let band_low = band_high - step;

        // Y-axis label every fourth row
        let label = if row % 4 == 0 {
            format!("{:>9.2} ", band_high)
        } else {
            " ".repeat(Y_AXIS_WIDTH as usize)
        };
        let mut spans = vec![Span::styled(label, Style::default().fg(Color::Gray))];

        for candle in visible {
            let glyph = candle_glyph(candle, band_low, band_high);
            let color = if candle.is_bearish() {
                BEARISH_COLOR
            } else {
                BULLISH_COLOR
            };
            spans.push(Span::styled(glyph.to_string(), Style::default().fg(color)));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), plot);

    frame.render_widget(date_axis(visible, columns), x_axis_area);
}

fn price_bounds(candles: &[Bar]) -> (f64, f64) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for candle in candles {
        min = min.min(candle.low);
        max = max.max(candle.high);
    }
    (min, max)
}

/// Glyph for one candle within one price band: body beats wick beats void.
fn candle_glyph(candle: &Bar, band_low: f64, band_high: f64) -> char {
    let body_low = candle.open.min(candle.close);
    let body_high = candle.open.max(candle.close);

    if body_high >= band_low && body_low <= band_high {
        GLYPH_BODY
    } else if candle.high >= band_low && candle.low <= band_high {
        GLYPH_WICK
    } else {
        GLYPH_VOID
    }
}

/// Single-row date axis: one label roughly every twelve columns.
fn date_axis<'a>(visible: &[Bar], columns: usize) -> Paragraph<'a> {
    let mut axis = " ".repeat(Y_AXIS_WIDTH as usize);
    let label_every = 12usize;
    let mut col = 0;
    while col < visible.len().min(columns) {
        let label = visible[col].date.format("%y-%m").to_string();
        axis.push_str(&label);
        let advance = label.len().max(label_every);
        axis.push_str(&" ".repeat(advance - label.len()));
        col += advance;
    }
    Paragraph::new(Line::from(Span::styled(
        axis,
        Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
    )))
}

// ============================================================================
// Tests
// ============================================================================
