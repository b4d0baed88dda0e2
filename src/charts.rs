// ============================================================================
// Chart builders : tables in, ChartSpecs out
// ============================================================================
// Pure functions that turn fetched data into abstract chart descriptions.
// The UI layer decides how a ChartSpec is drawn; nothing here touches the
// terminal. Rejections (candlestick/volume with several tickers) are typed
// errors the UI shows inline, never panics.
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{Bar, ComparisonTable, MaWindow, PriceSeries, TickerSet};

/// Preferred chart dimensions, carried as display hints.
pub const CHART_HEIGHT: u16 = 800;
pub const CHART_WIDTH: u16 = 1200;

/// User-facing reasons a chart cannot be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("You selected more than one ticker, cannot show candlesticks")]
    CandlestickMultipleTickers,
    #[error("Cannot show volume of multiple tickers. Please select one.")]
    VolumeMultipleTickers,
    #[error("No data for {0}")]
    NoData(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Candlestick,
    /// Scatter with rolling trendlines; only the trendlines survive into
    /// the final spec.
    ScatterTrend,
}

/// One named line of `(x, y)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Abstract description of a renderable chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub log_y: bool,
    pub show_legend: bool,
    pub height: u16,
    pub width: u16,
    pub series: Vec<ChartSeries>,
    /// Populated for candlestick charts only.
    pub candles: Vec<Bar>,
}

impl ChartSpec {
    fn new(kind: ChartKind, title: String) -> Self {
        Self {
            kind,
            title,
            log_y: false,
            show_legend: false,
            height: CHART_HEIGHT,
            width: CHART_WIDTH,
            series: Vec::new(),
            candles: Vec::new(),
        }
    }
}

fn close_points(series: &PriceSeries) -> Vec<(f64, f64)> {
    series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| (i as f64, bar.close))
        .collect()
}

/// Line chart of closing prices, one series per selected ticker.
pub fn price_line(
    tickers: &TickerSet,
    fetched: &BTreeMap<String, PriceSeries>,
) -> Result<ChartSpec, ChartError> {
    let mut spec = ChartSpec::new(ChartKind::Line, format!("{} Price Action", tickers.label()));
    spec.show_legend = !tickers.is_single();

    for symbol in tickers.iter() {
        if let Some(series) = fetched.get(symbol) {
            if !series.is_empty() {
                spec.series.push(ChartSeries {
                    name: symbol.clone(),
                    points: close_points(series),
                });
            }
        }
    }

    if spec.series.is_empty() {
        return Err(ChartError::NoData(tickers.label()));
    }
    Ok(spec)
}

/// Candlestick chart; valid only when exactly one ticker is selected.
pub fn candlestick(
    tickers: &TickerSet,
    fetched: &BTreeMap<String, PriceSeries>,
) -> Result<ChartSpec, ChartError> {
    if !tickers.is_single() {
        return Err(ChartError::CandlestickMultipleTickers);
    }
    let symbol = tickers.first();
    let series = fetched
        .get(symbol)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ChartError::NoData(symbol.to_string()))?;

    let mut spec = ChartSpec::new(
        ChartKind::Candlestick,
        format!("{} Price Action", symbol),
    );
    spec.candles = series.bars().to_vec();
    Ok(spec)
}

/// Log-scale volume chart, gated on a single ticker.
pub fn volume(
    tickers: &TickerSet,
    fetched: &BTreeMap<String, PriceSeries>,
) -> Result<ChartSpec, ChartError> {
    if !tickers.is_single() {
        return Err(ChartError::VolumeMultipleTickers);
    }
    let symbol = tickers.first();
    let series = fetched
        .get(symbol)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ChartError::NoData(symbol.to_string()))?;

    let mut spec = ChartSpec::new(ChartKind::Line, format!("{} Volume", symbol));
    spec.log_y = true;
    spec.series.push(ChartSeries {
        name: symbol.to_string(),
        points: series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| (i as f64, bar.volume as f64))
            .collect(),
    });
    Ok(spec)
}

/// Comparison chart of the basket's closing prices. `selection` restricts
/// the displayed columns; an empty selection shows every column. Display
/// filtering only, never a refetch.
pub fn comparison_line(table: &ComparisonTable, selection: &[bool]) -> ChartSpec {
    let mut spec = ChartSpec::new(ChartKind::Line, "MANGA Stocks".to_string());
    spec.show_legend = true;

    let none_selected = !selection.iter().any(|&s| s);
    for (idx, label) in table.columns().iter().enumerate() {
        let shown = none_selected || selection.get(idx).copied().unwrap_or(false);
        if !shown {
            continue;
        }
        let points = table.column_points(idx);
        if !points.is_empty() {
            spec.series.push(ChartSeries {
                name: label.clone(),
                points,
            });
        }
    }
    spec
}

/// Moving-average overlay over the basket: the raw close scatter is computed
/// here but filtered out, leaving one trendline per column, all legended.
pub fn moving_average_overlay(table: &ComparisonTable, window: MaWindow) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::ScatterTrend,
        format!("{} Day moving average", window.days()),
    );
    spec.show_legend = true;

    // Build every trace the chart would carry, then keep the trendlines only.
    let mut traces: Vec<(ChartSeries, bool)> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let scatter = ChartSeries {
                name: label.clone(),
                points: table.column_points(idx),
            };
            (scatter, false)
        })
        .collect();
    for (label, points) in table.rolling_mean(window.days()) {
        traces.push((ChartSeries { name: label, points }, true));
    }

    spec.series = traces
        .into_iter()
        .filter(|(_, is_trend)| *is_trend)
        .map(|(series, _)| series)
        .collect();
    spec
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bar, MetricSnapshot};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn daily_series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(date(i as u32 + 1), c - 1.0, c + 1.0, c - 2.0, c, 1_000))
            .collect();
        PriceSeries::from_bars(symbol.to_string(), bars)
    }

    fn fetched(pairs: &[(&str, &[f64])]) -> BTreeMap<String, PriceSeries> {
        pairs
            .iter()
            .map(|&(s, closes)| (s.to_string(), daily_series(s, closes)))
            .collect()
    }

    fn basket_table() -> ComparisonTable {
        let series: Vec<PriceSeries> = crate::models::BASKET
            .iter()
            .map(|(symbol, _)| daily_series(symbol, &[10.0; 30]))
            .collect();
        let labeled: Vec<(String, &PriceSeries)> = crate::models::BASKET
            .iter()
            .zip(series.iter())
            .map(|((_, label), s)| (label.to_string(), s))
            .collect();
        ComparisonTable::from_series(&labeled)
    }

    #[test]
    fn test_price_line_title_names_the_ticker() {
        let tickers = TickerSet::parse("AAPL").unwrap();
        let data = fetched(&[("AAPL", &[1.0, 2.0, 3.0])]);

        let spec = price_line(&tickers, &data).unwrap();
        assert_eq!(spec.kind, ChartKind::Line);
        assert!(spec.title.contains("AAPL"));
        assert_eq!(spec.series.len(), 1);
        assert_eq!(spec.series[0].points.len(), 3);
    }

    #[test]
    fn test_price_line_multi_ticker_has_one_series_each() {
        let tickers = TickerSet::parse("AAPL MSFT").unwrap();
        let data = fetched(&[("AAPL", &[1.0, 2.0]), ("MSFT", &[3.0, 4.0])]);

        let spec = price_line(&tickers, &data).unwrap();
        assert_eq!(spec.series.len(), 2);
        assert!(spec.show_legend);
    }

    #[test]
    fn test_price_line_empty_data_degrades() {
        let tickers = TickerSet::parse("NOPE").unwrap();
        let mut data = BTreeMap::new();
        data.insert("NOPE".to_string(), PriceSeries::new("NOPE".to_string()));

        assert_eq!(
            price_line(&tickers, &data),
            Err(ChartError::NoData("NOPE".to_string()))
        );
    }

    #[test]
    fn test_candlestick_rejects_multiple_tickers() {
        let tickers = TickerSet::parse("AAPL MSFT").unwrap();
        let data = fetched(&[("AAPL", &[1.0]), ("MSFT", &[2.0])]);

        assert_eq!(
            candlestick(&tickers, &data),
            Err(ChartError::CandlestickMultipleTickers)
        );
    }

    #[test]
    fn test_candlestick_single_ticker() {
        let tickers = TickerSet::parse("AAPL").unwrap();
        let data = fetched(&[("AAPL", &[1.0, 2.0, 3.0])]);

        let spec = candlestick(&tickers, &data).unwrap();
        assert_eq!(spec.kind, ChartKind::Candlestick);
        assert_eq!(spec.candles.len(), 3);
        assert!(spec.series.is_empty());
    }

    #[test]
    fn test_volume_renders_iff_single_ticker() {
        let single = TickerSet::parse("AAPL").unwrap();
        let multi = TickerSet::parse("AAPL MSFT").unwrap();
        let data = fetched(&[("AAPL", &[1.0, 2.0]), ("MSFT", &[3.0])]);

        let spec = volume(&single, &data).unwrap();
        assert!(spec.log_y);
        assert_eq!(spec.series[0].points.len(), 2);

        assert_eq!(
            volume(&multi, &data),
            Err(ChartError::VolumeMultipleTickers)
        );
    }

    #[test]
    fn test_comparison_empty_selection_shows_all_columns() {
        let table = basket_table();
        let spec = comparison_line(&table, &[false; 6]);
        assert_eq!(spec.series.len(), 6);
        assert!(spec.show_legend);
    }

    #[test]
    fn test_comparison_selection_filters_columns() {
        let table = basket_table();
        let spec = comparison_line(&table, &[false, true, false, true, false, false]);
        let names: Vec<&str> = spec.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["aapl", "msft"]);
    }

    #[test]
    fn test_overlay_has_one_trendline_per_basket_ticker() {
        let table = basket_table();
        let spec = moving_average_overlay(&table, MaWindow::W20);

        assert_eq!(spec.kind, ChartKind::ScatterTrend);
        assert!(spec.show_legend);
        assert_eq!(spec.series.len(), 6);
        assert!(spec.title.contains("20"));
        // Only trendlines: 30 rows, window 20 -> 11 points per line,
        // never the 30 raw scatter points.
        for series in &spec.series {
            assert_eq!(series.points.len(), 11);
        }
    }

    // End-to-end pipeline scenarios over fixture data (fetcher excluded).

    #[test]
    fn test_scenario_single_default_ticker() {
        let tickers = TickerSet::parse("AAPL").unwrap();
        let data = fetched(&[("AAPL", &[100.0, 101.0, 102.0, 103.0])]);

        let snapshot = MetricSnapshot::from_series(&data["AAPL"]).unwrap();
        assert_eq!(snapshot.latest_close, 103.0);

        let price = price_line(&tickers, &data).unwrap();
        assert!(price.title.contains("AAPL"));

        assert!(volume(&tickers, &data).is_ok());
        assert!(!data["AAPL"].summary_stats().is_empty());
    }

    #[test]
    fn test_scenario_two_tickers_candlestick_checked() {
        let tickers = TickerSet::parse("AAPL MSFT").unwrap();
        let data = fetched(&[("AAPL", &[1.0, 2.0]), ("MSFT", &[3.0, 4.0])]);

        assert_eq!(
            candlestick(&tickers, &data),
            Err(ChartError::CandlestickMultipleTickers)
        );
        assert_eq!(
            volume(&tickers, &data),
            Err(ChartError::VolumeMultipleTickers)
        );
        // The line price chart still renders
        assert!(price_line(&tickers, &data).is_ok());
    }
}
