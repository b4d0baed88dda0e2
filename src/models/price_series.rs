// ============================================================================
// PriceSeries : daily OHLCV history for one ticker
// ============================================================================
// One Bar per trading day, dates strictly increasing, no duplicates.
// Built once by the fetcher, immutable afterwards.
// ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One trading day of Open/High/Low/Close/Volume data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Close above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Daily price history for a single ticker symbol.
///
/// Invariant: bars are ordered by strictly increasing date. `push` skips any
/// bar that would violate the ordering instead of failing the whole series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Empty series. This is also what an unknown or delisted symbol yields.
    pub fn new(symbol: String) -> Self {
        Self {
            symbol,
            bars: Vec::new(),
        }
    }

    /// Builds a series from unordered provider rows, enforcing the date
    /// invariant.
    pub fn from_bars(symbol: String, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut series = Self::new(symbol);
        for bar in bars {
            series.push(bar);
        }
        series
    }

    /// Appends a bar. Out-of-order or duplicate dates are dropped with a
    /// warning; the provider occasionally repeats the current session row.
    pub fn push(&mut self, bar: Bar) {
        if let Some(last) = self.bars.last() {
            if bar.date <= last.date {
                warn!(symbol = %self.symbol, date = %bar.date, "Dropping out-of-order bar");
                return;
            }
        }
        self.bars.push(bar);
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Last `n` bars, oldest first.
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Calendar days between the first and last bar.
    pub fn span_days(&self) -> Option<i64> {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => Some((last - first).num_days()),
            _ => None,
        }
    }

    /// Bars with `start <= date <= end`. A reversed range yields an empty
    /// slice rather than an error.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> &[Bar] {
        if start > end {
            return &[];
        }
        let from = self.bars.partition_point(|b| b.date < start);
        let to = self.bars.partition_point(|b| b.date <= end);
        &self.bars[from..to]
    }

    /// Per-column summary statistics over the full history.
    pub fn summary_stats(&self) -> SummaryStats {
        SummaryStats::from_bars(&self.bars)
    }

    /// Per-column summary statistics over a date range. Empty or inverted
    /// ranges produce an empty table.
    pub fn summary_stats_range(&self, start: NaiveDate, end: NaiveDate) -> SummaryStats {
        SummaryStats::from_bars(self.range(start, end))
    }
}

/// count / mean / std / min / max for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        // Sample standard deviation; a single row has no spread.
        let std = if count > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            count,
            mean,
            std,
            min,
            max,
        })
    }
}

/// Describe-style statistics table, one row per OHLCV column.
/// Empty input yields an empty table, never a fault.
#[derive(Debug, Clone, Default)]
pub struct SummaryStats {
    rows: Vec<(&'static str, ColumnStats)>,
}

impl SummaryStats {
    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut rows = Vec::new();
        let columns: [(&'static str, fn(&Bar) -> f64); 5] = [
            ("open", |b| b.open),
            ("high", |b| b.high),
            ("low", |b| b.low),
            ("close", |b| b.close),
            ("volume", |b| b.volume as f64),
        ];
        for (label, extract) in columns {
            let values: Vec<f64> = bars.iter().map(extract).collect();
            if let Some(stats) = ColumnStats::from_values(&values) {
                rows.push((label, stats));
            }
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[(&'static str, ColumnStats)] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat_bar(d: NaiveDate, price: f64) -> Bar {
        Bar::new(d, price, price, price, price, 1000)
    }

    #[test]
    fn test_push_keeps_dates_strictly_increasing() {
        let mut series = PriceSeries::new("AAPL".to_string());
        series.push(flat_bar(date(2024, 1, 2), 100.0));
        series.push(flat_bar(date(2024, 1, 3), 101.0));
        // Duplicate and out-of-order bars are dropped
        series.push(flat_bar(date(2024, 1, 3), 999.0));
        series.push(flat_bar(date(2024, 1, 1), 999.0));

        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 101.0);
    }

    #[test]
    fn test_from_bars_sorts_input() {
        let bars = vec![
            flat_bar(date(2024, 1, 3), 3.0),
            flat_bar(date(2024, 1, 1), 1.0),
            flat_bar(date(2024, 1, 2), 2.0),
        ];
        let series = PriceSeries::from_bars("MSFT".to_string(), bars);
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), Some(date(2024, 1, 1)));
        assert_eq!(series.last_date(), Some(date(2024, 1, 3)));
    }

    #[test]
    fn test_tail() {
        let bars = (1..=10)
            .map(|d| flat_bar(date(2024, 1, d), d as f64))
            .collect();
        let series = PriceSeries::from_bars("AAPL".to_string(), bars);

        let tail = series.tail(5);
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0].date, date(2024, 1, 6));

        // Asking for more than available returns everything
        assert_eq!(series.tail(50).len(), 10);
    }

    #[test]
    fn test_span_days() {
        let bars = vec![
            flat_bar(date(2024, 1, 1), 1.0),
            flat_bar(date(2024, 1, 31), 2.0),
        ];
        let series = PriceSeries::from_bars("AAPL".to_string(), bars);
        assert_eq!(series.span_days(), Some(30));

        assert_eq!(PriceSeries::new("X".to_string()).span_days(), None);
    }

    #[test]
    fn test_range_filters_inclusive() {
        let bars = (1..=10)
            .map(|d| flat_bar(date(2024, 1, d), d as f64))
            .collect();
        let series = PriceSeries::from_bars("AAPL".to_string(), bars);

        let slice = series.range(date(2024, 1, 3), date(2024, 1, 5));
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].date, date(2024, 1, 3));
        assert_eq!(slice[2].date, date(2024, 1, 5));
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let bars = (1..=5)
            .map(|d| flat_bar(date(2024, 1, d), d as f64))
            .collect();
        let series = PriceSeries::from_bars("AAPL".to_string(), bars);

        assert!(series.range(date(2024, 1, 5), date(2024, 1, 1)).is_empty());
        assert!(series
            .summary_stats_range(date(2024, 1, 5), date(2024, 1, 1))
            .is_empty());
    }

    #[test]
    fn test_out_of_range_stats_are_empty() {
        let bars = vec![flat_bar(date(2024, 1, 1), 1.0)];
        let series = PriceSeries::from_bars("AAPL".to_string(), bars);

        let stats = series.summary_stats_range(date(2030, 1, 1), date(2030, 12, 31));
        assert!(stats.is_empty());
    }

    #[test]
    fn test_summary_stats_values() {
        let bars = vec![
            Bar::new(date(2024, 1, 1), 10.0, 12.0, 9.0, 11.0, 100),
            Bar::new(date(2024, 1, 2), 11.0, 14.0, 10.0, 13.0, 300),
        ];
        let series = PriceSeries::from_bars("AAPL".to_string(), bars);
        let stats = series.summary_stats();

        assert_eq!(stats.rows().len(), 5);
        let (label, close) = &stats.rows()[3];
        assert_eq!(*label, "close");
        assert_eq!(close.count, 2);
        assert_eq!(close.mean, 12.0);
        assert_eq!(close.min, 11.0);
        assert_eq!(close.max, 13.0);
        // Sample std of {11, 13} = sqrt(2)
        assert!((close.std - 2.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series_stats_are_empty() {
        let series = PriceSeries::new("NOPE".to_string());
        assert!(series.summary_stats().is_empty());
    }
}
