// ============================================================================
// ComparisonTable : closing prices of the basket, aligned by date
// ============================================================================
// The fixed six-ticker basket is fetched independently; here the Close
// columns are merged into one wide table keyed by date. A ticker without a
// bar on a given date leaves a gap (no forward-fill).
// ============================================================================

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::PriceSeries;

/// The fixed comparison basket: (provider symbol, column label).
pub const BASKET: [(&str, &str); 6] = [
    ("AMZN", "amzn"),
    ("AAPL", "aapl"),
    ("GOOG", "goog"),
    ("MSFT", "msft"),
    ("NFLX", "nflx"),
    ("QQQ", "nasdaq"),
];

/// Moving-average window lengths offered by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaWindow {
    W5,
    W10,
    W20,
    W50,
    W100,
    W200,
}

impl MaWindow {
    pub fn days(&self) -> usize {
        match self {
            MaWindow::W5 => 5,
            MaWindow::W10 => 10,
            MaWindow::W20 => 20,
            MaWindow::W50 => 50,
            MaWindow::W100 => 100,
            MaWindow::W200 => 200,
        }
    }

    pub fn all() -> [MaWindow; 6] {
        [
            MaWindow::W5,
            MaWindow::W10,
            MaWindow::W20,
            MaWindow::W50,
            MaWindow::W100,
            MaWindow::W200,
        ]
    }

    /// Next window in the selector (saturates at 200).
    pub fn next(&self) -> MaWindow {
        match self {
            MaWindow::W5 => MaWindow::W10,
            MaWindow::W10 => MaWindow::W20,
            MaWindow::W20 => MaWindow::W50,
            MaWindow::W50 => MaWindow::W100,
            MaWindow::W100 => MaWindow::W200,
            MaWindow::W200 => MaWindow::W200,
        }
    }

    /// Previous window in the selector (saturates at 5).
    pub fn previous(&self) -> MaWindow {
        match self {
            MaWindow::W5 => MaWindow::W5,
            MaWindow::W10 => MaWindow::W5,
            MaWindow::W20 => MaWindow::W10,
            MaWindow::W50 => MaWindow::W20,
            MaWindow::W100 => MaWindow::W50,
            MaWindow::W200 => MaWindow::W100,
        }
    }
}

impl Default for MaWindow {
    fn default() -> Self {
        MaWindow::W20
    }
}

/// One date row of the comparison table, one optional close per column.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    pub closes: Vec<Option<f64>>,
}

/// Wide table of closing prices, one column per basket ticker.
///
/// Invariants: exactly one column per input series, columns labeled in input
/// order, rows sorted by date with every column aligned.
#[derive(Debug, Clone, Default)]
pub struct ComparisonTable {
    columns: Vec<String>,
    rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Merges `(label, series)` pairs by date. Gaps stay `None`.
    pub fn from_series(labeled: &[(String, &PriceSeries)]) -> Self {
        let columns: Vec<String> = labeled.iter().map(|(label, _)| label.clone()).collect();

        let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        for (idx, (_, series)) in labeled.iter().enumerate() {
            for bar in series.bars() {
                let row = by_date
                    .entry(bar.date)
                    .or_insert_with(|| vec![None; columns.len()]);
                row[idx] = Some(bar.close);
            }
        }

        let rows = by_date
            .into_iter()
            .map(|(date, closes)| ComparisonRow { date, closes })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Chartable `(row index, close)` points for one column, gaps skipped.
    pub fn column_points(&self, column: usize) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                row.closes
                    .get(column)
                    .copied()
                    .flatten()
                    .map(|close| (i as f64, close))
            })
            .collect()
    }

    /// Trailing rolling mean per column.
    ///
    /// Convention: the window slides over present values only, so gaps in a
    /// column do not reset it; the mean is emitted at the row of the newest
    /// value once `window` values have accumulated. Output is one
    /// `(label, points)` pair per column, points as `(row index, mean)`.
    pub fn rolling_mean(&self, window: usize) -> Vec<(String, Vec<(f64, f64)>)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, label)| {
                let mut recent: Vec<f64> = Vec::with_capacity(window);
                let mut points = Vec::new();
                for (i, row) in self.rows.iter().enumerate() {
                    let Some(close) = row.closes.get(col).copied().flatten() else {
                        continue;
                    };
                    recent.push(close);
                    if recent.len() > window {
                        recent.remove(0);
                    }
                    if recent.len() == window {
                        let mean = recent.iter().sum::<f64>() / window as f64;
                        points.push((i as f64, mean));
                    }
                }
                (label.clone(), points)
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
