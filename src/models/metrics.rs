// ============================================================================
// Derived metrics : latest close and daily percent change
// ============================================================================
// Pure functions of a PriceSeries. An empty series means the data is
// unavailable (unknown symbol, provider gap); callers render that as an
// empty metric instead of a fault.
// ============================================================================

use crate::models::PriceSeries;

/// Headline metrics for one ticker, derived from the final bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSnapshot {
    /// Last close, rounded to cents.
    pub latest_close: f64,
    /// ((close - open) / open) * 100 of the final bar, rounded to 2 decimals.
    pub percent_change: f64,
}

impl MetricSnapshot {
    /// `None` signals DataUnavailable: empty series, or a final bar whose
    /// open is zero (the change is undefined).
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        Some(Self {
            latest_close: latest_close(series)?,
            percent_change: percent_change(series)?,
        })
    }
}

/// Rounds to two decimal places, matching the displayed precision.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Last close price, rounded. `None` on an empty series.
pub fn latest_close(series: &PriceSeries) -> Option<f64> {
    series.last().map(|bar| round2(bar.close))
}

/// Percent change over the final bar, rounded. `None` on an empty series
/// or a zero open.
pub fn percent_change(series: &PriceSeries) -> Option<f64> {
    let last = series.last()?;
    if last.open == 0.0 {
        return None;
    }
    Some(round2(((last.close - last.open) / last.open) * 100.0))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;
    use chrono::NaiveDate;

    fn series_with(open: f64, close: f64) -> PriceSeries {
        let bars = vec![
            Bar::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                1.0,
                2.0,
                0.5,
                1.5,
                100,
            ),
            Bar::new(
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                200,
            ),
        ];
        PriceSeries::from_bars("AAPL".to_string(), bars)
    }

    #[test]
    fn test_latest_close_uses_last_bar_rounded() {
        let series = series_with(100.0, 105.126);
        assert_eq!(latest_close(&series), Some(105.13));
    }

    #[test]
    fn test_percent_change_formula() {
        // (105 - 100) / 100 * 100 = 5.00
        let series = series_with(100.0, 105.0);
        assert_eq!(percent_change(&series), Some(5.0));

        // (97.5 - 100) / 100 * 100 = -2.50
        let series = series_with(100.0, 97.5);
        assert_eq!(percent_change(&series), Some(-2.5));
    }

    #[test]
    fn test_percent_change_rounds_to_two_decimals() {
        // (101 - 300) / 300 * 100 = -66.3333... -> -66.33
        let series = series_with(300.0, 101.0);
        assert_eq!(percent_change(&series), Some(-66.33));
    }

    #[test]
    fn test_empty_series_is_data_unavailable() {
        let series = PriceSeries::new("NOPE".to_string());
        assert_eq!(latest_close(&series), None);
        assert_eq!(percent_change(&series), None);
        assert!(MetricSnapshot::from_series(&series).is_none());
    }

    #[test]
    fn test_zero_open_is_data_unavailable() {
        let series = series_with(0.0, 10.0);
        assert_eq!(percent_change(&series), None);
    }

    #[test]
    fn test_snapshot_combines_both_metrics() {
        let series = series_with(100.0, 105.0);
        let snap = MetricSnapshot::from_series(&series).unwrap();
        assert_eq!(snap.latest_close, 105.0);
        assert_eq!(snap.percent_change, 5.0);
    }
}
