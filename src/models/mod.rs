// ============================================================================
// Module : models
// ============================================================================
// Data structures of the dashboard pipeline.
// ============================================================================

pub mod comparison;
pub mod metrics;
pub mod price_series;
pub mod ticker_set;

// Re-exports so callers can write `use marketdash::models::PriceSeries;`
pub use comparison::{ComparisonRow, ComparisonTable, MaWindow, BASKET};
pub use metrics::{latest_close, percent_change, MetricSnapshot};
pub use price_series::{Bar, ColumnStats, PriceSeries, SummaryStats};
pub use ticker_set::TickerSet;
