// ============================================================================
// marketdash - Library
// ============================================================================
// Terminal dashboard for historical stock market data.
// ============================================================================

pub mod api;    // Provider client and fetch cache
pub mod app;    // Dashboard state
pub mod charts; // ChartSpec builders
pub mod export; // CSV export
pub mod models; // Data structures
pub mod ui;     // Terminal user interface
