// ============================================================================
// Module : api
// ============================================================================
// Market data provider access and the session fetch cache.
// ============================================================================

pub mod cache;
pub mod yahoo;

pub use cache::{fetch_cached, FetchCache};
