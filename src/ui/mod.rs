pub mod chart;
pub mod dashboard;
pub mod events;
pub mod sidebar;

pub use events::{Event, EventHandler};
