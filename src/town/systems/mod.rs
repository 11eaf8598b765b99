//! Simulation systems

pub mod businesses;
mod generation;
pub mod households;
pub mod metrics;

pub use businesses::update_businesses;
pub use generation::populate;
pub use households::update_households;
pub use metrics::{compute_metrics, gini_coefficient, MetricsSnapshot};
