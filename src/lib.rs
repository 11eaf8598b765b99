//! Town Growth - agent-based simulation of a rural settlement becoming a town
//!
//! Households and businesses make per-step decisions on a spatial lattice,
//! a municipal policy engine periodically spends a budget on infrastructure
//! and programs, and a metrics aggregator records population-level
//! indicators after every step. Runs are fully determined by the config and
//! its seed.

pub mod core;
pub mod infrastructure;
pub mod policy;
pub mod spatial;
pub mod town;

pub use crate::core::{Result, SimError, SimulationConfig};
pub use crate::town::{initialize, run, simulate, step, EngineState, MetricsSnapshot};
