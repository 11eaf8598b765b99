//! The settlement: agents, world state, per-step systems and orchestration

pub mod business;
pub mod events;
pub mod export;
pub mod household;
pub mod output;
pub mod simulation;
pub mod systems;
pub mod world;

pub use business::{Business, BusinessSize};
pub use events::{EventKind, EventLog, TownEvent};
pub use export::{ColorClass, EntityKind, StepRecord, VisualEntity, VisualFrame};
pub use household::Household;
pub use output::{SimulationOutput, SimulationStats};
pub use simulation::{initialize, run, simulate, step, EngineState, SimulationRun};
pub use systems::MetricsSnapshot;
pub use world::TownWorld;
