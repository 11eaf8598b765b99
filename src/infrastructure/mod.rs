//! Infrastructure items and the coverage registry

pub mod item;
pub mod registry;

pub use item::InfrastructureItem;
pub use registry::{CoverageBonuses, InfrastructureRegistry};
