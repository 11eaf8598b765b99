//! Infrastructure items - permanent public works built by the policy engine

use serde::{Deserialize, Serialize};

use crate::core::config::InfrastructureConfig;
use crate::core::types::{InfrastructureId, InfrastructureType, Position, Step};

/// A built road, school, clinic, market or utility
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureItem {
    pub id: InfrastructureId,
    pub kind: InfrastructureType,
    pub position: Position,
    /// Households within this Euclidean distance are served
    pub radius: f64,
    pub construction_cost: f64,
    /// 1.0 when new; decays every policy cycle down to the configured floor
    pub quality: f64,
    /// Users served (traffic, pupils, patients, vendors, connections)
    pub capacity: u32,
    pub built_step: Step,
}

impl InfrastructureItem {
    /// New item with radius, cost and capacity taken from the type table
    pub fn new(
        id: InfrastructureId,
        kind: InfrastructureType,
        position: Position,
        config: &InfrastructureConfig,
        built_step: Step,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            radius: *config.radii.get(kind),
            construction_cost: *config.costs.get(kind),
            quality: 1.0,
            capacity: *config.capacity.get(kind),
            built_step,
        }
    }

    pub fn covers(&self, pos: Position) -> bool {
        self.position.distance(&pos) <= self.radius
    }

    /// Age the item by one policy cycle
    pub fn decay(&mut self, amount: f64, floor: f64) {
        self.quality = (self.quality - amount).max(floor);
    }
}
