//! Events and history logging

use serde::{Deserialize, Serialize};

use crate::core::types::{
    BusinessId, CategoryTable, HouseholdId, InfrastructureId, InfrastructureType, Position, Sector, Step,
};
use crate::town::business::BusinessSize;

/// Something that happened during a step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TownEvent {
    pub id: u32,
    pub step: Step,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    // Households
    FloodShock { household: HouseholdId, savings_lost: f64 },
    SectorChanged { household: HouseholdId, from: Sector, to: Sector, employer: Option<BusinessId> },
    Migrated { household: HouseholdId, from: Position, to: Position },

    // Businesses
    Hired { business: BusinessId, household: HouseholdId },
    BusinessExpanded { business: BusinessId, hires: u32 },
    BusinessUpgraded { business: BusinessId, size: BusinessSize },

    // Policy
    InfrastructureBuilt { infrastructure: InfrastructureId, kind: InfrastructureType, position: Position, newly_covered: u32 },
    BuildingSkipped { available: f64, cheapest: f64 },
    PolicyCycle { pool: f64, fractions: CategoryTable<f64> },
    AllocationRecovered { reason: String },
}

impl EventKind {
    /// Household the event is about, if any
    pub fn household(&self) -> Option<HouseholdId> {
        match self {
            EventKind::FloodShock { household, .. }
            | EventKind::SectorChanged { household, .. }
            | EventKind::Migrated { household, .. }
            | EventKind::Hired { household, .. } => Some(*household),
            _ => None,
        }
    }

    pub fn business(&self) -> Option<BusinessId> {
        match self {
            EventKind::Hired { business, .. }
            | EventKind::BusinessExpanded { business, .. }
            | EventKind::BusinessUpgraded { business, .. } => Some(*business),
            EventKind::SectorChanged { employer, .. } => *employer,
            _ => None,
        }
    }
}

/// The complete event history of a run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<TownEvent>,
    next_event_id: u32,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, kind: EventKind, step: Step) -> u32 {
        let id = self.next_event_id;
        self.next_event_id += 1;
        self.events.push(TownEvent { id, step, kind });
        id
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_for_step(&self, step: Step) -> impl Iterator<Item = &TownEvent> {
        self.events.iter().filter(move |e| e.step == step)
    }

    pub fn events_for_household(&self, household: HouseholdId) -> impl Iterator<Item = &TownEvent> {
        self.events.iter().filter(move |e| e.kind.household() == Some(household))
    }

    pub fn events_for_business(&self, business: BusinessId) -> impl Iterator<Item = &TownEvent> {
        self.events.iter().filter(move |e| e.kind.business() == Some(business))
    }

    /// Number of events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&EventKind) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(&e.kind)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids_are_sequential() {
        let mut log = EventLog::new();
        let a = log.add_event(EventKind::BuildingSkipped { available: 0.0, cheapest: 10.0 }, 1);
        let b = log.add_event(EventKind::BuildingSkipped { available: 0.0, cheapest: 10.0 }, 2);
        assert_eq!((a, b), (0, 1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_query_by_step_and_household() {
        let mut log = EventLog::new();
        log.add_event(
            EventKind::FloodShock { household: HouseholdId(3), savings_lost: 10.0 },
            1,
        );
        log.add_event(
            EventKind::Hired { business: BusinessId(0), household: HouseholdId(3) },
            2,
        );
        log.add_event(EventKind::Hired { business: BusinessId(1), household: HouseholdId(4) }, 2);

        assert_eq!(log.events_for_step(2).count(), 2);
        assert_eq!(log.events_for_household(HouseholdId(3)).count(), 2);
        assert_eq!(log.events_for_business(BusinessId(0)).count(), 1);
        assert_eq!(log.count(|k| matches!(k, EventKind::FloodShock { .. })), 1);
    }
}
