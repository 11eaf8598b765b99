//! TownWorld - the authoritative state container

use crate::core::config::{GridConfig, InfrastructureConfig};
use crate::core::error::{Result, SimError};
use crate::core::types::{BusinessId, HouseholdId, InfrastructureId, InfrastructureType, Occupant, Position, Step};
use crate::infrastructure::{InfrastructureItem, InfrastructureRegistry};
use crate::spatial::SpatialGrid;
use crate::town::business::Business;
use crate::town::household::Household;

/// Owns every agent and item; the grid and registry are indices over them
#[derive(Clone, Debug)]
pub struct TownWorld {
    /// All households, indexed by id
    pub households: Vec<Household>,
    /// All businesses, indexed by id
    pub businesses: Vec<Business>,
    /// All infrastructure ever built, indexed by id
    pub infrastructure: Vec<InfrastructureItem>,
    pub grid: SpatialGrid,
    pub registry: InfrastructureRegistry,
    /// Steps completed so far
    pub step: Step,
    next_household_id: u32,
    next_business_id: u32,
    next_infrastructure_id: u32,
}

impl TownWorld {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            households: Vec::new(),
            businesses: Vec::new(),
            infrastructure: Vec::new(),
            grid: SpatialGrid::new(config),
            registry: InfrastructureRegistry::new(config.width, config.height),
            step: 0,
            next_household_id: 0,
            next_business_id: 0,
            next_infrastructure_id: 0,
        }
    }

    /// Generate a new unique HouseholdId
    pub fn next_household_id(&mut self) -> HouseholdId {
        let id = HouseholdId(self.next_household_id);
        self.next_household_id += 1;
        id
    }

    /// Generate a new unique BusinessId
    pub fn next_business_id(&mut self) -> BusinessId {
        let id = BusinessId(self.next_business_id);
        self.next_business_id += 1;
        id
    }

    fn next_infrastructure_id(&mut self) -> InfrastructureId {
        let id = InfrastructureId(self.next_infrastructure_id);
        self.next_infrastructure_id += 1;
        id
    }

    pub fn business(&self, id: BusinessId) -> Option<&Business> {
        self.businesses.get(id.0 as usize).filter(|b| b.id == id)
    }

    /// Place a household on the grid and take ownership of it
    pub fn add_household(&mut self, mut household: Household) -> Result<()> {
        self.grid.place_at(Occupant::Household(household.id), household.position)?;
        household.urban = self.grid.is_urban(household.position);
        self.households.push(household);
        Ok(())
    }

    pub fn add_business(&mut self, business: Business) -> Result<()> {
        self.grid.place_at(Occupant::Business(business.id), business.position)?;
        self.businesses.push(business);
        Ok(())
    }

    /// Construct an item and index it in both the grid and the registry
    pub fn build(
        &mut self,
        kind: InfrastructureType,
        position: Position,
        config: &InfrastructureConfig,
    ) -> Result<InfrastructureId> {
        self.grid.check_bounds(position)?;
        let id = self.next_infrastructure_id();
        let item = InfrastructureItem::new(id, kind, position, config, self.step);
        self.registry.register(&item)?;
        self.grid.place_at(Occupant::Infrastructure(id), position)?;
        self.infrastructure.push(item);
        Ok(id)
    }

    /// Age every item by one policy cycle
    pub fn decay_infrastructure(&mut self, amount: f64, floor: f64) -> Result<()> {
        for item in &mut self.infrastructure {
            item.decay(amount, floor);
            self.registry.set_quality(item.id, item.quality)?;
        }
        Ok(())
    }

    pub fn household_positions(&self) -> impl Iterator<Item = Position> + Clone + '_ {
        self.households.iter().map(|h| h.position)
    }

    /// Check the grid and registry against the authoritative collections
    pub fn verify_indices(&self) -> Result<()> {
        let occupants = self
            .households
            .iter()
            .map(|h| (Occupant::Household(h.id), h.position))
            .chain(self.businesses.iter().map(|b| (Occupant::Business(b.id), b.position)))
            .chain(
                self.infrastructure
                    .iter()
                    .map(|i| (Occupant::Infrastructure(i.id), i.position)),
            );
        self.grid.verify(occupants)?;
        self.registry.verify(&self.infrastructure)?;

        let mut linked = vec![0u32; self.businesses.len()];
        for household in &self.households {
            if let Some(id) = household.employer {
                match self.business(id) {
                    Some(_) => linked[id.0 as usize] += 1,
                    None => {
                        return Err(SimError::DataIntegrity(format!(
                            "{:?} works for unknown {:?}",
                            household.id, id
                        )))
                    }
                }
            }
        }
        for (business, workers) in self.businesses.iter().zip(linked) {
            if workers > business.employees {
                return Err(SimError::DataIntegrity(format!(
                    "{:?} links {} households but employs {}",
                    business.id, workers, business.employees
                )));
            }
        }

        for household in &self.households {
            if household.urban != self.grid.is_urban(household.position) {
                return Err(SimError::DataIntegrity(format!(
                    "{:?} urban flag is stale at {}",
                    household.id, household.position
                )));
            }
        }
        Ok(())
    }
}

/// Detach `household` from its employer and free the slot it held
pub(crate) fn release_worker(businesses: &mut [Business], household: &mut Household) {
    if let Some(id) = household.employer.take() {
        if let Some(business) = businesses.get_mut(id.0 as usize).filter(|b| b.id == id) {
            business.employees = business.employees.saturating_sub(1);
        }
    }
}

/// Move `household` to `to`, keeping the grid index and urban flag in step
pub(crate) fn relocate(grid: &mut SpatialGrid, household: &mut Household, to: Position) -> Result<()> {
    grid.move_to(Occupant::Household(household.id), to)?;
    household.position = to;
    household.urban = grid.is_urban(to);
    Ok(())
}
