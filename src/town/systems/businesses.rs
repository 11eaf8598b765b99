//! Business rules: revenue, profit, hiring and size upgrades

use ordered_float::OrderedFloat;

use crate::core::config::{BusinessConfig, SimulationConfig};
use crate::core::types::{HouseholdId, Occupant};
use crate::infrastructure::{CoverageBonuses, InfrastructureRegistry};
use crate::spatial::SpatialGrid;
use crate::town::business::Business;
use crate::town::events::{EventKind, EventLog};
use crate::town::household::Household;
use crate::town::world::TownWorld;

/// Run one step of every business, in ascending id order
pub fn update_businesses(world: &mut TownWorld, config: &SimulationConfig, events: &mut EventLog) {
    let step = world.step;
    let biz = &config.business;
    let TownWorld {
        households,
        businesses,
        grid,
        registry,
        ..
    } = world;

    for business in businesses.iter_mut() {
        update_accounts(business, registry, biz);

        if business.can_expand(biz) {
            let hires = expand(business, households, grid, biz, events, step);
            if hires > 0 {
                tracing::debug!(business = business.id.0, hires, employees = business.employees, "Business expanded");
                events.add_event(
                    EventKind::BusinessExpanded {
                        business: business.id,
                        hires,
                    },
                    step,
                );
            }
        }

        if try_upgrade(business, biz) {
            tracing::debug!(business = business.id.0, size = business.size.label(), "Business upgraded");
            events.add_event(
                EventKind::BusinessUpgraded {
                    business: business.id,
                    size: business.size,
                },
                step,
            );
        }
    }
}

/// Refresh the productivity multiplier, revenue, profit and retained earnings
pub fn update_accounts(business: &mut Business, registry: &InfrastructureRegistry, config: &BusinessConfig) {
    let bonuses = CoverageBonuses::for_businesses(config);
    business.productivity_multiplier = registry.productivity_multiplier(business.position, false, &bonuses);
    business.revenue = business.revenue_per_worker(config) * f64::from(business.employees);
    business.profit = business.revenue - f64::from(business.employees) * config.wage_cost_per_employee - config.overhead;
    business.retained_earnings = (business.retained_earnings + business.profit).max(0.0);
}

/// Hire up to `max_hires_per_step` local workers while slots, candidates and money last
fn expand(
    business: &mut Business,
    households: &mut [Household],
    grid: &SpatialGrid,
    config: &BusinessConfig,
    events: &mut EventLog,
    step: u64,
) -> u32 {
    let mut hires = 0;
    while hires < config.max_hires_per_step && !business.is_full(config) {
        let Some(id) = find_candidate(business, households, grid, config) else {
            break;
        };
        let Some(household) = households.get_mut(id.0 as usize).filter(|h| h.id == id) else {
            break;
        };
        if !business.pay(config.hire_cost) {
            break;
        }
        household.employer = Some(business.id);
        business.employees += 1;
        hires += 1;
        events.add_event(
            EventKind::Hired {
                business: business.id,
                household: id,
            },
            step,
        );
    }
    hires
}

/// Nearby unemployed household of the business's sector.
///
/// Landless households come first, then the nearest, then the lowest id.
fn find_candidate(
    business: &Business,
    households: &[Household],
    grid: &SpatialGrid,
    config: &BusinessConfig,
) -> Option<HouseholdId> {
    grid.neighbors(business.position, config.hiring_radius)
        .filter_map(|occupant| match occupant {
            Occupant::Household(id) => households.get(id.0 as usize).filter(|h| h.id == id),
            _ => None,
        })
        .filter(|h| h.is_unemployed() && h.sector == business.sector)
        .min_by_key(|h| (!h.landless, OrderedFloat(h.position.distance(&business.position)), h.id))
        .map(|h| h.id)
}

/// Grow into the next size tier once every slot is filled and earnings allow
pub fn try_upgrade(business: &mut Business, config: &BusinessConfig) -> bool {
    if !business.is_full(config) {
        return false;
    }
    let (Some(next), Some(cost)) = (business.size.next(), business.upgrade_cost(config)) else {
        return false;
    };
    if business.retained_earnings < cost {
        return false;
    }
    business.retained_earnings -= cost;
    business.size = next;
    true
}
