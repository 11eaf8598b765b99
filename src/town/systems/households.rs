//! Household decision rules: shocks, income, investment, sector change, migration

use ordered_float::OrderedFloat;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{BusinessId, InfrastructureType, Occupant, Position, Sector};
use crate::infrastructure::{CoverageBonuses, InfrastructureRegistry};
use crate::spatial::SpatialGrid;
use crate::town::business::Business;
use crate::town::events::{EventKind, EventLog};
use crate::town::household::Household;
use crate::town::world::{release_worker, relocate, TownWorld};

/// Run one step of every household, in ascending id order
pub fn update_households(
    world: &mut TownWorld,
    config: &SimulationConfig,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> Result<()> {
    let step = world.step;
    let TownWorld {
        households,
        businesses,
        grid,
        registry,
        ..
    } = world;

    for household in households.iter_mut() {
        if let Some(savings_lost) = resolve_shock(household, grid, config, rng) {
            tracing::debug!(household = household.id.0, savings_lost, "Flood shock");
            events.add_event(
                EventKind::FloodShock {
                    household: household.id,
                    savings_lost,
                },
                step,
            );
        }

        realize_income(household, registry, config);
        invest(household, registry, config);

        let from = household.sector;
        if let Some(employer) = consider_sector_change(household, businesses, grid, config, rng) {
            tracing::debug!(
                household = household.id.0,
                from = from.label(),
                to = household.sector.label(),
                employer = employer.0,
                "Left agriculture"
            );
            events.add_event(
                EventKind::SectorChanged {
                    household: household.id,
                    from,
                    to: household.sector,
                    employer: Some(employer),
                },
                step,
            );
        }

        if let Some(target) = consider_migration(household, grid, registry, config, rng) {
            let from = household.position;
            relocate(grid, household, target)?;
            household.savings -= config.migration.cost;
            tracing::debug!(household = household.id.0, %from, to = %target, "Migrated towards town");
            events.add_event(
                EventKind::Migrated {
                    household: household.id,
                    from,
                    to: target,
                },
                step,
            );
        }

        update_savings(household, config);
    }
    Ok(())
}

/// Roll for a flood. Returns the savings destroyed when one hits.
///
/// Only farmers and floodplain dwellers are exposed; nobody else consumes
/// a random draw.
pub fn resolve_shock(
    household: &mut Household,
    grid: &SpatialGrid,
    config: &SimulationConfig,
    rng: &mut ChaCha8Rng,
) -> Option<f64> {
    let exposed = household.sector == Sector::Agriculture || grid.is_flood_prone(household.position);
    if !exposed || !rng.gen_bool(config.rates.flood_risk) {
        household.flood_affected = false;
        return None;
    }

    household.flood_affected = true;
    household.flood_exposure += 1;
    let lost = household.savings * config.shocks.flood_savings_drawdown;
    household.savings -= lost;
    Some(lost)
}

/// Income before flood losses and remittances
pub fn earned_income(household: &Household, registry: &InfrastructureRegistry, config: &SimulationConfig) -> f64 {
    let bonuses = CoverageBonuses::for_households(&config.income);
    let mut earned = config.wages.get(household.sector)
        * registry.productivity_multiplier(household.position, household.off_grid, &bonuses);
    if household.urban && household.sector.is_urban_trade() {
        earned *= config.rates.urban_wage_multiplier;
    }
    if household.is_landless_farmer() {
        earned *= config.income.landless_agriculture_multiplier;
    }
    earned
}

pub fn realize_income(household: &mut Household, registry: &InfrastructureRegistry, config: &SimulationConfig) {
    let earned = earned_income(household, registry, config);
    let flood_loss = if household.flood_affected {
        earned * config.shocks.flood_income_penalty
    } else {
        0.0
    };
    let remittance = if household.remittance {
        config.income.remittance_amount
    } else {
        0.0
    };
    household.income = (earned - flood_loss + remittance).max(0.0);
}

/// Spend part of savings on schooling and health care where either is reachable
pub fn invest(household: &mut Household, registry: &InfrastructureRegistry, config: &SimulationConfig) {
    let inv = &config.investment;
    if household.savings <= inv.threshold {
        return;
    }

    let education_max = config.household.education_max;
    let schooled = registry.is_covered(household.position, InfrastructureType::School) || household.cooperative;
    if schooled && household.education < education_max {
        let cap = (education_max - household.education) * inv.education_cost_per_level;
        let spend = (inv.education_fraction * household.savings).min(cap);
        household.education = (household.education + spend / inv.education_cost_per_level).min(education_max);
        household.savings -= spend;
    }

    let health_max = config.household.health_max;
    let treated = registry.is_covered(household.position, InfrastructureType::Clinic) || household.microfinance;
    if treated && household.health < health_max {
        let cap = (health_max - household.health) * inv.health_cost_per_unit;
        let spend = (inv.health_fraction * household.savings).min(cap);
        household.health = (household.health + spend / inv.health_cost_per_unit).min(health_max);
        household.savings -= spend;
    }
}

/// Flood-displaced landless farmers may take a job at a nearby business.
///
/// Returns the new employer when the household switches sector.
pub fn consider_sector_change(
    household: &mut Household,
    businesses: &mut [Business],
    grid: &SpatialGrid,
    config: &SimulationConfig,
    rng: &mut ChaCha8Rng,
) -> Option<BusinessId> {
    let transition = &config.transition;
    let pushed = household.flood_affected || household.flood_exposure >= transition.flood_exposure_threshold;
    if !household.is_landless_farmer() || !pushed {
        return None;
    }
    if !rng.gen_bool(transition.switch_probability) {
        return None;
    }

    let employer = nearest_open_business(household.position, businesses, grid, config)?;
    release_worker(businesses, household);
    let business = businesses.get_mut(employer.0 as usize)?;
    business.employees += 1;
    household.sector = business.sector;
    household.employer = Some(employer);
    Some(employer)
}

/// Closest manufacturing or services business with a free slot, lower id on ties
fn nearest_open_business(
    position: Position,
    businesses: &[Business],
    grid: &SpatialGrid,
    config: &SimulationConfig,
) -> Option<BusinessId> {
    grid.neighbors(position, config.transition.job_search_radius)
        .filter_map(|occupant| match occupant {
            Occupant::Business(id) => businesses.get(id.0 as usize).filter(|b| b.id == id),
            _ => None,
        })
        .filter(|b| b.sector.is_urban_trade() && !b.is_full(&config.business))
        .min_by_key(|b| (OrderedFloat(b.position.distance(&position)), b.id))
        .map(|b| b.id)
}

/// Best income a household could earn at the town center
pub fn town_center_income(household: &Household, grid: &SpatialGrid, registry: &InfrastructureRegistry, config: &SimulationConfig) -> f64 {
    let bonuses = CoverageBonuses::for_households(&config.income);
    let multiplier = registry.productivity_multiplier(grid.town_center(), household.off_grid, &bonuses);
    let best_wage = config.wages.manufacturing.max(config.wages.services);
    best_wage * config.rates.urban_wage_multiplier * multiplier
}

/// Decide whether to move towards town; returns the destination cell.
///
/// The attachment draw is only taken once income and savings both favor a move.
pub fn consider_migration(
    household: &Household,
    grid: &SpatialGrid,
    registry: &InfrastructureRegistry,
    config: &SimulationConfig,
    rng: &mut ChaCha8Rng,
) -> Option<Position> {
    let migration = &config.migration;
    if !migration.enabled || !household.may_migrate() {
        return None;
    }
    let potential = town_center_income(household, grid, registry, config);
    if potential <= household.income * (1.0 + migration.income_margin) || household.savings < migration.cost {
        return None;
    }
    if rng.gen::<f64>() <= household.rural_attachment {
        return None;
    }

    let target = household.position.step_toward(&grid.town_center(), migration.step_distance);
    (target != household.position && grid.contains(target)).then_some(target)
}

pub fn update_savings(household: &mut Household, config: &SimulationConfig) {
    let consumption = config.income.consumption_rate * household.income;
    household.savings = (household.savings + household.income - consumption).max(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::InfrastructureConfig;
    use crate::core::types::{HouseholdId, InfrastructureId};
    use crate::infrastructure::InfrastructureItem;
    use crate::town::business::BusinessSize;
    use rand::SeedableRng;

    fn household(sector: Sector, position: Position) -> Household {
        Household {
            id: HouseholdId(0),
            position,
            size: 4,
            sector,
            landless: false,
            income: 0.0,
            savings: 0.0,
            education: 2.0,
            health: 0.5,
            cooperative: false,
            microfinance: false,
            remittance: false,
            off_grid: false,
            flood_affected: false,
            flood_exposure: 0,
            urban: false,
            rural_attachment: 0.5,
            employer: None,
        }
    }

    fn business(id: u32, sector: Sector, position: Position, employees: u32) -> Business {
        Business {
            id: BusinessId(id),
            position,
            sector,
            size: BusinessSize::Small,
            base_productivity: 1.0,
            productivity_multiplier: 1.0,
            revenue: 0.0,
            profit: 0.0,
            employees,
            retained_earnings: 0.0,
            support_fund: 0.0,
        }
    }

    fn setup() -> (SimulationConfig, SpatialGrid, InfrastructureRegistry) {
        let config = SimulationConfig::default();
        let grid = SpatialGrid::new(&config.grid);
        let registry = InfrastructureRegistry::new(config.grid.width, config.grid.height);
        (config, grid, registry)
    }

    #[test]
    fn test_unexposed_household_consumes_no_draw() {
        let (mut config, grid, _) = setup();
        config.rates.flood_risk = 1.0;
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut reference = ChaCha8Rng::seed_from_u64(9);

        let mut hh = household(Sector::Services, Position::new(5, 5));
        hh.flood_affected = true;
        assert!(resolve_shock(&mut hh, &grid, &config, &mut rng).is_none());
        assert!(!hh.flood_affected);
        assert_eq!(rng.gen::<u64>(), reference.gen::<u64>());
    }

    #[test]
    fn test_flood_draws_down_savings() {
        let (mut config, grid, _) = setup();
        config.rates.flood_risk = 1.0;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut hh = household(Sector::Agriculture, Position::new(5, 5));
        hh.savings = 1000.0;

        let lost = resolve_shock(&mut hh, &grid, &config, &mut rng).unwrap();
        assert!((lost - 600.0).abs() < 1e-9);
        assert!((hh.savings - 400.0).abs() < 1e-9);
        assert!(hh.flood_affected);
        assert_eq!(hh.flood_exposure, 1);
    }

    #[test]
    fn test_floodplain_exposes_non_farmers() {
        let (mut config, grid, _) = setup();
        config.rates.flood_risk = 1.0;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut hh = household(Sector::Manufacturing, Position::new(5, 49));
        assert!(resolve_shock(&mut hh, &grid, &config, &mut rng).is_some());
    }

    #[test]
    fn test_income_base_wage() {
        let (config, _, registry) = setup();
        let mut hh = household(Sector::Manufacturing, Position::new(0, 0));
        realize_income(&mut hh, &registry, &config);
        assert_eq!(hh.income, 4000.0);
    }

    #[test]
    fn test_income_urban_and_landless_multipliers() {
        let (config, _, registry) = setup();
        let mut hh = household(Sector::Services, Position::new(25, 25));
        hh.urban = true;
        realize_income(&mut hh, &registry, &config);
        assert!((hh.income - 5000.0 * 1.8).abs() < 1e-9);

        let mut farmer = household(Sector::Agriculture, Position::new(0, 0));
        farmer.landless = true;
        realize_income(&mut farmer, &registry, &config);
        assert!((farmer.income - 2500.0 * 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_flood_penalty_spares_remittance() {
        let (config, _, registry) = setup();
        let mut hh = household(Sector::Agriculture, Position::new(0, 0));
        hh.flood_affected = true;
        hh.remittance = true;
        realize_income(&mut hh, &registry, &config);
        assert!((hh.income - (2500.0 * 0.6 + 2000.0)).abs() < 1e-9);
    }

    #[test]
    fn test_infrastructure_raises_income() {
        let (config, _, mut registry) = setup();
        let item = InfrastructureItem::new(
            InfrastructureId(0),
            InfrastructureType::Road,
            Position::new(3, 3),
            &InfrastructureConfig::default(),
            0,
        );
        registry.register(&item).unwrap();
        let mut hh = household(Sector::Agriculture, Position::new(3, 4));
        realize_income(&mut hh, &registry, &config);
        assert!((hh.income - 2500.0 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_investment_below_threshold_does_nothing() {
        let (config, _, registry) = setup();
        let mut hh = household(Sector::Agriculture, Position::new(0, 0));
        hh.cooperative = true;
        hh.microfinance = true;
        hh.savings = 1000.0;
        invest(&mut hh, &registry, &config);
        assert_eq!(hh.education, 2.0);
        assert_eq!(hh.health, 0.5);
        assert_eq!(hh.savings, 1000.0);
    }

    #[test]
    fn test_investment_converts_savings() {
        let (config, _, registry) = setup();
        let mut hh = household(Sector::Agriculture, Position::new(0, 0));
        hh.cooperative = true;
        hh.savings = 10_000.0;
        invest(&mut hh, &registry, &config);
        // 10% of 10_000 at 2000 per level
        assert!((hh.education - 2.5).abs() < 1e-9);
        assert!((hh.savings - 9000.0).abs() < 1e-9);
        // No clinic and no microfinance
        assert_eq!(hh.health, 0.5);
    }

    #[test]
    fn test_investment_capped_at_maximum() {
        let (config, _, registry) = setup();
        let mut hh = household(Sector::Agriculture, Position::new(0, 0));
        hh.microfinance = true;
        hh.health = 0.99;
        hh.savings = 100_000.0;
        invest(&mut hh, &registry, &config);
        assert_eq!(hh.health, 1.0);
        assert!((hh.savings - (100_000.0 - 0.01 * 2000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_sector_change_takes_nearest_open_slot() {
        let (mut config, mut grid, _) = setup();
        config.transition.switch_probability = 1.0;
        let mut businesses = vec![
            business(0, Sector::Services, Position::new(10, 10), 0),
            business(1, Sector::Manufacturing, Position::new(6, 5), 0),
            business(2, Sector::Manufacturing, Position::new(5, 6), 5),
            business(3, Sector::Agriculture, Position::new(5, 5), 0),
        ];
        for b in &businesses {
            grid.place_at(Occupant::Business(b.id), b.position).unwrap();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut hh = household(Sector::Agriculture, Position::new(5, 5));
        hh.landless = true;
        hh.flood_affected = true;

        let employer = consider_sector_change(&mut hh, &mut businesses, &grid, &config, &mut rng);
        // Business 2 is full and business 3 is a farm
        assert_eq!(employer, Some(BusinessId(1)));
        assert_eq!(hh.sector, Sector::Manufacturing);
        assert_eq!(hh.employer, Some(BusinessId(1)));
        assert_eq!(businesses[1].employees, 1);
    }

    #[test]
    fn test_sector_change_releases_old_employer() {
        let (mut config, mut grid, _) = setup();
        config.transition.switch_probability = 1.0;
        let mut businesses = vec![
            business(0, Sector::Agriculture, Position::new(4, 4), 3),
            business(1, Sector::Services, Position::new(6, 6), 0),
        ];
        for b in &businesses {
            grid.place_at(Occupant::Business(b.id), b.position).unwrap();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut hh = household(Sector::Agriculture, Position::new(5, 5));
        hh.landless = true;
        hh.flood_affected = true;
        hh.employer = Some(BusinessId(0));

        let employer = consider_sector_change(&mut hh, &mut businesses, &grid, &config, &mut rng);
        assert_eq!(employer, Some(BusinessId(1)));
        assert_eq!(hh.employer, Some(BusinessId(1)));
        assert_eq!(businesses[0].employees, 2);
        assert_eq!(businesses[1].employees, 1);
    }

    #[test]
    fn test_sector_change_ties_break_on_lower_id() {
        let (mut config, mut grid, _) = setup();
        config.transition.switch_probability = 1.0;
        let mut businesses = vec![
            business(0, Sector::Services, Position::new(7, 5), 0),
            business(1, Sector::Manufacturing, Position::new(3, 5), 0),
        ];
        for b in &businesses {
            grid.place_at(Occupant::Business(b.id), b.position).unwrap();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut hh = household(Sector::Agriculture, Position::new(5, 5));
        hh.landless = true;
        hh.flood_exposure = 5;

        let employer = consider_sector_change(&mut hh, &mut businesses, &grid, &config, &mut rng);
        assert_eq!(employer, Some(BusinessId(0)));
        assert_eq!(hh.sector, Sector::Services);
    }

    #[test]
    fn test_no_open_slot_means_no_switch() {
        let (mut config, grid, _) = setup();
        config.transition.switch_probability = 1.0;
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut hh = household(Sector::Agriculture, Position::new(5, 5));
        hh.landless = true;
        hh.flood_affected = true;
        assert!(consider_sector_change(&mut hh, &mut [], &grid, &config, &mut rng).is_none());
        assert_eq!(hh.sector, Sector::Agriculture);
    }

    #[test]
    fn test_landed_farmer_never_switches() {
        let (mut config, grid, _) = setup();
        config.transition.switch_probability = 1.0;
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut hh = household(Sector::Agriculture, Position::new(5, 5));
        hh.flood_affected = true;
        assert!(consider_sector_change(&mut hh, &mut [], &grid, &config, &mut rng).is_none());
    }

    #[test]
    fn test_migration_moves_toward_center() {
        let (config, grid, registry) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut hh = household(Sector::Services, Position::new(0, 25));
        hh.rural_attachment = 0.0;
        hh.income = 1000.0;
        hh.savings = 5000.0;

        let target = consider_migration(&hh, &grid, &registry, &config, &mut rng).unwrap();
        assert_eq!(target, Position::new(6, 25));
    }

    #[test]
    fn test_migration_requires_savings_and_margin() {
        let (config, grid, registry) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut hh = household(Sector::Services, Position::new(0, 25));
        hh.rural_attachment = 0.0;
        hh.income = 1000.0;
        hh.savings = 100.0;
        assert!(consider_migration(&hh, &grid, &registry, &config, &mut rng).is_none());

        hh.savings = 5000.0;
        hh.income = 50_000.0;
        assert!(consider_migration(&hh, &grid, &registry, &config, &mut rng).is_none());
    }

    #[test]
    fn test_full_attachment_never_migrates() {
        let (config, grid, registry) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut hh = household(Sector::Services, Position::new(0, 25));
        hh.rural_attachment = 1.0;
        hh.savings = 5000.0;
        for _ in 0..100 {
            assert!(consider_migration(&hh, &grid, &registry, &config, &mut rng).is_none());
        }
    }

    #[test]
    fn test_savings_update() {
        let (config, _, _) = setup();
        let mut hh = household(Sector::Agriculture, Position::new(0, 0));
        hh.income = 1000.0;
        hh.savings = 50.0;
        update_savings(&mut hh, &config);
        assert!((hh.savings - 250.0).abs() < 1e-9);
    }
}
