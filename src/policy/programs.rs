//! Non-infrastructure programs: schooling, health care, business support
//! and direct transfers. Each spends from its own share and stops when the
//! next beneficiary can no longer be paid for.

use ordered_float::OrderedFloat;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{CategoryTable, Sector, Step};
use crate::town::events::{EventKind, EventLog};
use crate::town::world::{release_worker, TownWorld};

/// Health programs serve households below this share of maximum health
const HEALTH_PROGRAM_CUTOFF: f64 = 0.8;
/// Health gained per treated household, as a share of maximum health
const HEALTH_PROGRAM_GAIN: f64 = 0.15;
/// Share of the economic budget given out as business grants; the rest trains farmers
const BUSINESS_GRANT_SHARE: f64 = 0.6;
/// Minimum education for skills training
const TRAINING_MIN_EDUCATION: f64 = 5.0;
/// Share of the direct budget given out as grants; the rest is lent
const DIRECT_GRANT_SHARE: f64 = 0.4;
/// Savings band of households eligible for microfinance loans
const LOAN_SAVINGS_MIN: f64 = 500.0;
const LOAN_SAVINGS_MAX: f64 = 3000.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramOutcome {
    pub spent: CategoryTable<f64>,
    pub beneficiaries: CategoryTable<u32>,
}

/// Apply every program with its share of this cycle's budget
pub fn apply_programs(
    world: &mut TownWorld,
    shares: &CategoryTable<f64>,
    config: &SimulationConfig,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> ProgramOutcome {
    let mut outcome = ProgramOutcome::default();

    let (spent, served) = education_program(world, shares.education, config);
    outcome.spent.education = spent;
    outcome.beneficiaries.education = served;

    let (spent, served) = health_program(world, shares.health, config);
    outcome.spent.health = spent;
    outcome.beneficiaries.health = served;

    let (spent, served) = economic_program(world, shares.economic, config, rng, events);
    outcome.spent.economic = spent;
    outcome.beneficiaries.economic = served;

    let (spent, served) = direct_transfers(world, shares.direct, config);
    outcome.spent.direct = spent;
    outcome.beneficiaries.direct = served;

    outcome
}

/// One extra level for the least educated households first
fn education_program(world: &mut TownWorld, budget: f64, config: &SimulationConfig) -> (f64, u32) {
    let cost = config.policy.programs.education_cost;
    let max = config.household.education_max;
    let households = &mut world.households;

    let mut order: Vec<usize> = (0..households.len()).filter(|&i| households[i].education < max).collect();
    order.sort_by_key(|&i| (OrderedFloat(households[i].education), households[i].id));

    let mut spent = 0.0;
    let mut served = 0;
    for i in order {
        if spent + cost > budget {
            break;
        }
        let hh = &mut households[i];
        hh.education = (hh.education + 1.0).min(max);
        spent += cost;
        served += 1;
    }
    (spent, served)
}

/// Treatment for the least healthy households first
fn health_program(world: &mut TownWorld, budget: f64, config: &SimulationConfig) -> (f64, u32) {
    let cost = config.policy.programs.health_cost;
    let max = config.household.health_max;
    let households = &mut world.households;

    let mut order: Vec<usize> = (0..households.len())
        .filter(|&i| households[i].health < HEALTH_PROGRAM_CUTOFF * max)
        .collect();
    order.sort_by_key(|&i| (OrderedFloat(households[i].health), households[i].id));

    let mut spent = 0.0;
    let mut served = 0;
    for i in order {
        if spent + cost > budget {
            break;
        }
        let hh = &mut households[i];
        hh.health = (hh.health + HEALTH_PROGRAM_GAIN * max).min(max);
        spent += cost;
        served += 1;
    }
    (spent, served)
}

/// Grants to the smallest, weakest businesses and skills training for farmers
fn economic_program(
    world: &mut TownWorld,
    budget: f64,
    config: &SimulationConfig,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> (f64, u32) {
    let programs = &config.policy.programs;
    let step: Step = world.step;
    let grant_budget = budget * BUSINESS_GRANT_SHARE;
    let training_budget = budget - grant_budget;

    let businesses = &mut world.businesses;
    let mut order: Vec<usize> = (0..businesses.len()).collect();
    order.sort_by_key(|&i| (businesses[i].size, OrderedFloat(businesses[i].revenue), businesses[i].id));

    let mut granted = 0.0;
    let mut served = 0;
    for i in order {
        if granted + programs.business_grant > grant_budget {
            break;
        }
        businesses[i].support_fund += programs.business_grant;
        granted += programs.business_grant;
        served += 1;
    }

    let mut trained = 0.0;
    for hh in world
        .households
        .iter_mut()
        .filter(|h| h.sector == Sector::Agriculture && h.education >= TRAINING_MIN_EDUCATION)
    {
        if trained + programs.training_cost > training_budget {
            break;
        }
        trained += programs.training_cost;
        served += 1;

        if rng.gen_bool(programs.training_success) {
            let to = if rng.gen_bool(0.5) {
                Sector::Manufacturing
            } else {
                Sector::Services
            };
            let from = hh.sector;
            hh.sector = to;
            release_worker(businesses, hh);
            tracing::debug!(household = hh.id.0, to = to.label(), "Training moved household out of agriculture");
            events.add_event(
                EventKind::SectorChanged {
                    household: hh.id,
                    from,
                    to,
                    employer: None,
                },
                step,
            );
        }
    }

    (granted + trained, served)
}

/// Cash grants for the poorest, then microfinance loans for modest savers
fn direct_transfers(world: &mut TownWorld, budget: f64, config: &SimulationConfig) -> (f64, u32) {
    let programs = &config.policy.programs;
    let poverty_line = config.income.poverty_line;
    let grant_budget = budget * DIRECT_GRANT_SHARE;
    let loan_budget = budget - grant_budget;
    let households = &mut world.households;

    let mut poor: Vec<usize> = (0..households.len())
        .filter(|&i| households[i].is_poor(poverty_line))
        .collect();
    poor.sort_by_key(|&i| (OrderedFloat(households[i].income), households[i].id));

    let mut granted = 0.0;
    let mut served = 0;
    for i in poor {
        if granted + programs.direct_grant > grant_budget {
            break;
        }
        households[i].savings += programs.direct_grant;
        granted += programs.direct_grant;
        served += 1;
    }

    let mut lent = 0.0;
    for hh in households
        .iter_mut()
        .filter(|h| (LOAN_SAVINGS_MIN..=LOAN_SAVINGS_MAX).contains(&h.savings))
    {
        if lent + programs.microfinance_loan > loan_budget {
            break;
        }
        hh.savings += programs.microfinance_loan;
        hh.microfinance = true;
        lent += programs.microfinance_loan;
        served += 1;
    }

    (granted + lent, served)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BusinessId, HouseholdId, Position};
    use crate::town::business::{Business, BusinessSize};
    use crate::town::household::Household;
    use rand::SeedableRng;

    fn household(id: u32) -> Household {
        Household {
            id: HouseholdId(id),
            position: Position::new(id as i32, 0),
            size: 4,
            sector: Sector::Agriculture,
            landless: false,
            income: 3000.0,
            savings: 0.0,
            education: 3.0,
            health: 0.9,
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

    fn world(households: Vec<Household>) -> TownWorld {
        let config = SimulationConfig::default();
        let mut world = TownWorld::new(&config.grid);
        for hh in households {
            world.next_household_id();
            world.add_household(hh).unwrap();
        }
        world
    }

    #[test]
    fn test_education_lowest_first() {
        let config = SimulationConfig::default();
        let mut hhs = vec![household(0), household(1), household(2)];
        hhs[0].education = 4.0;
        hhs[1].education = 1.0;
        hhs[2].education = 10.0;
        let mut w = world(hhs);

        let (spent, served) = education_program(&mut w, 300.0, &config);
        assert_eq!((spent, served), (300.0, 1));
        assert_eq!(w.households[1].education, 2.0);
        assert_eq!(w.households[0].education, 4.0);
    }

    #[test]
    fn test_education_never_exceeds_max() {
        let config = SimulationConfig::default();
        let mut hhs = vec![household(0)];
        hhs[0].education = 9.5;
        let mut w = world(hhs);
        education_program(&mut w, 10_000.0, &config);
        assert_eq!(w.households[0].education, 10.0);
    }

    #[test]
    fn test_health_targets_sick_households() {
        let config = SimulationConfig::default();
        let mut hhs = vec![household(0), household(1)];
        hhs[0].health = 0.5;
        let mut w = world(hhs);
        let (spent, served) = health_program(&mut w, 10_000.0, &config);
        assert_eq!((spent, served), (250.0, 1));
        assert!((w.households[0].health - 0.65).abs() < 1e-12);
        assert_eq!(w.households[1].health, 0.9);
    }

    #[test]
    fn test_grants_go_to_smallest_businesses() {
        let config = SimulationConfig::default();
        let mut w = world(Vec::new());
        for (i, size) in [BusinessSize::Large, BusinessSize::Small, BusinessSize::Medium].into_iter().enumerate() {
            let id = w.next_business_id();
            w.add_business(Business {
                id,
                position: Position::new(i as i32, 0),
                sector: Sector::Services,
                size,
                base_productivity: 1.0,
                productivity_multiplier: 1.0,
                revenue: 0.0,
                profit: 0.0,
                employees: 1,
                retained_earnings: 0.0,
                support_fund: 0.0,
            })
            .unwrap();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = EventLog::new();
        // 60% of 20_000 pays for two 5_000 grants
        let (spent, served) = economic_program(&mut w, 20_000.0, &config, &mut rng, &mut events);
        assert_eq!((spent, served), (10_000.0, 2));
        assert_eq!(w.business(BusinessId(1)).unwrap().support_fund, 5000.0);
        assert_eq!(w.business(BusinessId(2)).unwrap().support_fund, 5000.0);
        assert_eq!(w.business(BusinessId(0)).unwrap().support_fund, 0.0);
    }

    #[test]
    fn test_certain_training_moves_farmers() {
        let mut config = SimulationConfig::default();
        config.policy.programs.training_success = 1.0;
        let mut hhs = vec![household(0), household(1)];
        hhs[0].education = 6.0;
        let mut w = world(hhs);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = EventLog::new();
        let (spent, served) = economic_program(&mut w, 5_000.0, &config, &mut rng, &mut events);
        assert_eq!((spent, served), (500.0, 1));
        assert!(w.households[0].sector.is_urban_trade());
        assert_eq!(w.households[1].sector, Sector::Agriculture);
        assert_eq!(events.count(|k| matches!(k, EventKind::SectorChanged { .. })), 1);
    }

    #[test]
    fn test_training_frees_farm_job() {
        let mut config = SimulationConfig::default();
        config.policy.programs.training_success = 1.0;
        let mut hhs = vec![household(0)];
        hhs[0].education = 6.0;
        hhs[0].employer = Some(BusinessId(0));
        let mut w = world(hhs);
        let id = w.next_business_id();
        w.add_business(Business {
            id,
            position: Position::new(5, 5),
            sector: Sector::Agriculture,
            size: BusinessSize::Small,
            base_productivity: 1.0,
            productivity_multiplier: 1.0,
            revenue: 0.0,
            profit: 0.0,
            employees: 3,
            retained_earnings: 0.0,
            support_fund: 0.0,
        })
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = EventLog::new();
        economic_program(&mut w, 5_000.0, &config, &mut rng, &mut events);
        assert!(w.households[0].sector.is_urban_trade());
        assert_eq!(w.households[0].employer, None);
        assert_eq!(w.businesses[0].employees, 2);
        assert!(w.verify_indices().is_ok());
    }

    #[test]
    fn test_direct_grants_then_loans() {
        let config = SimulationConfig::default();
        let mut hhs = vec![household(0), household(1), household(2)];
        hhs[0].income = 1500.0;
        hhs[1].income = 500.0;
        hhs[2].savings = 800.0;
        let mut w = world(hhs);

        // 40% of 5_000 = 2_000 pays two grants; 3_000 pays one loan
        let (spent, served) = direct_transfers(&mut w, 5_000.0, &config);
        assert_eq!((spent, served), (4_000.0, 3));
        assert_eq!(w.households[1].savings, 1000.0);
        // Grants lift both poor households into the loan band, and the loan
        // budget covers only the first of them by id
        assert!(w.households[0].microfinance);
        assert_eq!(w.households[0].savings, 3000.0);
        assert!(!w.households[1].microfinance);
        assert_eq!(w.households[2].savings, 800.0);
    }
}
