//! Properties that hold on every step of every run

use proptest::prelude::*;
use town_growth::town::{initialize, run};
use town_growth::SimulationConfig;

fn config(seed: u64, population: u32, businesses: u32, flood_risk: f64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.seed = seed;
    config.population = population;
    config.business_count = businesses;
    config.rates.flood_risk = flood_risk;
    config
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_indicators_stay_in_range(
        seed in any::<u64>(),
        population in 1u32..120,
        businesses in 0u32..20,
        flood_risk in 0.0f64..=1.0,
    ) {
        let mut state = initialize(config(seed, population, businesses, flood_risk)).unwrap();
        for snapshot in run(&mut state, 25) {
            let snapshot = snapshot.unwrap();
            prop_assert!(snapshot.gdp_per_capita >= 0.0);
            prop_assert!((0.0..=1.0).contains(&snapshot.gini));
            prop_assert!((0.0..=1.0).contains(&snapshot.urbanization_rate));
            prop_assert!(snapshot.budget_pool >= 0.0);
        }

        let education_max = state.config.household.education_max;
        let health_max = state.config.household.health_max;
        for hh in &state.world.households {
            prop_assert!((0.0..=education_max).contains(&hh.education));
            prop_assert!((0.0..=health_max).contains(&hh.health));
            prop_assert!(hh.income >= 0.0);
            prop_assert!(hh.savings >= 0.0);
        }
        for report in state.policy.reports() {
            prop_assert!((report.fractions.sum() - 1.0).abs() < 1e-9);
        }
        prop_assert!(state.world.verify_indices().is_ok());
    }

    #[test]
    fn prop_businesses_never_exceed_capacity(seed in any::<u64>(), businesses in 1u32..30) {
        let mut state = initialize(config(seed, 150, businesses, 0.3)).unwrap();
        for snapshot in run(&mut state, 20) {
            snapshot.unwrap();
        }
        for business in &state.world.businesses {
            prop_assert!(business.employees <= business.capacity(&state.config.business));
            prop_assert!(business.retained_earnings >= 0.0);
        }
    }
}

#[test]
fn test_headcount_never_exceeds_residents() {
    let mut state = initialize(SimulationConfig::default()).unwrap();
    let residents: u32 = state.world.households.iter().map(|h| h.size).sum();
    for snapshot in run(&mut state, 120) {
        let snapshot = snapshot.unwrap();
        assert!(
            snapshot.total_employees <= residents,
            "step {}: {} employees for {} residents",
            snapshot.step,
            snapshot.total_employees,
            residents
        );
    }
    assert!(state.world.verify_indices().is_ok());
}
