//! Population-level indicators

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{InfraTable, InfrastructureType, Sector, SectorTable, Step};
use crate::town::world::TownWorld;

/// Immutable record of aggregate indicators at the end of a step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub step: Step,
    pub population: u32,
    /// Mean household income
    pub gdp_per_capita: f64,
    pub gini: f64,
    pub urbanization_rate: f64,
    /// Share of households covered, per infrastructure type
    pub coverage: InfraTable<f64>,
    /// Share of households working in each sector
    pub sector_shares: SectorTable<f64>,
    pub average_education: f64,
    pub average_health: f64,
    pub poverty_rate: f64,
    /// Share of households reaching at least two of road, market and utility
    pub service_access_rate: f64,
    pub business_count: u32,
    pub total_business_revenue: f64,
    pub total_employees: u32,
    pub flood_affected: u32,
    pub infrastructure_count: u32,
    pub budget_pool: f64,
}

impl MetricsSnapshot {
    /// Average of the five per-type coverage rates
    pub fn mean_coverage(&self) -> f64 {
        let rates: Vec<f64> = self.coverage.iter().map(|(_, r)| *r).collect();
        rates.iter().sum::<f64>() / rates.len() as f64
    }
}

/// Gini coefficient of `incomes`, clamped into [0, 1].
///
/// Zero for fewer than two households or when nobody earns anything.
pub fn gini_coefficient(incomes: &[f64]) -> f64 {
    let n = incomes.len();
    if n <= 1 {
        return 0.0;
    }
    let total: f64 = incomes.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return 0.0;
    }

    let mut sorted = incomes.to_vec();
    sorted.sort_by(f64::total_cmp);
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i + 1) as f64 * x)
        .sum();
    let n = n as f64;
    let gini = 2.0 * weighted / (n * total) - (n + 1.0) / n;
    gini.clamp(0.0, 1.0)
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Compute the snapshot for the current state of `world`
pub fn compute_metrics(world: &TownWorld, config: &SimulationConfig, budget_pool: f64) -> MetricsSnapshot {
    let households = &world.households;
    let n = households.len();
    let registry = &world.registry;

    let incomes: Vec<f64> = households.iter().map(|h| h.income).collect();
    let total_income: f64 = incomes.iter().sum();
    let gdp_per_capita = if n == 0 { 0.0 } else { (total_income / n as f64).max(0.0) };

    let mut coverage = InfraTable::splat(0.0);
    for kind in InfrastructureType::ALL {
        *coverage.get_mut(kind) = registry.coverage_rate(kind, world.household_positions());
    }

    let mut sector_shares = SectorTable::new(0.0, 0.0, 0.0);
    for sector in Sector::ALL {
        *sector_shares.get_mut(sector) = share(households.iter().filter(|h| h.sector == sector).count(), n);
    }

    let mean = |f: fn(&crate::town::household::Household) -> f64| {
        if n == 0 {
            0.0
        } else {
            households.iter().map(f).sum::<f64>() / n as f64
        }
    };

    let service_access = households
        .iter()
        .filter(|h| {
            let reached = [InfrastructureType::Road, InfrastructureType::Market, InfrastructureType::Utility]
                .into_iter()
                .filter(|kind| registry.is_covered(h.position, *kind))
                .count();
            reached >= 2
        })
        .count();

    MetricsSnapshot {
        step: world.step,
        population: n as u32,
        gdp_per_capita,
        gini: gini_coefficient(&incomes),
        urbanization_rate: share(households.iter().filter(|h| h.urban).count(), n),
        coverage,
        sector_shares,
        average_education: mean(|h| h.education),
        average_health: mean(|h| h.health),
        poverty_rate: share(
            households.iter().filter(|h| h.is_poor(config.income.poverty_line)).count(),
            n,
        ),
        service_access_rate: share(service_access, n),
        business_count: world.businesses.len() as u32,
        total_business_revenue: world.businesses.iter().map(|b| b.revenue).sum(),
        total_employees: world.businesses.iter().map(|b| b.employees).sum(),
        flood_affected: households.iter().filter(|h| h.flood_affected).count() as u32,
        infrastructure_count: world.infrastructure.len() as u32,
        budget_pool,
    }
}
