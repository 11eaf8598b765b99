//! Initial settlement generation

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{BusinessId, HouseholdId, Position, Sector, SectorTable};
use crate::town::business::{Business, BusinessSize};
use crate::town::household::Household;
use crate::town::world::TownWorld;

/// Create the initial households and businesses
pub fn populate(world: &mut TownWorld, config: &SimulationConfig, rng: &mut ChaCha8Rng) -> Result<()> {
    let (urban_cells, rural_cells) = partition_cells(world);

    for _ in 0..config.population {
        let id = world.next_household_id();
        let urban = rng.gen_bool(config.household.initial_urban_fraction);
        let position = pick_cell(&urban_cells, &rural_cells, urban, rng)?;
        let household = generate_household(id, position, config, rng);
        world.add_household(household)?;
    }

    for _ in 0..config.business_count {
        let id = world.next_business_id();
        let sector = choose_sector(&config.business.sector_distribution, rng);
        // Farms sit out in the fields, workshops and shops in town
        let position = pick_cell(&urban_cells, &rural_cells, sector.is_urban_trade(), rng)?;
        let business = generate_business(id, position, sector, config, rng);
        world.add_business(business)?;
    }

    tracing::debug!(
        households = world.households.len(),
        businesses = world.businesses.len(),
        urban_cells = urban_cells.len(),
        "Settlement populated"
    );
    Ok(())
}

fn partition_cells(world: &TownWorld) -> (Vec<Position>, Vec<Position>) {
    let mut urban = Vec::new();
    let mut rural = Vec::new();
    for y in 0..world.grid.height() as i32 {
        for x in 0..world.grid.width() as i32 {
            let pos = Position::new(x, y);
            if world.grid.is_urban(pos) {
                urban.push(pos);
            } else {
                rural.push(pos);
            }
        }
    }
    (urban, rural)
}

/// Uniform cell from the preferred region, falling back to the other one
fn pick_cell(
    urban_cells: &[Position],
    rural_cells: &[Position],
    urban: bool,
    rng: &mut ChaCha8Rng,
) -> Result<Position> {
    let (preferred, fallback) = if urban {
        (urban_cells, rural_cells)
    } else {
        (rural_cells, urban_cells)
    };
    let cells = if preferred.is_empty() { fallback } else { preferred };
    cells
        .choose(rng)
        .copied()
        .ok_or_else(|| SimError::Configuration("grid has no cells to place agents on".into()))
}

fn choose_sector(distribution: &SectorTable<f64>, rng: &mut ChaCha8Rng) -> Sector {
    let roll: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (sector, share) in distribution.iter() {
        cumulative += share;
        if roll < cumulative {
            return sector;
        }
    }
    // Rounding left a sliver above the last cumulative share
    Sector::ALL
        .into_iter()
        .rev()
        .find(|s| *distribution.get(*s) > 0.0)
        .unwrap_or(Sector::Agriculture)
}

fn choose_size(distribution: &[f64; 3], rng: &mut ChaCha8Rng) -> BusinessSize {
    let roll: f64 = rng.gen();
    let mut cumulative = 0.0;
    for size in BusinessSize::ALL {
        cumulative += distribution[size.index()];
        if roll < cumulative {
            return size;
        }
    }
    BusinessSize::ALL
        .into_iter()
        .rev()
        .find(|s| distribution[s.index()] > 0.0)
        .unwrap_or(BusinessSize::Small)
}

fn generate_household(
    id: HouseholdId,
    position: Position,
    config: &SimulationConfig,
    rng: &mut ChaCha8Rng,
) -> Household {
    let hh = &config.household;
    let rates = &config.rates;

    let size = rng.gen_range(hh.size_min..=hh.size_max);
    let sector = choose_sector(&hh.sector_distribution, rng);
    let landless = rng.gen_bool(rates.landless_rate);

    let mut income = *config.wages.get(sector);
    if landless && sector == Sector::Agriculture {
        income *= config.income.landless_agriculture_multiplier;
    }
    let savings = rng.gen_range(0.0..=2.0 * income);

    let education = rng.gen_range(0.0..=hh.initial_education_max.min(hh.education_max));
    let health = rng.gen_range(hh.initial_health_min..=1.0) * hh.health_max;

    Household {
        id,
        position,
        size,
        sector,
        landless,
        income,
        savings,
        education,
        health,
        cooperative: rng.gen_bool(rates.cooperative_rate),
        microfinance: rng.gen_bool(rates.microfinance_rate),
        remittance: rng.gen_bool(rates.remittance_rate),
        off_grid: rng.gen_bool(rates.off_grid_rate),
        flood_affected: false,
        flood_exposure: 0,
        // Set by TownWorld::add_household
        urban: false,
        rural_attachment: rng.gen_range(hh.rural_attachment_min..=hh.rural_attachment_max),
        employer: None,
    }
}

fn generate_business(
    id: BusinessId,
    position: Position,
    sector: Sector,
    config: &SimulationConfig,
    rng: &mut ChaCha8Rng,
) -> Business {
    let biz = &config.business;
    let size = choose_size(&biz.size_distribution, rng);
    let capacity = biz.size_capacity[size.index()];
    let employees = rng.gen_range(1..=(capacity / 2).max(1));

    Business {
        id,
        position,
        sector,
        size,
        base_productivity: rng.gen_range(biz.productivity_min..=biz.productivity_max),
        productivity_multiplier: 1.0,
        revenue: 0.0,
        profit: 0.0,
        employees,
        retained_earnings: 0.0,
        support_fund: 0.0,
    }
}
