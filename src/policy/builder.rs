//! Greedy infrastructure siting

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::InfrastructureConfig;
use crate::core::error::Result;
use crate::core::types::{InfrastructureId, InfrastructureType, Position};
use crate::town::events::{EventKind, EventLog};
use crate::town::world::TownWorld;

/// What one Building phase achieved
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub spent: f64,
    pub built: Vec<InfrastructureId>,
    /// The share could not pay for even the cheapest type
    pub skipped: bool,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    kind: InfrastructureType,
    site: Position,
    newly_covered: u32,
    score: f64,
}

fn cheapest_cost(config: &InfrastructureConfig) -> f64 {
    config.costs.iter().map(|(_, cost)| *cost).fold(f64::INFINITY, f64::min)
}

/// Spend up to `budget` on the sites that cover the most unserved households
/// per unit cost, one item at a time.
pub fn build_greedy(
    world: &mut TownWorld,
    budget: f64,
    config: &InfrastructureConfig,
    events: &mut EventLog,
) -> Result<BuildOutcome> {
    let step = world.step;
    let cheapest = cheapest_cost(config);
    if budget < cheapest {
        tracing::debug!(budget, cheapest, "Building skipped");
        events.add_event(
            EventKind::BuildingSkipped {
                available: budget,
                cheapest,
            },
            step,
        );
        return Ok(BuildOutcome {
            skipped: true,
            ..BuildOutcome::default()
        });
    }

    let mut outcome = BuildOutcome::default();
    let mut remaining = budget;
    while let Some(pick) = best_candidate(world, remaining, config) {
        let cost = *config.costs.get(pick.kind);
        let id = world.build(pick.kind, pick.site, config)?;
        remaining -= cost;
        outcome.spent += cost;
        outcome.built.push(id);

        tracing::debug!(
            kind = pick.kind.label(),
            site = %pick.site,
            newly_covered = pick.newly_covered,
            cost,
            "Infrastructure built"
        );
        events.add_event(
            EventKind::InfrastructureBuilt {
                infrastructure: id,
                kind: pick.kind,
                position: pick.site,
                newly_covered: pick.newly_covered,
            },
            step,
        );
    }
    Ok(outcome)
}

/// Best affordable (type, site) pair, or `None` when nothing adds coverage.
///
/// Candidate sites are the cells of currently unserved households. Ties keep
/// the earlier type in `build_priority`, then the earlier cell in row-major order.
fn best_candidate(world: &TownWorld, remaining: f64, config: &InfrastructureConfig) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for &kind in &config.build_priority {
        let cost = *config.costs.get(kind);
        if cost > remaining {
            continue;
        }
        let radius = *config.radii.get(kind);
        let uncovered: Vec<Position> = world
            .household_positions()
            .filter(|pos| !world.registry.is_covered(*pos, kind))
            .collect();

        let mut sites = uncovered.clone();
        sites.sort_by_key(|p| (p.y, p.x));
        sites.dedup();

        for site in sites {
            if world.registry.items_at(site) >= config.max_items_per_cell as usize {
                continue;
            }
            let newly_covered = uncovered.iter().filter(|p| p.distance(&site) <= radius).count() as u32;
            if newly_covered == 0 {
                continue;
            }
            let score = f64::from(newly_covered) / cost.max(f64::MIN_POSITIVE);
            if best.map_or(true, |b| score > b.score) {
                best = Some(Candidate {
                    kind,
                    site,
                    newly_covered,
                    score,
                });
            }
        }
    }
    best
}

/// Starting stock: one item of every type near the town center plus a few
/// scattered roads. Paid for outside the budget.
pub fn found_settlement(
    world: &mut TownWorld,
    config: &InfrastructureConfig,
    rng: &mut ChaCha8Rng,
    events: &mut EventLog,
) -> Result<Vec<InfrastructureId>> {
    const SPREAD: i32 = 3;
    let center = world.grid.town_center();
    let max_x = world.grid.width() as i32 - 1;
    let max_y = world.grid.height() as i32 - 1;
    let mut built = Vec::new();

    let mut place = |world: &mut TownWorld, kind: InfrastructureType, site: Position| -> Result<()> {
        let id = world.build(kind, site, config)?;
        events.add_event(
            EventKind::InfrastructureBuilt {
                infrastructure: id,
                kind,
                position: site,
                newly_covered: 0,
            },
            world.step,
        );
        built.push(id);
        Ok(())
    };

    for kind in InfrastructureType::ALL {
        let x = (center.x + rng.gen_range(-SPREAD..=SPREAD)).clamp(0, max_x);
        let y = (center.y + rng.gen_range(-SPREAD..=SPREAD)).clamp(0, max_y);
        place(world, kind, Position::new(x, y))?;
    }
    for _ in 0..config.initial_roads {
        let site = Position::new(rng.gen_range(0..=max_x), rng.gen_range(0..=max_y));
        place(world, InfrastructureType::Road, site)?;
    }

    tracing::debug!(items = built.len(), "Founding infrastructure placed");
    Ok(built)
}
