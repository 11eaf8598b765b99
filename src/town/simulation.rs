//! Step orchestration: initialization, the per-step protocol and runs

use std::iter::FusedIterator;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::policy::PolicyEngine;
use crate::town::events::EventLog;
use crate::town::export::{StepRecord, VisualFrame};
use crate::town::output::SimulationOutput;
use crate::town::systems::{self, MetricsSnapshot};
use crate::town::world::TownWorld;

/// Everything a run carries between steps
#[derive(Debug)]
pub struct EngineState {
    pub config: SimulationConfig,
    pub world: TownWorld,
    pub policy: PolicyEngine,
    pub events: EventLog,
    /// One snapshot per completed step, starting with step 0
    pub history: Vec<MetricsSnapshot>,
    latest: MetricsSnapshot,
    rng: ChaCha8Rng,
}

impl EngineState {
    /// Snapshot of the most recently completed step
    pub fn latest(&self) -> &MetricsSnapshot {
        &self.latest
    }

    pub fn step_record(&self) -> StepRecord {
        StepRecord::capture(&self.world, &self.latest)
    }

    pub fn visual_frame(&self) -> VisualFrame {
        VisualFrame::capture(&self.world)
    }
}

/// Validate `config`, generate the settlement and compute the step-0 snapshot
pub fn initialize(config: SimulationConfig) -> Result<EngineState> {
    config.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut world = TownWorld::new(&config.grid);
    let mut events = EventLog::new();
    let policy = PolicyEngine::new(&config.policy);

    systems::populate(&mut world, &config, &mut rng)?;
    if config.infrastructure.founding_endowment {
        policy.found_settlement(&mut world, &config, &mut rng, &mut events)?;
    }

    let latest = systems::compute_metrics(&world, &config, policy.pool());
    world.verify_indices()?;

    tracing::info!(
        seed = config.seed,
        households = world.households.len(),
        businesses = world.businesses.len(),
        infrastructure = world.infrastructure.len(),
        "Town initialized"
    );

    Ok(EngineState {
        history: vec![latest.clone()],
        config,
        world,
        policy,
        events,
        latest,
        rng,
    })
}

/// Advance one step: households, businesses, policy when due, then metrics
pub fn step(state: &mut EngineState) -> Result<MetricsSnapshot> {
    let EngineState {
        config,
        world,
        policy,
        events,
        history,
        latest,
        rng,
    } = state;

    world.step += 1;
    systems::update_households(world, config, rng, events)?;
    systems::update_businesses(world, config, events);

    if PolicyEngine::is_due(world.step, &config.policy) {
        policy.run_cycle(world, latest, config, rng, events)?;
    }

    let snapshot = systems::compute_metrics(world, config, policy.pool());
    if config.verify_indices {
        world.verify_indices()?;
    }

    tracing::debug!(
        step = snapshot.step,
        gdp_per_capita = snapshot.gdp_per_capita,
        gini = snapshot.gini,
        urbanization = snapshot.urbanization_rate,
        "Step complete"
    );

    *latest = snapshot.clone();
    history.push(snapshot.clone());
    Ok(snapshot)
}

/// Lazy run of up to `remaining` steps; fused after the first error
#[derive(Debug)]
pub struct SimulationRun<'a> {
    state: &'a mut EngineState,
    remaining: u64,
    failed: bool,
}

impl Iterator for SimulationRun<'_> {
    type Item = Result<MetricsSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let result = step(self.state);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, usize::try_from(self.remaining).ok())
        }
    }
}

impl FusedIterator for SimulationRun<'_> {}

pub fn run(state: &mut EngineState, steps: u64) -> SimulationRun<'_> {
    SimulationRun {
        state,
        remaining: steps,
        failed: false,
    }
}

/// Initialize, run `steps` steps and bundle the results
pub fn simulate(config: SimulationConfig, steps: u64) -> Result<SimulationOutput> {
    let start = std::time::Instant::now();

    let mut state = initialize(config)?;
    for snapshot in run(&mut state, steps) {
        snapshot?;
    }

    let elapsed = start.elapsed();
    tracing::info!(steps, elapsed_ms = elapsed.as_millis() as u64, "Simulation finished");
    Ok(SimulationOutput::new(state, steps, elapsed))
}
