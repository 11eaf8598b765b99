//! Municipal policy: needs assessment, budget allocation, building and programs
//!
//! A cycle runs every `policy.interval` steps and walks the phases
//! Idle -> Assessing -> Allocating -> Building -> Idle. Money not spent in a
//! cycle stays in the pool for the next one.

pub mod allocation;
pub mod builder;
pub mod needs;
pub mod programs;

pub use allocation::{allocate, fallback_fractions};
pub use builder::{build_greedy, found_settlement, BuildOutcome};
pub use needs::{CoverageGapNeeds, NeedsAssessment};
pub use programs::{apply_programs, ProgramOutcome};

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::{PolicyConfig, SimulationConfig};
use crate::core::error::Result;
use crate::core::types::{CategoryTable, InfrastructureId, PolicyCategory, Step};
use crate::town::events::{EventKind, EventLog};
use crate::town::systems::MetricsSnapshot;
use crate::town::world::TownWorld;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyPhase {
    Idle,
    Assessing,
    Allocating,
    Building,
}

/// Everything one policy cycle decided and spent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub step: Step,
    pub budget_added: f64,
    pub pool_before: f64,
    pub needs: CategoryTable<f64>,
    pub fractions: CategoryTable<f64>,
    /// Allocation failed and the default fractions were used
    pub recovered: bool,
    pub shares: CategoryTable<f64>,
    pub built: Vec<InfrastructureId>,
    pub building_skipped: bool,
    pub spent: CategoryTable<f64>,
    pub beneficiaries: CategoryTable<u32>,
    pub pool_after: f64,
}

impl PolicyReport {
    pub fn total_spent(&self) -> f64 {
        self.spent.sum()
    }
}

#[derive(Debug)]
pub struct PolicyEngine {
    phase: PolicyPhase,
    pool: f64,
    fractions: CategoryTable<f64>,
    needs: Box<dyn NeedsAssessment>,
    reports: Vec<PolicyReport>,
}

impl PolicyEngine {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            phase: PolicyPhase::Idle,
            pool: 0.0,
            fractions: fallback_fractions(config),
            needs: Box::new(CoverageGapNeeds),
            reports: Vec::new(),
        }
    }

    /// Replace the needs assessment strategy
    pub fn with_needs(mut self, needs: Box<dyn NeedsAssessment>) -> Self {
        self.needs = needs;
        self
    }

    pub fn phase(&self) -> PolicyPhase {
        self.phase
    }

    /// Unspent money carried between cycles
    pub fn pool(&self) -> f64 {
        self.pool
    }

    /// Fractions chosen by the most recent cycle
    pub fn fractions(&self) -> &CategoryTable<f64> {
        &self.fractions
    }

    pub fn reports(&self) -> &[PolicyReport] {
        &self.reports
    }

    /// Whether a cycle is due at `step`
    pub fn is_due(step: Step, config: &PolicyConfig) -> bool {
        config.interval > 0 && step > 0 && step % config.interval == 0
    }

    /// Place the initial infrastructure stock outside the budget
    pub fn found_settlement(
        &self,
        world: &mut TownWorld,
        config: &SimulationConfig,
        rng: &mut ChaCha8Rng,
        events: &mut EventLog,
    ) -> Result<Vec<InfrastructureId>> {
        found_settlement(world, &config.infrastructure, rng, events)
    }

    /// Run one full cycle against the latest snapshot
    pub fn run_cycle(
        &mut self,
        world: &mut TownWorld,
        latest: &MetricsSnapshot,
        config: &SimulationConfig,
        rng: &mut ChaCha8Rng,
        events: &mut EventLog,
    ) -> Result<PolicyReport> {
        let step = world.step;
        let policy = &config.policy;

        world.decay_infrastructure(config.infrastructure.quality_decay, config.infrastructure.min_quality)?;
        let pool_before = self.pool;
        self.pool += policy.budget;
        let available = self.pool;

        self.phase = PolicyPhase::Assessing;
        let needs = self.needs.assess(latest, config);

        self.phase = PolicyPhase::Allocating;
        let (fractions, recovered) = match allocate(&needs, policy) {
            Ok(fractions) => (fractions, false),
            Err(e) => {
                tracing::warn!(step, error = %e, "Allocation failed, using default fractions");
                events.add_event(EventKind::AllocationRecovered { reason: e.to_string() }, step);
                (fallback_fractions(policy), true)
            }
        };
        self.fractions = fractions;

        let mut shares = CategoryTable::default();
        for category in PolicyCategory::ALL {
            *shares.get_mut(category) = available * fractions.get(category);
        }

        self.phase = PolicyPhase::Building;
        let build = build_greedy(world, shares.infrastructure, &config.infrastructure, events)?;
        let mut outcome = apply_programs(world, &shares, config, rng, events);
        outcome.spent.infrastructure = build.spent;
        outcome.beneficiaries.infrastructure = build.built.len() as u32;

        let spent = outcome.spent.sum();
        self.pool = (available - spent).max(0.0);
        self.phase = PolicyPhase::Idle;

        tracing::info!(
            step,
            available,
            spent,
            built = build.built.len(),
            pool = self.pool,
            "Policy cycle complete"
        );
        events.add_event(
            EventKind::PolicyCycle {
                pool: self.pool,
                fractions,
            },
            step,
        );

        let report = PolicyReport {
            step,
            budget_added: policy.budget,
            pool_before,
            needs,
            fractions,
            recovered,
            shares,
            built: build.built,
            building_skipped: build.skipped,
            spent: outcome.spent,
            beneficiaries: outcome.beneficiaries,
            pool_after: self.pool,
        };
        self.reports.push(report.clone());
        Ok(report)
    }
}
