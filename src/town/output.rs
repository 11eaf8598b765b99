//! Simulation output and serialization

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::PolicyReport;
use crate::town::events::{EventKind, EventLog};
use crate::town::export::StepRecord;
use crate::town::simulation::EngineState;
use crate::town::systems::MetricsSnapshot;

/// Complete simulation output
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub snapshots: Vec<MetricsSnapshot>,
    pub final_state: StepRecord,
    pub policy_reports: Vec<PolicyReport>,
    pub events: EventLog,
    pub statistics: SimulationStats,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationStats {
    pub steps_simulated: u64,
    pub simulation_time_ms: u64,
    pub total_events: u32,
    pub floods: u32,
    pub sector_changes: u32,
    pub migrations: u32,
    pub hires: u32,
    pub infrastructure_built: u32,
    pub initial_gdp_per_capita: f64,
    pub final_gdp_per_capita: f64,
    pub final_gini: f64,
    pub final_urbanization_rate: f64,
}

impl SimulationOutput {
    pub fn new(state: EngineState, steps: u64, elapsed: Duration) -> Self {
        let final_state = state.step_record();
        let events = state.events;
        let count = |pred: fn(&EventKind) -> bool| events.count(pred) as u32;

        let initial = state.history.first();
        let last = state.history.last();
        let statistics = SimulationStats {
            steps_simulated: steps,
            simulation_time_ms: elapsed.as_millis() as u64,
            total_events: events.len() as u32,
            floods: count(|k| matches!(k, EventKind::FloodShock { .. })),
            sector_changes: count(|k| matches!(k, EventKind::SectorChanged { .. })),
            migrations: count(|k| matches!(k, EventKind::Migrated { .. })),
            hires: count(|k| matches!(k, EventKind::Hired { .. })),
            infrastructure_built: count(|k| matches!(k, EventKind::InfrastructureBuilt { .. })),
            initial_gdp_per_capita: initial.map_or(0.0, |s| s.gdp_per_capita),
            final_gdp_per_capita: last.map_or(0.0, |s| s.gdp_per_capita),
            final_gini: last.map_or(0.0, |s| s.gini),
            final_urbanization_rate: last.map_or(0.0, |s| s.urbanization_rate),
        };

        Self {
            policy_reports: state.policy.reports().to_vec(),
            snapshots: state.history,
            final_state,
            events,
            statistics,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> String {
        let s = &self.statistics;
        format!(
            "Simulated {} steps in {}ms\n\
             GDP per capita {:.0} -> {:.0}, Gini {:.3}, urbanization {:.1}%\n\
             {} events: {} floods, {} sector changes, {} migrations, {} hires, {} items built",
            s.steps_simulated,
            s.simulation_time_ms,
            s.initial_gdp_per_capita,
            s.final_gdp_per_capita,
            s.final_gini,
            s.final_urbanization_rate * 100.0,
            s.total_events,
            s.floods,
            s.sector_changes,
            s.migrations,
            s.hires,
            s.infrastructure_built,
        )
    }
}
