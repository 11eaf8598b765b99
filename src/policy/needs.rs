//! Needs assessment: how badly each spending category is needed

use crate::core::config::SimulationConfig;
use crate::core::types::CategoryTable;
use crate::town::systems::MetricsSnapshot;

/// Scores every policy category in [0, 1] from the latest snapshot
pub trait NeedsAssessment: std::fmt::Debug {
    fn assess(&self, snapshot: &MetricsSnapshot, config: &SimulationConfig) -> CategoryTable<f64>;
}

/// Default assessment based on coverage and development gaps
///
/// - infrastructure: 1 - mean coverage rate over all types
/// - education: 1 - average education / education maximum
/// - health: 1 - average health / health maximum
/// - economic: share of households still in agriculture
/// - direct: poverty rate
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageGapNeeds;

impl NeedsAssessment for CoverageGapNeeds {
    fn assess(&self, snapshot: &MetricsSnapshot, config: &SimulationConfig) -> CategoryTable<f64> {
        let hh = &config.household;
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        CategoryTable::new(
            clamp(1.0 - snapshot.mean_coverage()),
            clamp(1.0 - snapshot.average_education / hh.education_max),
            clamp(1.0 - snapshot.average_health / hh.health_max),
            clamp(snapshot.sector_shares.agriculture),
            clamp(snapshot.poverty_rate),
        )
    }
}
