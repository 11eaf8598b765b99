//! Per-step export records and the visualization feed
//!
//! Both are plain serde data. Encoding them (JSON, CSV, drawing) belongs to
//! whoever consumes them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{InfrastructureType, Position, Sector, Step};
use crate::town::business::BusinessSize;
use crate::town::systems::MetricsSnapshot;
use crate::town::world::TownWorld;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HouseholdRecord {
    pub position: Position,
    pub size: u32,
    pub sector: Sector,
    pub landless: bool,
    pub income: f64,
    pub savings: f64,
    pub education: f64,
    pub health: f64,
    pub urban: bool,
    pub flood_affected: bool,
    pub employer: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub position: Position,
    pub sector: Sector,
    pub size: BusinessSize,
    pub employees: u32,
    pub revenue: f64,
    pub profit: f64,
    pub productivity_multiplier: f64,
    pub retained_earnings: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureRecord {
    pub kind: InfrastructureType,
    pub position: Position,
    pub radius: f64,
    pub quality: f64,
    pub capacity: u32,
    pub built_step: Step,
}

/// Full attribute dump of one step, keyed by id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub households: BTreeMap<u32, HouseholdRecord>,
    pub businesses: BTreeMap<u32, BusinessRecord>,
    pub infrastructure: BTreeMap<u32, InfrastructureRecord>,
    pub metrics: MetricsSnapshot,
}

impl StepRecord {
    pub fn capture(world: &TownWorld, metrics: &MetricsSnapshot) -> Self {
        let households = world
            .households
            .iter()
            .map(|h| {
                (
                    h.id.0,
                    HouseholdRecord {
                        position: h.position,
                        size: h.size,
                        sector: h.sector,
                        landless: h.landless,
                        income: h.income,
                        savings: h.savings,
                        education: h.education,
                        health: h.health,
                        urban: h.urban,
                        flood_affected: h.flood_affected,
                        employer: h.employer.map(|b| b.0),
                    },
                )
            })
            .collect();

        let businesses = world
            .businesses
            .iter()
            .map(|b| {
                (
                    b.id.0,
                    BusinessRecord {
                        position: b.position,
                        sector: b.sector,
                        size: b.size,
                        employees: b.employees,
                        revenue: b.revenue,
                        profit: b.profit,
                        productivity_multiplier: b.productivity_multiplier,
                        retained_earnings: b.retained_earnings,
                    },
                )
            })
            .collect();

        let infrastructure = world
            .infrastructure
            .iter()
            .map(|i| {
                (
                    i.id.0,
                    InfrastructureRecord {
                        kind: i.kind,
                        position: i.position,
                        radius: i.radius,
                        quality: i.quality,
                        capacity: i.capacity,
                        built_step: i.built_step,
                    },
                )
            })
            .collect();

        Self {
            step: world.step,
            households,
            businesses,
            infrastructure,
            metrics: metrics.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Household,
    Business,
    Infrastructure,
}

/// Styling hint for a front-end; the mapping to actual colors is its business
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorClass {
    Agriculture,
    Manufacturing,
    Services,
    Flooded,
    Road,
    School,
    Clinic,
    Market,
    Utility,
}

impl From<Sector> for ColorClass {
    fn from(sector: Sector) -> Self {
        match sector {
            Sector::Agriculture => ColorClass::Agriculture,
            Sector::Manufacturing => ColorClass::Manufacturing,
            Sector::Services => ColorClass::Services,
        }
    }
}

impl From<InfrastructureType> for ColorClass {
    fn from(kind: InfrastructureType) -> Self {
        match kind {
            InfrastructureType::Road => ColorClass::Road,
            InfrastructureType::School => ColorClass::School,
            InfrastructureType::Clinic => ColorClass::Clinic,
            InfrastructureType::Market => ColorClass::Market,
            InfrastructureType::Utility => ColorClass::Utility,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualEntity {
    pub kind: EntityKind,
    pub id: u32,
    pub position: Position,
    /// Sector of an agent, or type of an item
    pub label: String,
    pub color: ColorClass,
}

/// What a renderer needs to draw one step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualFrame {
    pub step: Step,
    pub width: u32,
    pub height: u32,
    pub town_center: Position,
    pub entities: Vec<VisualEntity>,
}

impl VisualFrame {
    pub fn capture(world: &TownWorld) -> Self {
        let households = world.households.iter().map(|h| VisualEntity {
            kind: EntityKind::Household,
            id: h.id.0,
            position: h.position,
            label: h.sector.label().to_string(),
            color: if h.flood_affected {
                ColorClass::Flooded
            } else {
                h.sector.into()
            },
        });
        let businesses = world.businesses.iter().map(|b| VisualEntity {
            kind: EntityKind::Business,
            id: b.id.0,
            position: b.position,
            label: b.sector.label().to_string(),
            color: b.sector.into(),
        });
        let infrastructure = world.infrastructure.iter().map(|i| VisualEntity {
            kind: EntityKind::Infrastructure,
            id: i.id.0,
            position: i.position,
            label: i.kind.label().to_string(),
            color: i.kind.into(),
        });

        Self {
            step: world.step,
            width: world.grid.width(),
            height: world.grid.height(),
            town_center: world.grid.town_center(),
            entities: households.chain(businesses).chain(infrastructure).collect(),
        }
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }
}
