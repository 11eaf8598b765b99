//! Coverage index over built infrastructure
//!
//! For every type the registry keeps a per-cell list of the items whose
//! radius reaches that cell, so coverage questions are a single lookup.

use ahash::AHashMap;

use crate::core::config::{BusinessConfig, IncomeConfig};
use crate::core::error::{Result, SimError};
use crate::core::types::{InfraTable, InfrastructureId, InfrastructureType, Position};
use crate::infrastructure::item::InfrastructureItem;
use crate::spatial::grid::Grid;

/// Index entry mirrored from an authoritative `InfrastructureItem`
#[derive(Clone, Debug, PartialEq)]
struct RegistryEntry {
    id: InfrastructureId,
    kind: InfrastructureType,
    position: Position,
    radius: f64,
    quality: f64,
}

/// Productivity multipliers granted by road, market and utility coverage
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverageBonuses {
    pub road: f64,
    pub market: f64,
    pub utility: f64,
}

impl CoverageBonuses {
    /// Bonuses applied to household earnings
    pub fn for_households(config: &IncomeConfig) -> Self {
        Self {
            road: config.road_multiplier,
            market: config.market_multiplier,
            utility: config.utility_multiplier,
        }
    }

    /// Bonuses applied to business productivity
    pub fn for_businesses(config: &BusinessConfig) -> Self {
        Self {
            road: config.road_multiplier,
            market: config.market_multiplier,
            utility: config.utility_multiplier,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InfrastructureRegistry {
    covering: InfraTable<Grid<Vec<InfrastructureId>>>,
    entries: Vec<RegistryEntry>,
    by_id: AHashMap<InfrastructureId, usize>,
}

impl InfrastructureRegistry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            covering: InfraTable::splat(Grid::new(width, height)),
            entries: Vec::new(),
            by_id: AHashMap::new(),
        }
    }

    /// Index an item and extend its type's coverage.
    ///
    /// Duplicate items at the same position are allowed; coverage is additive.
    pub fn register(&mut self, item: &InfrastructureItem) -> Result<()> {
        let layer = self.covering.get_mut(item.kind);
        layer.check_bounds(item.position)?;
        if self.by_id.contains_key(&item.id) {
            return Err(SimError::DataIntegrity(format!(
                "infrastructure {:?} registered twice",
                item.id
            )));
        }

        let cells: Vec<Position> = layer.cells_within(item.position, item.radius).collect();
        for cell in cells {
            if let Some(ids) = layer.get_mut(cell) {
                ids.push(item.id);
            }
        }

        self.by_id.insert(item.id, self.entries.len());
        self.entries.push(RegistryEntry {
            id: item.id,
            kind: item.kind,
            position: item.position,
            radius: item.radius,
            quality: item.quality,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Items of `kind` registered so far
    pub fn count(&self, kind: InfrastructureType) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Items of any type sitting exactly on `pos`
    pub fn items_at(&self, pos: Position) -> usize {
        self.entries.iter().filter(|e| e.position == pos).count()
    }

    /// Ids of every `kind` item whose radius reaches `pos`
    pub fn covering(&self, pos: Position, kind: InfrastructureType) -> &[InfrastructureId] {
        self.covering
            .get(kind)
            .get(pos)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_covered(&self, pos: Position, kind: InfrastructureType) -> bool {
        !self.covering(pos, kind).is_empty()
    }

    /// Highest quality among the `kind` items covering `pos`
    pub fn best_quality(&self, pos: Position, kind: InfrastructureType) -> Option<f64> {
        self.covering(pos, kind)
            .iter()
            .filter_map(|id| self.by_id.get(id).map(|&idx| self.entries[idx].quality))
            .fold(None, |best, q| Some(best.map_or(q, |b: f64| b.max(q))))
    }

    /// Fraction of `positions` covered by at least one `kind` item; 0 when empty
    pub fn coverage_rate(&self, kind: InfrastructureType, positions: impl IntoIterator<Item = Position>) -> f64 {
        let mut total = 0usize;
        let mut covered = 0usize;
        for pos in positions {
            total += 1;
            if self.is_covered(pos, kind) {
                covered += 1;
            }
        }
        if total == 0 {
            0.0
        } else {
            covered as f64 / total as f64
        }
    }

    /// Multiplicative productivity bonus at `pos`.
    ///
    /// Each covering type contributes `1 + (bonus - 1) * quality` using its best
    /// covering item. Off-grid electricity counts as full-quality utility access.
    pub fn productivity_multiplier(&self, pos: Position, off_grid: bool, bonuses: &CoverageBonuses) -> f64 {
        let scaled = |bonus: f64, quality: Option<f64>| match quality {
            Some(q) => 1.0 + (bonus - 1.0) * q,
            None => 1.0,
        };

        let road = scaled(bonuses.road, self.best_quality(pos, InfrastructureType::Road));
        let market = scaled(bonuses.market, self.best_quality(pos, InfrastructureType::Market));
        let utility_quality = if off_grid {
            Some(1.0)
        } else {
            self.best_quality(pos, InfrastructureType::Utility)
        };
        let utility = scaled(bonuses.utility, utility_quality);

        road * market * utility
    }

    /// Mirror a quality change made on the authoritative item
    pub fn set_quality(&mut self, id: InfrastructureId, quality: f64) -> Result<()> {
        match self.by_id.get(&id) {
            Some(&idx) => {
                self.entries[idx].quality = quality;
                Ok(())
            }
            None => Err(SimError::DataIntegrity(format!(
                "quality update for unregistered infrastructure {:?}",
                id
            ))),
        }
    }

    /// Compare the index against the authoritative item list
    pub fn verify(&self, items: &[InfrastructureItem]) -> Result<()> {
        if items.len() != self.entries.len() {
            return Err(SimError::DataIntegrity(format!(
                "registry holds {} items but {} exist",
                self.entries.len(),
                items.len()
            )));
        }
        for item in items {
            let entry = self
                .by_id
                .get(&item.id)
                .map(|&idx| &self.entries[idx])
                .ok_or_else(|| SimError::DataIntegrity(format!("{:?} is not registered", item.id)))?;
            if entry.kind != item.kind
                || entry.position != item.position
                || entry.radius != item.radius
                || entry.quality != item.quality
            {
                return Err(SimError::DataIntegrity(format!(
                    "registry entry for {:?} does not match the item",
                    item.id
                )));
            }
            if !self.covering(item.position, item.kind).contains(&item.id) {
                return Err(SimError::DataIntegrity(format!(
                    "{:?} does not cover its own cell",
                    item.id
                )));
            }
        }
        Ok(())
    }
}
