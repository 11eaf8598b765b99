//! Occupancy index: which households, businesses and infrastructure sit where
//!
//! The index never owns entities. It mirrors the positions held by the
//! authoritative collections in `TownWorld` and is patched on every placement
//! and move.

use ahash::AHashMap;

use crate::core::config::GridConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{Occupant, Position};
use crate::spatial::grid::Grid;

/// Settlement lattice with multi-occupant cells
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cells: Grid<Vec<Occupant>>,
    locations: AHashMap<Occupant, Position>,
    town_center: Position,
    town_center_radius: f64,
    flood_zone_rows: u32,
}

impl SpatialGrid {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            cells: Grid::new(config.width, config.height),
            locations: AHashMap::new(),
            town_center: Position::new((config.width / 2) as i32, (config.height / 2) as i32),
            town_center_radius: config.town_center_radius,
            flood_zone_rows: config.flood_zone_rows,
        }
    }

    pub fn width(&self) -> u32 {
        self.cells.width()
    }

    pub fn height(&self) -> u32 {
        self.cells.height()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(pos)
    }

    pub fn check_bounds(&self, pos: Position) -> Result<()> {
        self.cells.check_bounds(pos)
    }

    /// Number of indexed occupants
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Put an occupant on a cell. Cells hold any number of occupants.
    ///
    /// Placing an occupant that is already indexed moves it.
    pub fn place_at(&mut self, occupant: Occupant, pos: Position) -> Result<()> {
        self.cells.check_bounds(pos)?;
        if let Some(old) = self.locations.get(&occupant).copied() {
            self.detach(occupant, old);
        }
        if let Some(cell) = self.cells.get_mut(pos) {
            cell.push(occupant);
        }
        self.locations.insert(occupant, pos);
        Ok(())
    }

    /// Move an already-placed occupant
    pub fn move_to(&mut self, occupant: Occupant, pos: Position) -> Result<()> {
        self.cells.check_bounds(pos)?;
        if !self.locations.contains_key(&occupant) {
            return Err(SimError::DataIntegrity(format!(
                "{:?} is not on the grid and cannot move",
                occupant
            )));
        }
        self.place_at(occupant, pos)
    }

    /// Take an occupant off the grid, returning where it was
    pub fn remove(&mut self, occupant: Occupant) -> Option<Position> {
        let pos = self.locations.remove(&occupant)?;
        self.detach(occupant, pos);
        Some(pos)
    }

    fn detach(&mut self, occupant: Occupant, pos: Position) {
        if let Some(cell) = self.cells.get_mut(pos) {
            cell.retain(|o| *o != occupant);
        }
    }

    pub fn position_of(&self, occupant: Occupant) -> Option<Position> {
        self.locations.get(&occupant).copied()
    }

    pub fn occupants_at(&self, pos: Position) -> &[Occupant] {
        self.cells.get(pos).map(|cell| cell.as_slice()).unwrap_or(&[])
    }

    /// Occupants within Euclidean `radius` of `center`.
    ///
    /// Cells are visited row-major and occupants in placement order, so the
    /// sequence is the same on every call. Clone the iterator to restart it.
    pub fn neighbors(&self, center: Position, radius: f64) -> impl Iterator<Item = Occupant> + Clone + '_ {
        self.cells
            .cells_within(center, radius)
            .flat_map(move |pos| self.occupants_at(pos).iter().copied())
    }

    /// On-grid cells within `radius` of `center`
    pub fn cells_within(&self, center: Position, radius: f64) -> impl Iterator<Item = Position> + Clone {
        self.cells.cells_within(center, radius)
    }

    pub fn town_center(&self) -> Position {
        self.town_center
    }

    pub fn distance_to_town_center(&self, pos: Position) -> f64 {
        pos.distance(&self.town_center)
    }

    /// Inside the town-center region
    pub fn is_urban(&self, pos: Position) -> bool {
        self.distance_to_town_center(pos) <= self.town_center_radius
    }

    /// Inside the floodplain band along the bottom edge
    pub fn is_flood_prone(&self, pos: Position) -> bool {
        let first_row = self.height().saturating_sub(self.flood_zone_rows);
        pos.y >= 0 && (pos.y as u32) >= first_row && self.contains(pos)
    }

    /// Compare the index against the authoritative `(occupant, position)` list
    pub fn verify(&self, expected: impl IntoIterator<Item = (Occupant, Position)>) -> Result<()> {
        let mut seen = 0usize;
        for (occupant, pos) in expected {
            seen += 1;
            match self.locations.get(&occupant) {
                Some(indexed) if *indexed == pos => {}
                Some(indexed) => {
                    return Err(SimError::DataIntegrity(format!(
                        "{:?} is at {} but indexed at {}",
                        occupant, pos, indexed
                    )))
                }
                None => {
                    return Err(SimError::DataIntegrity(format!("{:?} at {} is not indexed", occupant, pos)))
                }
            }
            if !self.occupants_at(pos).contains(&occupant) {
                return Err(SimError::DataIntegrity(format!(
                    "cell {} does not list {:?}",
                    pos, occupant
                )));
            }
        }
        if seen != self.locations.len() {
            return Err(SimError::DataIntegrity(format!(
                "grid indexes {} occupants but {} exist",
                self.locations.len(),
                seen
            )));
        }
        let listed: usize = self.cells.positions().map(|p| self.occupants_at(p).len()).sum();
        if listed != seen {
            return Err(SimError::DataIntegrity(format!(
                "cells list {} entries for {} occupants",
                listed, seen
            )));
        }
        Ok(())
    }
}
