//! Household agents

use serde::{Deserialize, Serialize};

use crate::core::types::{BusinessId, HouseholdId, Position, Sector};

/// A household: the unit of income, savings and human capital
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub position: Position,
    /// Members (3-7 by default)
    pub size: u32,
    pub sector: Sector,
    pub landless: bool,
    /// Monthly income, never negative
    pub income: f64,
    pub savings: f64,
    pub education: f64,
    pub health: f64,
    pub cooperative: bool,
    pub microfinance: bool,
    pub remittance: bool,
    pub off_grid: bool,
    /// True only on steps where a flood hit this household
    pub flood_affected: bool,
    /// Floods suffered so far
    pub flood_exposure: u32,
    /// Inside the town-center radius; refreshed whenever the household moves
    pub urban: bool,
    /// Preference for staying put; a migration draw must exceed it
    pub rural_attachment: f64,
    pub employer: Option<BusinessId>,
}

impl Household {
    pub fn is_poor(&self, poverty_line: f64) -> bool {
        self.income < poverty_line
    }

    /// Landless farmers are the ones pushed out of agriculture by floods
    pub fn is_landless_farmer(&self) -> bool {
        self.landless && self.sector == Sector::Agriculture
    }

    /// Rural households without land to hold them may move towards town
    pub fn may_migrate(&self) -> bool {
        !self.urban && (self.sector != Sector::Agriculture || self.landless)
    }

    pub fn is_unemployed(&self) -> bool {
        self.employer.is_none()
    }
}
