//! Business agents

use serde::{Deserialize, Serialize};

use crate::core::config::BusinessConfig;
use crate::core::types::{BusinessId, Position, Sector};

/// Size tier; determines the number of employee slots
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessSize {
    Small,
    Medium,
    Large,
}

impl BusinessSize {
    pub const ALL: [BusinessSize; 3] = [BusinessSize::Small, BusinessSize::Medium, BusinessSize::Large];

    pub fn index(&self) -> usize {
        match self {
            BusinessSize::Small => 0,
            BusinessSize::Medium => 1,
            BusinessSize::Large => 2,
        }
    }

    /// Tier reached by an upgrade, if any
    pub fn next(&self) -> Option<BusinessSize> {
        match self {
            BusinessSize::Small => Some(BusinessSize::Medium),
            BusinessSize::Medium => Some(BusinessSize::Large),
            BusinessSize::Large => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BusinessSize::Small => "small",
            BusinessSize::Medium => "medium",
            BusinessSize::Large => "large",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub position: Position,
    /// Fixed at creation
    pub sector: Sector,
    pub size: BusinessSize,
    pub base_productivity: f64,
    /// Infrastructure bonus recomputed every step
    pub productivity_multiplier: f64,
    pub revenue: f64,
    pub profit: f64,
    /// Headcount; founding staff are not linked to any household
    pub employees: u32,
    pub retained_earnings: f64,
    /// Policy grants available for hiring
    pub support_fund: f64,
}

impl Business {
    pub fn capacity(&self, config: &BusinessConfig) -> u32 {
        config.size_capacity[self.size.index()]
    }

    pub fn open_slots(&self, config: &BusinessConfig) -> u32 {
        self.capacity(config).saturating_sub(self.employees)
    }

    pub fn is_full(&self, config: &BusinessConfig) -> bool {
        self.open_slots(config) == 0
    }

    /// Revenue one worker brings in at the current multiplier.
    ///
    /// Revenue is linear in headcount, so this equals revenue / employees
    /// whenever there are employees, and stays defined when there are none.
    pub fn revenue_per_worker(&self, config: &BusinessConfig) -> f64 {
        self.base_productivity * config.revenue_per_worker.get(self.sector) * self.productivity_multiplier
    }

    pub fn can_expand(&self, config: &BusinessConfig) -> bool {
        self.revenue_per_worker(config) > config.expansion_threshold && !self.is_full(config)
    }

    /// Cost of moving to the next tier, or `None` for large businesses
    pub fn upgrade_cost(&self, config: &BusinessConfig) -> Option<f64> {
        self.size.next().map(|_| config.upgrade_cost[self.size.index()])
    }

    /// Spend `amount` from retained earnings first, then the support fund.
    ///
    /// Returns false and leaves both untouched if they cannot cover it together.
    pub fn pay(&mut self, amount: f64) -> bool {
        if self.retained_earnings + self.support_fund < amount {
            return false;
        }
        let from_earnings = amount.min(self.retained_earnings);
        self.retained_earnings -= from_earnings;
        self.support_fund -= amount - from_earnings;
        true
    }
}
