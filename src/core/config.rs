//! Simulation configuration with documented defaults
//!
//! Every tunable number used by the engine lives here. Defaults reproduce a
//! 200-household settlement on a 50x50 lattice in a flood-exposed delta
//! region. Configs load from TOML; any section or field left out keeps its
//! default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{CategoryTable, InfraTable, InfrastructureType, SectorTable};

/// Full parameter bundle consumed by `initialize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the single engine-wide ChaCha8 generator
    pub seed: u64,
    /// Number of households (fixed for the whole run)
    pub population: u32,
    /// Number of businesses created at initialization
    pub business_count: u32,
    /// Re-check grid and registry indices against the authoritative
    /// collections after every step
    pub verify_indices: bool,
    pub grid: GridConfig,
    pub household: HouseholdConfig,
    pub rates: ContextRates,
    /// Monthly base wage per sector (currency units)
    pub wages: SectorTable<f64>,
    pub income: IncomeConfig,
    pub shocks: ShockConfig,
    pub investment: InvestmentConfig,
    pub transition: TransitionConfig,
    pub migration: MigrationConfig,
    pub business: BusinessConfig,
    pub infrastructure: InfrastructureConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    /// Cells within this Euclidean distance of the grid center are urban
    pub town_center_radius: f64,
    /// Bottom rows of the grid that form the floodplain
    pub flood_zone_rows: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdConfig {
    pub size_min: u32,
    pub size_max: u32,
    /// Initial sector mix; must sum to 1
    pub sector_distribution: SectorTable<f64>,
    /// Share of households placed inside the town center at start
    pub initial_urban_fraction: f64,
    /// Upper bound of the education scalar
    pub education_max: f64,
    /// Upper bound of the health scalar
    pub health_max: f64,
    /// Initial education is drawn from [0, initial_education_max]
    pub initial_education_max: f64,
    /// Initial health is drawn from [initial_health_min, 1] of `health_max`
    pub initial_health_min: f64,
    /// Rural attachment is drawn from [min, max]; a migration draw must beat it
    pub rural_attachment_min: f64,
    pub rural_attachment_max: f64,
}

/// Regional prior probabilities and the urban wage premium
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextRates {
    /// Per-step flood probability for exposed households
    pub flood_risk: f64,
    pub remittance_rate: f64,
    pub cooperative_rate: f64,
    pub microfinance_rate: f64,
    pub landless_rate: f64,
    pub off_grid_rate: f64,
    /// Multiplier for manufacturing/services income earned in the town center
    pub urban_wage_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeConfig {
    /// Income multiplier for landless agricultural households
    pub landless_agriculture_multiplier: f64,
    /// Fixed monthly remittance inflow for recipient households
    pub remittance_amount: f64,
    /// Share of income consumed each step
    pub consumption_rate: f64,
    /// Households earning below this are counted as poor
    pub poverty_line: f64,
    /// Household productivity multipliers by covering infrastructure
    pub road_multiplier: f64,
    pub market_multiplier: f64,
    pub utility_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockConfig {
    /// Fraction of earned income lost on a flood step
    pub flood_income_penalty: f64,
    /// Fraction of savings destroyed on a flood step
    pub flood_savings_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentConfig {
    /// Savings must exceed this before any investment is considered
    pub threshold: f64,
    /// Share of savings put into education per step when eligible
    pub education_fraction: f64,
    /// Share of savings put into health per step when eligible
    pub health_fraction: f64,
    /// Cost of one education level
    pub education_cost_per_level: f64,
    /// Cost of one full unit of the health scalar
    pub health_cost_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Cumulative floods after which a landless farmer considers leaving
    /// agriculture even on dry steps
    pub flood_exposure_threshold: u32,
    pub switch_probability: f64,
    /// How far a household looks for a business with open slots
    pub job_search_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub enabled: bool,
    /// Town-center income must beat current income by this relative margin
    pub income_margin: f64,
    /// One-off moving cost paid from savings
    pub cost: f64,
    /// Maximum cells moved towards the town center per migration
    pub step_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    /// Sector mix of businesses at creation; must sum to 1
    pub sector_distribution: SectorTable<f64>,
    /// Revenue per worker at productivity 1.0 without infrastructure
    pub revenue_per_worker: SectorTable<f64>,
    /// Shares of small, medium and large businesses at creation
    pub size_distribution: [f64; 3],
    /// Employee slots for small, medium and large businesses
    pub size_capacity: [u32; 3],
    /// Retained earnings needed to grow into medium and large
    pub upgrade_cost: [f64; 2],
    /// Base productivity is drawn from [min, max]
    pub productivity_min: f64,
    pub productivity_max: f64,
    pub wage_cost_per_employee: f64,
    pub overhead: f64,
    /// Revenue per employee above which a business tries to hire
    pub expansion_threshold: f64,
    pub hire_cost: f64,
    pub max_hires_per_step: u32,
    pub hiring_radius: f64,
    /// Business productivity multipliers by covering infrastructure
    pub road_multiplier: f64,
    pub utility_multiplier: f64,
    pub market_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureConfig {
    pub costs: InfraTable<f64>,
    pub radii: InfraTable<f64>,
    pub capacity: InfraTable<u32>,
    /// Quality lost per policy cycle
    pub quality_decay: f64,
    pub min_quality: f64,
    /// Place one item of every type near the center (plus random roads)
    /// before the first step
    pub founding_endowment: bool,
    pub initial_roads: u32,
    /// The builder will not put more items than this on a single cell
    pub max_items_per_cell: u32,
    /// Tie-break order when two build options score equally
    pub build_priority: Vec<InfrastructureType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Budget added to the pool on every policy cycle
    pub budget: f64,
    /// Steps between policy cycles; the default of 5 is one simulated year
    pub interval: u64,
    /// Fractions used when every need is zero
    pub default_fractions: CategoryTable<f64>,
    /// No category may receive less than this share
    pub min_fraction: f64,
    /// No category may receive more than this share
    pub max_fraction: f64,
    pub programs: ProgramConfig,
}

/// Unit costs of the non-infrastructure programs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    pub education_cost: f64,
    pub health_cost: f64,
    pub business_grant: f64,
    pub training_cost: f64,
    pub training_success: f64,
    pub direct_grant: f64,
    pub microfinance_loan: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            population: 200,
            business_count: 30,
            verify_indices: true,
            grid: GridConfig::default(),
            household: HouseholdConfig::default(),
            rates: ContextRates::default(),
            wages: SectorTable::new(2500.0, 4000.0, 5000.0),
            income: IncomeConfig::default(),
            shocks: ShockConfig::default(),
            investment: InvestmentConfig::default(),
            transition: TransitionConfig::default(),
            migration: MigrationConfig::default(),
            business: BusinessConfig::default(),
            infrastructure: InfrastructureConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            town_center_radius: 10.0,
            flood_zone_rows: 12,
        }
    }
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        Self {
            size_min: 3,
            size_max: 7,
            sector_distribution: SectorTable::new(0.6, 0.2, 0.2),
            initial_urban_fraction: 0.3,
            education_max: 10.0,
            health_max: 1.0,
            initial_education_max: 6.0,
            initial_health_min: 0.3,
            rural_attachment_min: 0.2,
            rural_attachment_max: 0.8,
        }
    }
}

impl Default for ContextRates {
    fn default() -> Self {
        Self {
            flood_risk: 0.15,
            remittance_rate: 0.25,
            cooperative_rate: 0.35,
            microfinance_rate: 0.45,
            landless_rate: 0.40,
            off_grid_rate: 0.12,
            urban_wage_multiplier: 1.8,
        }
    }
}

impl Default for IncomeConfig {
    fn default() -> Self {
        Self {
            landless_agriculture_multiplier: 0.7,
            remittance_amount: 2000.0,
            consumption_rate: 0.8,
            poverty_line: 2000.0,
            road_multiplier: 1.2,
            market_multiplier: 1.15,
            utility_multiplier: 1.1,
        }
    }
}

impl Default for ShockConfig {
    fn default() -> Self {
        Self {
            flood_income_penalty: 0.4,
            flood_savings_drawdown: 0.6,
        }
    }
}

impl Default for InvestmentConfig {
    fn default() -> Self {
        Self {
            threshold: 1000.0,
            education_fraction: 0.1,
            health_fraction: 0.05,
            education_cost_per_level: 2000.0,
            health_cost_per_unit: 2000.0,
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            flood_exposure_threshold: 2,
            switch_probability: 0.3,
            job_search_radius: 12.0,
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            income_margin: 0.5,
            cost: 1500.0,
            step_distance: 6.0,
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            sector_distribution: SectorTable::new(0.5, 0.3, 0.2),
            revenue_per_worker: SectorTable::new(3000.0, 5000.0, 4500.0),
            size_distribution: [0.7, 0.25, 0.05],
            size_capacity: [5, 20, 50],
            upgrade_cost: [20_000.0, 50_000.0],
            productivity_min: 0.5,
            productivity_max: 1.5,
            wage_cost_per_employee: 2000.0,
            overhead: 200.0,
            expansion_threshold: 3500.0,
            hire_cost: 3000.0,
            max_hires_per_step: 2,
            hiring_radius: 6.0,
            road_multiplier: 1.3,
            utility_multiplier: 1.2,
            market_multiplier: 1.1,
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            costs: InfraTable::new(10_000.0, 50_000.0, 30_000.0, 20_000.0, 40_000.0),
            radii: InfraTable::new(2.0, 4.0, 5.0, 5.0, 3.0),
            capacity: InfraTable::new(1000, 200, 100, 50, 500),
            quality_decay: 0.02,
            min_quality: 0.1,
            founding_endowment: true,
            initial_roads: 5,
            max_items_per_cell: 2,
            build_priority: InfrastructureType::ALL.to_vec(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            budget: 100_000.0,
            interval: 5,
            default_fractions: CategoryTable::new(0.5, 0.15, 0.15, 0.1, 0.1),
            min_fraction: 0.05,
            max_fraction: 0.7,
            programs: ProgramConfig::default(),
        }
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            education_cost: 300.0,
            health_cost: 250.0,
            business_grant: 5000.0,
            training_cost: 500.0,
            training_success: 0.3,
            direct_grant: 1000.0,
            microfinance_loan: 2000.0,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::Configuration(format!(
            "{} must be a probability in [0, 1], got {}",
            name, value
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::Configuration(format!(
            "{} must be a finite non-negative number, got {}",
            name, value
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::Configuration(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn check_distribution(name: &str, shares: &[f64]) -> Result<()> {
    for (i, share) in shares.iter().enumerate() {
        check_probability(&format!("{}[{}]", name, i), *share)?;
    }
    let total: f64 = shares.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(SimError::Configuration(format!(
            "{} must sum to 1, got {}",
            name, total
        )));
    }
    Ok(())
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing fields keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject any bundle the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(SimError::Configuration(format!(
                "grid must be non-empty, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        if self.grid.width > i32::MAX as u32 || self.grid.height > i32::MAX as u32 {
            return Err(SimError::Configuration("grid dimensions exceed i32 range".into()));
        }
        check_non_negative("grid.town_center_radius", self.grid.town_center_radius)?;

        let hh = &self.household;
        if hh.size_min == 0 || hh.size_min > hh.size_max {
            return Err(SimError::Configuration(format!(
                "household size range {}..={} is invalid",
                hh.size_min, hh.size_max
            )));
        }
        check_distribution(
            "household.sector_distribution",
            &[
                hh.sector_distribution.agriculture,
                hh.sector_distribution.manufacturing,
                hh.sector_distribution.services,
            ],
        )?;
        check_probability("household.initial_urban_fraction", hh.initial_urban_fraction)?;
        check_positive("household.education_max", hh.education_max)?;
        check_positive("household.health_max", hh.health_max)?;
        check_non_negative("household.initial_education_max", hh.initial_education_max)?;
        check_probability("household.initial_health_min", hh.initial_health_min)?;
        check_probability("household.rural_attachment_min", hh.rural_attachment_min)?;
        check_probability("household.rural_attachment_max", hh.rural_attachment_max)?;
        if hh.rural_attachment_min > hh.rural_attachment_max {
            return Err(SimError::Configuration(
                "household.rural_attachment_min exceeds rural_attachment_max".into(),
            ));
        }

        let rates = &self.rates;
        check_probability("rates.flood_risk", rates.flood_risk)?;
        check_probability("rates.remittance_rate", rates.remittance_rate)?;
        check_probability("rates.cooperative_rate", rates.cooperative_rate)?;
        check_probability("rates.microfinance_rate", rates.microfinance_rate)?;
        check_probability("rates.landless_rate", rates.landless_rate)?;
        check_probability("rates.off_grid_rate", rates.off_grid_rate)?;
        check_non_negative("rates.urban_wage_multiplier", rates.urban_wage_multiplier)?;

        for (sector, wage) in self.wages.iter() {
            check_non_negative(&format!("wages.{}", sector.label()), *wage)?;
        }

        let income = &self.income;
        check_non_negative("income.landless_agriculture_multiplier", income.landless_agriculture_multiplier)?;
        check_non_negative("income.remittance_amount", income.remittance_amount)?;
        check_probability("income.consumption_rate", income.consumption_rate)?;
        check_non_negative("income.poverty_line", income.poverty_line)?;
        check_non_negative("income.road_multiplier", income.road_multiplier)?;
        check_non_negative("income.market_multiplier", income.market_multiplier)?;
        check_non_negative("income.utility_multiplier", income.utility_multiplier)?;

        check_probability("shocks.flood_income_penalty", self.shocks.flood_income_penalty)?;
        check_probability("shocks.flood_savings_drawdown", self.shocks.flood_savings_drawdown)?;

        let inv = &self.investment;
        check_non_negative("investment.threshold", inv.threshold)?;
        check_probability("investment.education_fraction", inv.education_fraction)?;
        check_probability("investment.health_fraction", inv.health_fraction)?;
        check_positive("investment.education_cost_per_level", inv.education_cost_per_level)?;
        check_positive("investment.health_cost_per_unit", inv.health_cost_per_unit)?;

        check_probability("transition.switch_probability", self.transition.switch_probability)?;
        check_non_negative("transition.job_search_radius", self.transition.job_search_radius)?;

        check_non_negative("migration.income_margin", self.migration.income_margin)?;
        check_non_negative("migration.cost", self.migration.cost)?;
        if !(self.migration.step_distance >= 1.0) {
            return Err(SimError::Configuration(format!(
                "migration.step_distance must be at least one cell, got {}",
                self.migration.step_distance
            )));
        }

        let biz = &self.business;
        check_distribution(
            "business.sector_distribution",
            &[
                biz.sector_distribution.agriculture,
                biz.sector_distribution.manufacturing,
                biz.sector_distribution.services,
            ],
        )?;
        check_distribution("business.size_distribution", &biz.size_distribution)?;
        for (sector, revenue) in biz.revenue_per_worker.iter() {
            check_non_negative(&format!("business.revenue_per_worker.{}", sector.label()), *revenue)?;
        }
        if biz.size_capacity.iter().any(|c| *c == 0) {
            return Err(SimError::Configuration("business.size_capacity entries must be positive".into()));
        }
        for cost in biz.upgrade_cost {
            check_non_negative("business.upgrade_cost", cost)?;
        }
        check_non_negative("business.productivity_min", biz.productivity_min)?;
        if biz.productivity_min > biz.productivity_max {
            return Err(SimError::Configuration(
                "business.productivity_min exceeds productivity_max".into(),
            ));
        }
        check_non_negative("business.wage_cost_per_employee", biz.wage_cost_per_employee)?;
        check_non_negative("business.overhead", biz.overhead)?;
        check_non_negative("business.expansion_threshold", biz.expansion_threshold)?;
        check_non_negative("business.hire_cost", biz.hire_cost)?;
        check_non_negative("business.hiring_radius", biz.hiring_radius)?;
        check_non_negative("business.road_multiplier", biz.road_multiplier)?;
        check_non_negative("business.utility_multiplier", biz.utility_multiplier)?;
        check_non_negative("business.market_multiplier", biz.market_multiplier)?;

        let infra = &self.infrastructure;
        for (kind, cost) in infra.costs.iter() {
            check_non_negative(&format!("infrastructure.costs.{}", kind.label()), *cost)?;
        }
        for (kind, radius) in infra.radii.iter() {
            check_non_negative(&format!("infrastructure.radii.{}", kind.label()), *radius)?;
        }
        check_probability("infrastructure.quality_decay", infra.quality_decay)?;
        check_probability("infrastructure.min_quality", infra.min_quality)?;
        if infra.max_items_per_cell == 0 {
            return Err(SimError::Configuration(
                "infrastructure.max_items_per_cell must be at least 1".into(),
            ));
        }
        let mut priority = infra.build_priority.clone();
        priority.sort();
        priority.dedup();
        if priority.len() != InfrastructureType::ALL.len() || infra.build_priority.len() != priority.len() {
            return Err(SimError::Configuration(
                "infrastructure.build_priority must list every type exactly once".into(),
            ));
        }

        let policy = &self.policy;
        check_non_negative("policy.budget", policy.budget)?;
        if policy.interval == 0 {
            return Err(SimError::Configuration("policy.interval must be at least 1".into()));
        }
        for (category, fraction) in policy.default_fractions.iter() {
            check_probability(&format!("policy.default_fractions.{:?}", category), *fraction)?;
        }
        if policy.default_fractions.sum() <= 0.0 {
            return Err(SimError::Configuration("policy.default_fractions must not all be zero".into()));
        }
        check_probability("policy.min_fraction", policy.min_fraction)?;
        check_probability("policy.max_fraction", policy.max_fraction)?;
        let categories = policy.default_fractions.iter().count() as f64;
        if policy.min_fraction > policy.max_fraction
            || policy.min_fraction * categories > 1.0 + 1e-9
            || policy.max_fraction * categories < 1.0 - 1e-9
        {
            return Err(SimError::Configuration(format!(
                "allocation band [{}, {}] cannot hold fractions summing to 1",
                policy.min_fraction, policy.max_fraction
            )));
        }

        let programs = &policy.programs;
        check_positive("policy.programs.education_cost", programs.education_cost)?;
        check_positive("policy.programs.health_cost", programs.health_cost)?;
        check_positive("policy.programs.business_grant", programs.business_grant)?;
        check_positive("policy.programs.training_cost", programs.training_cost)?;
        check_probability("policy.programs.training_success", programs.training_success)?;
        check_positive("policy.programs.direct_grant", programs.direct_grant)?;
        check_positive("policy.programs.microfinance_loan", programs.microfinance_loan)?;

        Ok(())
    }
}
