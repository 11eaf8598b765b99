//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation step counter; five steps make a simulated year and incomes are monthly rates
pub type Step = u64;

/// Unique identifier for households
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HouseholdId(pub u32);

impl HouseholdId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for businesses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BusinessId(pub u32);

impl BusinessId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for infrastructure items
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InfrastructureId(pub u32);

impl InfrastructureId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Anything that can sit on a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Occupant {
    Household(HouseholdId),
    Business(BusinessId),
    Infrastructure(InfrastructureId),
}

/// Integer cell coordinate on the settlement lattice
///
/// Signed so that callers can express (and be rejected for) positions
/// left of or above the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in cells
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Move up to `max_cells` along the straight line towards `target`.
    ///
    /// Lands exactly on `target` when it is closer than `max_cells`.
    pub fn step_toward(&self, target: &Self, max_cells: f64) -> Self {
        let distance = self.distance(target);
        if distance <= max_cells || distance == 0.0 {
            return *target;
        }
        let t = max_cells / distance;
        let x = f64::from(self.x) + f64::from(target.x - self.x) * t;
        let y = f64::from(self.y) + f64::from(target.y - self.y) * t;
        Self::new(x.round() as i32, y.round() as i32)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Economic sector of a household or business
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Agriculture,
    Manufacturing,
    Services,
}

impl Sector {
    pub const ALL: [Sector; 3] = [Sector::Agriculture, Sector::Manufacturing, Sector::Services];

    /// Sectors that earn the urban wage premium inside the town center
    pub fn is_urban_trade(&self) -> bool {
        match self {
            Sector::Agriculture => false,
            Sector::Manufacturing | Sector::Services => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sector::Agriculture => "agriculture",
            Sector::Manufacturing => "manufacturing",
            Sector::Services => "services",
        }
    }
}

/// Kind of infrastructure the policy engine can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureType {
    Road,
    School,
    Clinic,
    Market,
    Utility,
}

impl InfrastructureType {
    pub const ALL: [InfrastructureType; 5] = [
        InfrastructureType::Road,
        InfrastructureType::School,
        InfrastructureType::Clinic,
        InfrastructureType::Market,
        InfrastructureType::Utility,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InfrastructureType::Road => "road",
            InfrastructureType::School => "school",
            InfrastructureType::Clinic => "clinic",
            InfrastructureType::Market => "market",
            InfrastructureType::Utility => "utility",
        }
    }
}

/// One value per sector, addressable by `Sector`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorTable<T> {
    pub agriculture: T,
    pub manufacturing: T,
    pub services: T,
}

impl<T> SectorTable<T> {
    pub fn new(agriculture: T, manufacturing: T, services: T) -> Self {
        Self { agriculture, manufacturing, services }
    }

    pub fn get(&self, sector: Sector) -> &T {
        match sector {
            Sector::Agriculture => &self.agriculture,
            Sector::Manufacturing => &self.manufacturing,
            Sector::Services => &self.services,
        }
    }

    pub fn get_mut(&mut self, sector: Sector) -> &mut T {
        match sector {
            Sector::Agriculture => &mut self.agriculture,
            Sector::Manufacturing => &mut self.manufacturing,
            Sector::Services => &mut self.services,
        }
    }

    /// Iterate in `Sector::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (Sector, &T)> {
        Sector::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

/// One value per infrastructure type, addressable by `InfrastructureType`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InfraTable<T> {
    pub road: T,
    pub school: T,
    pub clinic: T,
    pub market: T,
    pub utility: T,
}

impl<T> InfraTable<T> {
    pub fn new(road: T, school: T, clinic: T, market: T, utility: T) -> Self {
        Self { road, school, clinic, market, utility }
    }

    pub fn get(&self, kind: InfrastructureType) -> &T {
        match kind {
            InfrastructureType::Road => &self.road,
            InfrastructureType::School => &self.school,
            InfrastructureType::Clinic => &self.clinic,
            InfrastructureType::Market => &self.market,
            InfrastructureType::Utility => &self.utility,
        }
    }

    pub fn get_mut(&mut self, kind: InfrastructureType) -> &mut T {
        match kind {
            InfrastructureType::Road => &mut self.road,
            InfrastructureType::School => &mut self.school,
            InfrastructureType::Clinic => &mut self.clinic,
            InfrastructureType::Market => &mut self.market,
            InfrastructureType::Utility => &mut self.utility,
        }
    }

    /// Iterate in `InfrastructureType::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (InfrastructureType, &T)> {
        InfrastructureType::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

impl<T: Clone> InfraTable<T> {
    pub fn splat(value: T) -> Self {
        Self::new(value.clone(), value.clone(), value.clone(), value.clone(), value)
    }
}

/// Spending category of the policy budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCategory {
    Infrastructure,
    Education,
    Health,
    Economic,
    Direct,
}

impl PolicyCategory {
    pub const ALL: [PolicyCategory; 5] = [
        PolicyCategory::Infrastructure,
        PolicyCategory::Education,
        PolicyCategory::Health,
        PolicyCategory::Economic,
        PolicyCategory::Direct,
    ];
}

/// One value per policy category, addressable by `PolicyCategory`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable<T> {
    pub infrastructure: T,
    pub education: T,
    pub health: T,
    pub economic: T,
    pub direct: T,
}

impl<T> CategoryTable<T> {
    pub fn new(infrastructure: T, education: T, health: T, economic: T, direct: T) -> Self {
        Self { infrastructure, education, health, economic, direct }
    }

    pub fn get(&self, category: PolicyCategory) -> &T {
        match category {
            PolicyCategory::Infrastructure => &self.infrastructure,
            PolicyCategory::Education => &self.education,
            PolicyCategory::Health => &self.health,
            PolicyCategory::Economic => &self.economic,
            PolicyCategory::Direct => &self.direct,
        }
    }

    pub fn get_mut(&mut self, category: PolicyCategory) -> &mut T {
        match category {
            PolicyCategory::Infrastructure => &mut self.infrastructure,
            PolicyCategory::Education => &mut self.education,
            PolicyCategory::Health => &mut self.health,
            PolicyCategory::Economic => &mut self.economic,
            PolicyCategory::Direct => &mut self.direct,
        }
    }

    /// Iterate in `PolicyCategory::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (PolicyCategory, &T)> {
        PolicyCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

impl CategoryTable<f64> {
    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, v)| *v).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_household_id_ordering() {
        assert!(HouseholdId(1) < HouseholdId(2));
        assert_eq!(HouseholdId::new(7), HouseholdId(7));
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_step_toward_stops_at_target() {
        let from = Position::new(0, 0);
        let to = Position::new(2, 0);
        assert_eq!(from.step_toward(&to, 5.0), to);
    }

    #[test]
    fn test_step_toward_partial_move() {
        let from = Position::new(0, 0);
        let to = Position::new(10, 0);
        assert_eq!(from.step_toward(&to, 4.0), Position::new(4, 0));

        // Diagonal moves get closer without overshooting
        let diag = Position::new(0, 0).step_toward(&Position::new(10, 10), 5.0);
        assert!(diag.distance(&Position::new(10, 10)) < Position::new(0, 0).distance(&Position::new(10, 10)));
    }

    #[test]
    fn test_urban_trade_sectors() {
        assert!(!Sector::Agriculture.is_urban_trade());
        assert!(Sector::Manufacturing.is_urban_trade());
        assert!(Sector::Services.is_urban_trade());
    }

    #[test]
    fn test_sector_table_lookup() {
        let mut table = SectorTable::new(1, 2, 3);
        assert_eq!(*table.get(Sector::Manufacturing), 2);
        *table.get_mut(Sector::Services) += 10;
        assert_eq!(table.services, 13);
        let order: Vec<Sector> = table.iter().map(|(s, _)| s).collect();
        assert_eq!(order, Sector::ALL.to_vec());
    }

    #[test]
    fn test_infra_table_splat() {
        let table = InfraTable::splat(0.5);
        assert!(table.iter().all(|(_, v)| *v == 0.5));
        assert_eq!(table.iter().count(), 5);
    }
}
