use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Item to be shipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Weight of a single unit
    pub weight: f64,
    pub quantity: u32,
    /// Free-form grouping tag, only consulted by the category and fragility splitters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub fragile: bool,
}

impl Item {
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Fragile either by flag or by carrying the `fragile` category tag.
    pub fn is_fragile(&self) -> bool {
        self.fragile
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case("fragile"))
    }
}

/// Kind of shipping enclosure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    #[default]
    Box,
    PolyBag,
    Envelope,
    Tube,
    Custom,
}

/// Container from the tenant's catalog snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub max_weight: f64,
    pub cost: f64,
    /// Stock count at snapshot time. Never decremented by the engine.
    pub in_stock: u32,
    #[serde(rename = "type", default)]
    pub container_type: ContainerType,
}

impl Container {
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}

/// Rule used to partition items across several packages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplittingStrategy {
    Weight,
    Volume,
    Category,
    Fragility,
    Hybrid,
}

impl SplittingStrategy {
    /// Every strategy, in the order they are tried when none is pinned.
    pub const ALL: [SplittingStrategy; 5] = [
        SplittingStrategy::Weight,
        SplittingStrategy::Volume,
        SplittingStrategy::Category,
        SplittingStrategy::Fragility,
        SplittingStrategy::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplittingStrategy::Weight => "weight",
            SplittingStrategy::Volume => "volume",
            SplittingStrategy::Category => "category",
            SplittingStrategy::Fragility => "fragility",
            SplittingStrategy::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SplittingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplittingStrategy {
    type Err = CartonizerError;

    fn from_str(s: &str) -> Result<Self> {
        SplittingStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CartonizerError::InvalidParameters(format!("Unknown splitting strategy '{s}'"))
            })
    }
}

/// Goal used to choose among valid multi-package groupings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationObjective {
    MinimizePackages,
    MinimizeCost,
    #[default]
    Balanced,
}

impl OptimizationObjective {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationObjective::MinimizePackages => "minimize_packages",
            OptimizationObjective::MinimizeCost => "minimize_cost",
            OptimizationObjective::Balanced => "balanced",
        }
    }
}

impl fmt::Display for OptimizationObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationObjective {
    type Err = CartonizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "minimize_packages" => Ok(OptimizationObjective::MinimizePackages),
            "minimize_cost" => Ok(OptimizationObjective::MinimizeCost),
            "balanced" => Ok(OptimizationObjective::Balanced),
            _ => Err(CartonizerError::InvalidParameters(format!(
                "Unknown optimization objective '{s}'"
            ))),
        }
    }
}

/// Utilization boundaries (percent) separating the confidence buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceBuckets {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ConfidenceBuckets {
    fn default() -> Self {
        Self {
            high: 80.0,
            medium: 60.0,
            low: 40.0,
        }
    }
}

/// Per-tenant engine configuration. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Rank alternatives by lower cost
    pub optimize_for_cost: bool,
    /// Rank alternatives by higher utilization
    pub optimize_for_space: bool,
    /// Minimum utilization percentage a container must reach unless partial fill is allowed
    pub fill_rate_threshold: f64,
    pub max_package_weight: f64,
    /// Percentage of a container's volume usable after padding and irregular shapes
    pub packing_efficiency: f64,
    /// Carrier divisor turning container volume into dimensional weight
    pub dimensional_weight_factor: f64,
    pub allow_partial_fill: bool,
    /// Pinned splitting strategy; `None` tries them all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splitting_strategy: Option<SplittingStrategy>,
    pub optimization_objective: OptimizationObjective,
    /// Single-container results below this confidence escalate to the splitter
    pub escalation_threshold: f64,
    /// Skip containers whose snapshot stock is zero
    pub require_in_stock: bool,
    pub confidence_buckets: ConfidenceBuckets,
}

impl Parameters {
    pub const DEFAULT_FILL_RATE_THRESHOLD: f64 = 75.0;
    pub const DEFAULT_MAX_PACKAGE_WEIGHT: f64 = 50.0;
    pub const DEFAULT_PACKING_EFFICIENCY: f64 = 100.0;
    pub const DEFAULT_DIMENSIONAL_WEIGHT_FACTOR: f64 = 139.0;
    pub const DEFAULT_ESCALATION_THRESHOLD: f64 = 75.0;
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            optimize_for_cost: true,
            optimize_for_space: false,
            fill_rate_threshold: Self::DEFAULT_FILL_RATE_THRESHOLD,
            max_package_weight: Self::DEFAULT_MAX_PACKAGE_WEIGHT,
            packing_efficiency: Self::DEFAULT_PACKING_EFFICIENCY,
            dimensional_weight_factor: Self::DEFAULT_DIMENSIONAL_WEIGHT_FACTOR,
            allow_partial_fill: false,
            splitting_strategy: None,
            optimization_objective: OptimizationObjective::default(),
            escalation_threshold: Self::DEFAULT_ESCALATION_THRESHOLD,
            require_in_stock: true,
            confidence_buckets: ConfidenceBuckets::default(),
        }
    }
}

/// Input: one shipment's items against one catalog snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartonizationRequest {
    pub items: Vec<Item>,
    pub containers: Vec<Container>,
    #[serde(default)]
    pub parameters: Parameters,
}

/// Runner-up container for a single-container recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub container: Container,
    pub utilization: f64,
    pub cost: f64,
    pub confidence: f64,
}

/// All items fit in one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleResult {
    pub recommended_container: Container,
    pub utilization: f64,
    pub total_weight: f64,
    pub total_volume: f64,
    pub dimensional_weight: f64,
    pub billable_weight: f64,
    pub confidence: f64,
    pub alternatives: Vec<Alternative>,
}

/// Units of one input item placed in a package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedItem {
    pub item: Item,
    pub quantity: u32,
}

/// One package of a multi-package plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecommendation {
    pub container: Container,
    pub assigned_items: Vec<AssignedItem>,
    pub utilization: f64,
    pub package_weight: f64,
    pub package_volume: f64,
    pub dimensional_weight: f64,
    pub billable_weight: f64,
    pub confidence: f64,
}

/// Items partitioned across several containers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPackageResult {
    pub packages: Vec<PackageRecommendation>,
    pub total_packages: u32,
    pub total_weight: f64,
    pub total_volume: f64,
    pub total_cost: f64,
    pub total_billable_weight: f64,
    pub splitting_strategy: SplittingStrategy,
    pub optimization_objective: OptimizationObjective,
    /// Lowest per-package confidence
    pub confidence: f64,
}

/// Which path produced the recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    Single(SingleResult),
    Multi(MultiPackageResult),
}

/// Output: primary fields every caller reads, plus the path-specific detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartonizationResult {
    pub primary_container: Container,
    pub utilization: f64,
    pub confidence: f64,
    pub total_weight: f64,
    pub total_volume: f64,
    pub dimensional_weight: f64,
    pub billable_weight: f64,
    pub package_count: u32,
    pub detail: Recommendation,
}

impl CartonizationResult {
    pub fn is_multi_package(&self) -> bool {
        matches!(self.detail, Recommendation::Multi(_))
    }
}

/// Error type for cartonization
#[derive(Debug, thiserror::Error)]
pub enum CartonizerError {
    #[error("Invalid item '{id}': {reason}")]
    InvalidItem { id: String, reason: String },

    #[error("At least one item must be provided")]
    NoItems,

    #[error("Container catalog is empty")]
    EmptyCatalog,

    #[error("Invalid container '{id}': {reason}")]
    InvalidContainer { id: String, reason: String },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, CartonizerError>;
