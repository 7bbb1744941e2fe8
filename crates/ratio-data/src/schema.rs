//! Serde data file structs for datasets and plans.
//!
//! These structs define the on-disk format of raws, modules, buildings,
//! recipes, and the optional plan. They are deserialized from RON, JSON, or
//! TOML data files and then resolved into a production graph by
//! [`crate::dataset`].

use serde::Deserialize;

fn one() -> f64 {
    1.0
}

// ===========================================================================
// Modules
// ===========================================================================

/// A module definition. Bonuses default to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleData {
    pub name: String,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub productivity: f64,
    #[serde(default)]
    pub power: f64,
}

// ===========================================================================
// Buildings
// ===========================================================================

/// A building definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub name: String,
    pub kind: BuildingKindData,
}

/// How a building's crafting speed and productivity are obtained.
#[derive(Debug, Clone, Deserialize)]
pub enum BuildingKindData {
    /// Stats given directly.
    Plain {
        crafting_speed: f64,
        #[serde(default = "one")]
        productivity: f64,
        #[serde(default)]
        slots: u32,
    },
    /// Derived from another building with modules installed.
    Modded {
        base: String,
        #[serde(default)]
        modules: Vec<String>,
        #[serde(default)]
        beacon_modules: Vec<String>,
    },
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe ingredient, either `("item", quantity)` or just `"item"` for a
/// quantity of one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IngredientData {
    Short(String, f64),
    Name(String),
}

impl IngredientData {
    pub fn item(&self) -> &str {
        match self {
            IngredientData::Short(item, _) | IngredientData::Name(item) => item,
        }
    }

    pub fn quantity(&self) -> f64 {
        match self {
            IngredientData::Short(_, quantity) => *quantity,
            IngredientData::Name(_) => 1.0,
        }
    }
}

/// A recipe definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    /// The item this recipe produces.
    pub item: String,
    pub building: String,
    #[serde(default = "one")]
    pub output: f64,
    /// Seconds per crafting cycle.
    pub time: f64,
    #[serde(default)]
    pub ingredients: Vec<IngredientData>,
    #[serde(default)]
    pub side_outputs: Vec<(String, f64)>,
}

// ===========================================================================
// Plan
// ===========================================================================

/// Default throughput of one transport lane, in items per second.
pub const DEFAULT_LANE_CAPACITY: f64 = ratio_core::trace::DEFAULT_LANE_CAPACITY;

fn default_lane_capacity() -> f64 {
    DEFAULT_LANE_CAPACITY
}

/// The root demands to resolve and display settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanData {
    #[serde(default = "default_lane_capacity")]
    pub lane_capacity: f64,
    #[serde(default)]
    pub demands: Vec<DemandData>,
}

/// A root demand. A missing rate means "whatever the other demands need".
#[derive(Debug, Clone, Deserialize)]
pub struct DemandData {
    pub item: String,
    #[serde(default)]
    pub rate: f64,
}

// ===========================================================================
// TOML wrappers
// ===========================================================================

/// Wrapper for a list of raw item names in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlRaws {
    pub raws: Vec<String>,
}

/// Wrapper for a list of modules in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlModules {
    pub modules: Vec<ModuleData>,
}

/// Wrapper for a list of buildings in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlBuildings {
    pub buildings: Vec<BuildingData>,
}

/// Wrapper for a list of recipes in TOML format.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlRecipes {
    pub recipes: Vec<RecipeData>,
}

// ===========================================================================
// Tests
// ===========================================================================
