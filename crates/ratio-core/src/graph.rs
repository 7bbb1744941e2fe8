//! The production graph: raw items, buildings, and the recipe producing each
//! recipe-backed item.
//!
//! Built through [`ProductionGraphBuilder`], which works on names so data
//! files can declare things in any order. [`ProductionGraphBuilder::build`]
//! validates the whole dataset and interns every item name to a dense
//! [`ItemId`]. The resulting [`ProductionGraph`] is immutable and can be
//! shared freely between resolutions.

use crate::building::{Building, BuildingError, Module};
use crate::id::*;
use crate::validation::{self, ConfigProblem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while building a production graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("production graph is inconsistent ({} problems)", .0.len())]
    Invalid(Vec<ConfigProblem>),
    #[error(transparent)]
    Building(#[from] BuildingError),
}

impl GraphError {
    /// Every configuration problem carried by this error.
    pub fn problems(&self) -> &[ConfigProblem] {
        match self {
            GraphError::Invalid(problems) => problems,
            GraphError::Building(_) => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Recipe definitions (by name, before validation)
// ---------------------------------------------------------------------------

/// A recipe as declared, referring to items and its building by name.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDef {
    /// The item this recipe produces.
    pub item: String,
    pub building: String,
    /// Items produced per crafting cycle.
    pub output: f64,
    /// Nominal seconds per crafting cycle.
    pub time: f64,
    pub ingredients: Vec<(String, f64)>,
    /// Byproducts. Informational only; never fed back into demand.
    pub side_outputs: Vec<(String, f64)>,
}

impl RecipeDef {
    pub fn new(item: &str, building: &str, output: f64, time: f64) -> Self {
        Self {
            item: item.to_string(),
            building: building.to_string(),
            output,
            time,
            ingredients: Vec::new(),
            side_outputs: Vec::new(),
        }
    }

    pub fn ingredient(mut self, item: &str, quantity: f64) -> Self {
        self.ingredients.push((item.to_string(), quantity));
        self
    }

    pub fn side_output(mut self, item: &str, quantity: f64) -> Self {
        self.side_outputs.push((item.to_string(), quantity));
        self
    }
}

// ---------------------------------------------------------------------------
// Resolved recipe types
// ---------------------------------------------------------------------------

/// An ingredient (or side output) of a resolved recipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: ItemId,
    pub quantity: f64,
}

/// A validated recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub item: ItemId,
    pub building: BuildingId,
    pub output: f64,
    pub time: f64,
    pub ingredients: Vec<Ingredient>,
    pub side_outputs: Vec<Ingredient>,
}

impl Recipe {
    /// Items per second a single `building` running this recipe produces.
    pub fn rate_per_machine(&self, building: &Building) -> f64 {
        self.output / self.time * building.crafting_speed * building.productivity
    }
}

/// Whether an item is supplied externally or produced by a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Raw,
    Recipe,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for an immutable [`ProductionGraph`].
#[derive(Debug, Default)]
pub struct ProductionGraphBuilder {
    pub(crate) raws: Vec<String>,
    pub(crate) modules: Vec<Module>,
    pub(crate) module_name_to_id: HashMap<String, ModuleId>,
    pub(crate) buildings: Vec<Building>,
    pub(crate) building_name_to_id: HashMap<String, BuildingId>,
    pub(crate) recipes: Vec<RecipeDef>,
}

impl ProductionGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an externally supplied item.
    pub fn add_raw(&mut self, name: &str) -> &mut Self {
        self.raws.push(name.to_string());
        self
    }

    /// Register a module. Module names must be unique.
    pub fn add_module(&mut self, module: Module) -> Result<ModuleId, BuildingError> {
        if self.module_name_to_id.contains_key(&module.name) {
            return Err(BuildingError::DuplicateModule(module.name));
        }
        let id = ModuleId(self.modules.len() as u32);
        self.module_name_to_id.insert(module.name.clone(), id);
        self.modules.push(module);
        Ok(id)
    }

    /// Register a building. Building names must be unique.
    pub fn add_building(&mut self, building: Building) -> Result<BuildingId, BuildingError> {
        if self.building_name_to_id.contains_key(&building.name) {
            return Err(BuildingError::DuplicateBuilding(building.name));
        }
        let id = BuildingId(self.buildings.len() as u32);
        self.building_name_to_id.insert(building.name.clone(), id);
        self.buildings.push(building);
        Ok(id)
    }

    /// Derive and register a modded building from an already registered base
    /// building and registered modules.
    ///
    /// When `base` is itself modded, its loadout is carried over: the new
    /// modules are installed next to the existing ones in the same plain
    /// building, sharing its slots, and every bonus is counted once.
    pub fn add_modded_building(
        &mut self,
        name: &str,
        base: &str,
        modules: &[&str],
        beacon_modules: &[&str],
    ) -> Result<BuildingId, BuildingError> {
        let base_building = self.lookup_building(name, base)?;
        let (plain, mut installed, mut beacons) = match &base_building.loadout {
            Some(loadout) => (
                self.lookup_building(name, &loadout.base)?,
                self.lookup_modules(name, &loadout.modules)?,
                self.lookup_modules(name, &loadout.beacon_modules)?,
            ),
            None => (base_building, Vec::new(), Vec::new()),
        };
        installed.extend(self.lookup_modules(name, modules)?);
        beacons.extend(self.lookup_modules(name, beacon_modules)?);
        let building = Building::modded(name, plain, &installed, &beacons)?;
        self.add_building(building)
    }

    fn lookup_building(&self, building: &str, base: &str) -> Result<&Building, BuildingError> {
        self.building_name_to_id
            .get(base)
            .map(|id| &self.buildings[id.index()])
            .ok_or_else(|| BuildingError::UnknownBuilding {
                building: building.to_string(),
                base: base.to_string(),
            })
    }

    fn lookup_modules<S: AsRef<str>>(
        &self,
        building: &str,
        names: &[S],
    ) -> Result<Vec<&Module>, BuildingError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.module_name_to_id
                    .get(name)
                    .map(|id| &self.modules[id.index()])
                    .ok_or_else(|| BuildingError::UnknownModule {
                        building: building.to_string(),
                        module: name.to_string(),
                    })
            })
            .collect()
    }

    /// Register a recipe. References are checked by [`validate`](Self::validate).
    pub fn add_recipe(&mut self, recipe: RecipeDef) -> &mut Self {
        self.recipes.push(recipe);
        self
    }

    pub fn building_id(&self, name: &str) -> Option<BuildingId> {
        self.building_name_to_id.get(name).copied()
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.module_name_to_id.get(name).copied()
    }

    /// Check referential integrity and rate constants. Reports every problem
    /// found, not just the first.
    pub fn validate(&self) -> Vec<ConfigProblem> {
        validation::validate(self)
    }

    /// `true` when [`validate`](Self::validate) finds nothing.
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validate and freeze into an immutable graph.
    pub fn build(self) -> Result<ProductionGraph, GraphError> {
        let problems = self.validate();
        if !problems.is_empty() {
            return Err(GraphError::Invalid(problems));
        }

        let mut graph = ProductionGraph {
            item_names: Vec::new(),
            item_name_to_id: HashMap::new(),
            raw: Vec::new(),
            recipe_of: Vec::new(),
            recipes: Vec::with_capacity(self.recipes.len()),
            buildings: self.buildings,
            building_name_to_id: self.building_name_to_id,
            modules: self.modules,
        };

        for name in &self.raws {
            let id = graph.intern(name);
            graph.raw[id.index()] = true;
        }
        for def in &self.recipes {
            let item = graph.intern(&def.item);
            let ingredients = def
                .ingredients
                .iter()
                .map(|(name, quantity)| Ingredient {
                    item: graph.intern(name),
                    quantity: *quantity,
                })
                .collect();
            let side_outputs = def
                .side_outputs
                .iter()
                .map(|(name, quantity)| Ingredient {
                    item: graph.intern(name),
                    quantity: *quantity,
                })
                .collect();
            // Validation guarantees the building exists.
            let building = graph.building_name_to_id[&def.building];
            let index = graph.recipes.len();
            graph.recipes.push(Recipe {
                item,
                building,
                output: def.output,
                time: def.time,
                ingredients,
                side_outputs,
            });
            graph.recipe_of[item.index()] = Some(index);
        }

        log::debug!(
            "built production graph: {} items, {} recipes, {} buildings",
            graph.item_count(),
            graph.recipe_count(),
            graph.building_count()
        );
        Ok(graph)
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Immutable, validated production graph. Every item is either raw or
/// produced by exactly one recipe.
#[derive(Debug, Clone)]
pub struct ProductionGraph {
    item_names: Vec<String>,
    item_name_to_id: HashMap<String, ItemId>,
    raw: Vec<bool>,
    /// Index into `recipes` for each item; `None` for raw items and side
    /// outputs nothing produces.
    recipe_of: Vec<Option<usize>>,
    recipes: Vec<Recipe>,
    buildings: Vec<Building>,
    building_name_to_id: HashMap<String, BuildingId>,
    modules: Vec<Module>,
}

impl ProductionGraph {
    fn intern(&mut self, name: &str) -> ItemId {
        if let Some(id) = self.item_name_to_id.get(name) {
            return *id;
        }
        let id = ItemId(self.item_names.len() as u32);
        self.item_names.push(name.to_string());
        self.item_name_to_id.insert(name.to_string(), id);
        self.raw.push(false);
        self.recipe_of.push(None);
        id
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn item_name(&self, id: ItemId) -> Option<&str> {
        self.item_names.get(id.index()).map(String::as_str)
    }

    /// `true` for items declared as externally supplied.
    pub fn is_raw(&self, id: ItemId) -> bool {
        self.raw.get(id.index()).copied().unwrap_or(false)
    }

    pub fn recipe(&self, id: ItemId) -> Option<&Recipe> {
        self.recipe_of
            .get(id.index())
            .copied()
            .flatten()
            .map(|index| &self.recipes[index])
    }

    /// `None` for unknown ids and for items that only appear as side outputs.
    pub fn kind(&self, id: ItemId) -> Option<ItemKind> {
        if self.is_raw(id) {
            Some(ItemKind::Raw)
        } else if self.recipe(id).is_some() {
            Some(ItemKind::Recipe)
        } else {
            None
        }
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id.index())
    }

    pub fn building_id(&self, name: &str) -> Option<BuildingId> {
        self.building_name_to_id.get(name).copied()
    }

    /// The building that runs the recipe for `id`, if it is recipe-backed.
    pub fn producer(&self, id: ItemId) -> Option<&Building> {
        self.recipe(id).and_then(|r| self.building(r.building))
    }

    /// Recipe and building for a recipe-backed item.
    pub fn production(&self, id: ItemId) -> Option<(&Recipe, &Building)> {
        let recipe = self.recipe(id)?;
        Some((recipe, self.building(recipe.building)?))
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index())
    }

    /// All items in interning order (raws first, then recipe items).
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &str)> {
        self.item_names
            .iter()
            .enumerate()
            .map(|(i, name)| (ItemId(i as u32), name.as_str()))
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn item_count(&self) -> usize {
        self.item_names.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}
