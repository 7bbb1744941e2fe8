//! Buildings, modules, and the derivation of modded buildings.
//!
//! A modded building is a base building with modules installed in its slots
//! and, optionally, modules supplied by surrounding beacons. Beacon modules
//! count at half strength. The derived crafting speed and productivity are
//! computed once, when the building is constructed, and are constants for
//! every calculation afterwards.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while constructing a building.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildingError {
    #[error("{building} only has {slots} module slots, {installed} modules installed")]
    TooManyModules {
        building: String,
        slots: u32,
        installed: usize,
    },
    #[error("unknown base building '{base}' for '{building}'")]
    UnknownBuilding { building: String, base: String },
    #[error("base building '{base}' of '{building}' already has modules installed")]
    ModdedBase { building: String, base: String },
    #[error("unknown module '{module}' in '{building}'")]
    UnknownModule { building: String, module: String },
    #[error("duplicate building '{0}'")]
    DuplicateBuilding(String),
    #[error("duplicate module '{0}'")]
    DuplicateModule(String),
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// A module that can be installed in a building slot or a beacon.
///
/// Bonuses are fractional: `speed: 0.2` means +20% crafting speed,
/// `productivity: -0.05` means 5% less output. `power` is informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub productivity: f64,
    #[serde(default)]
    pub power: f64,
}

impl Module {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            speed: 0.0,
            productivity: 0.0,
            power: 0.0,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_productivity(mut self, productivity: f64) -> Self {
        self.productivity = productivity;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }
}

/// Summed module bonuses, beacon modules already halved.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct ModuleBonuses {
    speed: f64,
    productivity: f64,
}

impl ModuleBonuses {
    fn resolve(modules: &[&Module], beacon_modules: &[&Module]) -> Self {
        let mut bonuses = Self::default();
        for m in modules {
            bonuses.speed += m.speed;
            bonuses.productivity += m.productivity;
        }
        for m in beacon_modules {
            bonuses.speed += m.speed / 2.0;
            bonuses.productivity += m.productivity / 2.0;
        }
        bonuses
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// The modules a modded building was derived from. Kept for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub base: String,
    pub modules: Vec<String>,
    pub beacon_modules: Vec<String>,
}

/// A production building with its effective crafting speed and productivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
    /// Crafting cycles per second relative to a recipe's nominal time.
    pub crafting_speed: f64,
    /// Output multiplier. 1.0 means no bonus output.
    pub productivity: f64,
    /// Number of module slots.
    pub slots: u32,
    /// Present when the building was derived from a base building.
    pub loadout: Option<Loadout>,
}

impl Building {
    /// A plain building with productivity 1 and no module slots.
    pub fn new(name: &str, crafting_speed: f64) -> Self {
        Self {
            name: name.to_string(),
            crafting_speed,
            productivity: 1.0,
            slots: 0,
            loadout: None,
        }
    }

    pub fn with_slots(mut self, slots: u32) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_productivity(mut self, productivity: f64) -> Self {
        self.productivity = productivity;
        self
    }

    /// Derive a modded building from `base`.
    ///
    /// `productivity = 1 + Σ module + Σ beacon / 2` and
    /// `crafting_speed = base.crafting_speed × (1 + Σ module + Σ beacon / 2)`.
    /// Beacon modules do not occupy slots of the base building.
    ///
    /// `base` must be a plain building. To stack modules on a modded
    /// building, derive again from its base with both loadouts combined, as
    /// [`ProductionGraphBuilder::add_modded_building`] does.
    ///
    /// [`ProductionGraphBuilder::add_modded_building`]: crate::graph::ProductionGraphBuilder::add_modded_building
    pub fn modded(
        name: &str,
        base: &Building,
        modules: &[&Module],
        beacon_modules: &[&Module],
    ) -> Result<Self, BuildingError> {
        if base.is_modded() {
            return Err(BuildingError::ModdedBase {
                building: name.to_string(),
                base: base.name.clone(),
            });
        }
        if modules.len() > base.slots as usize {
            return Err(BuildingError::TooManyModules {
                building: base.name.clone(),
                slots: base.slots,
                installed: modules.len(),
            });
        }

        let bonuses = ModuleBonuses::resolve(modules, beacon_modules);

        Ok(Self {
            name: name.to_string(),
            crafting_speed: base.crafting_speed * (1.0 + bonuses.speed),
            productivity: 1.0 + bonuses.productivity,
            slots: base.slots,
            loadout: Some(Loadout {
                base: base.name.clone(),
                modules: modules.iter().map(|m| m.name.clone()).collect(),
                beacon_modules: beacon_modules.iter().map(|m| m.name.clone()).collect(),
            }),
        })
    }

    /// Whether this building was derived from a base building.
    pub fn is_modded(&self) -> bool {
        self.loadout.is_some()
    }
}
