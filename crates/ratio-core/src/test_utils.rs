//! Shared fixtures for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::building::{Building, Module};
use crate::graph::{ProductionGraph, ProductionGraphBuilder, RecipeDef};
use crate::resolver::{Aggregate, Resolution};

// ===========================================================================
// Lookup helpers
// ===========================================================================

/// The aggregate for `name`, panicking if the run never touched it.
pub fn aggregate(graph: &ProductionGraph, resolution: &Resolution, name: &str) -> Aggregate {
    let id = graph
        .item_id(name)
        .unwrap_or_else(|| panic!("no item named {name}"));
    *resolution
        .aggregate(id)
        .unwrap_or_else(|| panic!("{name} was not reached"))
}

// ===========================================================================
// Small graphs
// ===========================================================================

/// Raw `ore`; `plate` made in a speed-2 `smelter` from 1 ore per 2s cycle.
pub fn ore_plate_graph() -> ProductionGraph {
    let mut b = ProductionGraphBuilder::new();
    b.add_raw("ore");
    b.add_building(Building::new("smelter", 2.0)).unwrap();
    b.add_recipe(RecipeDef::new("plate", "smelter", 1.0, 2.0).ingredient("ore", 1.0));
    b.build().unwrap()
}

/// Raw `plate`; `gear` in a `press` with productivity 1.5, 2 plates each.
pub fn productive_graph() -> ProductionGraph {
    let mut b = ProductionGraphBuilder::new();
    b.add_raw("plate");
    b.add_building(Building::new("press", 1.0).with_productivity(1.5))
        .unwrap();
    b.add_recipe(RecipeDef::new("gear", "press", 1.0, 0.5).ingredient("plate", 2.0));
    b.build().unwrap()
}

/// A diamond: `circuit` needs `plate` directly and through `cable`.
///
/// ```text
/// circuit (assembler, 1 per 0.5s) <- 1 plate, 3 cable
/// cable   (assembler, 2 per 0.5s) <- 1 plate
/// plate   (furnace,   1 per 1s)   <- 1 ore
/// ```
pub fn circuit_graph() -> ProductionGraph {
    let mut b = ProductionGraphBuilder::new();
    b.add_raw("ore");
    b.add_building(Building::new("furnace", 1.0)).unwrap();
    b.add_building(Building::new("assembler", 1.0)).unwrap();
    b.add_recipe(RecipeDef::new("plate", "furnace", 1.0, 1.0).ingredient("ore", 1.0));
    b.add_recipe(RecipeDef::new("cable", "assembler", 2.0, 0.5).ingredient("plate", 1.0));
    b.add_recipe(
        RecipeDef::new("circuit", "assembler", 1.0, 0.5)
            .ingredient("plate", 1.0)
            .ingredient("cable", 3.0),
    );
    b.build().unwrap()
}

/// One recipe in a building whose name sorts after every plausible sentinel.
pub fn zoo_graph() -> ProductionGraph {
    let mut b = ProductionGraphBuilder::new();
    b.add_raw("ore");
    b.add_building(Building::new("zz-press", 1.0)).unwrap();
    b.add_recipe(RecipeDef::new("widget", "zz-press", 1.0, 1.0).ingredient("ore", 1.0));
    b.build().unwrap()
}

// ===========================================================================
// Larger graphs
// ===========================================================================

/// A slice of the vanilla science chain with modded assemblers.
pub fn science_graph() -> ProductionGraph {
    let mut b = ProductionGraphBuilder::new();
    for raw in ["iron-ore", "copper-ore", "coal", "stone", "petroleum-gas", "water"] {
        b.add_raw(raw);
    }
    b.add_module(Module::new("prod-1").with_speed(-0.05).with_productivity(0.04))
        .unwrap();
    b.add_building(Building::new("steel-furnace", 2.0)).unwrap();
    b.add_building(Building::new("assembler-2", 0.75).with_slots(2))
        .unwrap();
    b.add_building(Building::new("chemical-plant", 1.0).with_slots(3))
        .unwrap();
    b.add_modded_building("assembler-2:2p1", "assembler-2", &["prod-1", "prod-1"], &[])
        .unwrap();

    let a = "assembler-2:2p1";
    b.add_recipe(RecipeDef::new("iron-plate", "steel-furnace", 1.0, 3.2).ingredient("iron-ore", 1.0));
    b.add_recipe(
        RecipeDef::new("copper-plate", "steel-furnace", 1.0, 3.2).ingredient("copper-ore", 1.0),
    );
    b.add_recipe(
        RecipeDef::new("steel-plate", "steel-furnace", 1.0, 16.0).ingredient("iron-plate", 5.0),
    );
    b.add_recipe(RecipeDef::new("copper-cable", a, 2.0, 0.5).ingredient("copper-plate", 1.0));
    b.add_recipe(
        RecipeDef::new("electronic-circuit", a, 1.0, 0.5)
            .ingredient("iron-plate", 1.0)
            .ingredient("copper-cable", 3.0),
    );
    b.add_recipe(
        RecipeDef::new("plastic-bar", "chemical-plant", 2.0, 1.0)
            .ingredient("coal", 1.0)
            .ingredient("petroleum-gas", 20.0),
    );
    b.add_recipe(
        RecipeDef::new("sulfur", "chemical-plant", 2.0, 1.0)
            .ingredient("water", 30.0)
            .ingredient("petroleum-gas", 30.0),
    );
    b.add_recipe(
        RecipeDef::new("advanced-circuit", a, 1.0, 6.0)
            .ingredient("plastic-bar", 2.0)
            .ingredient("copper-cable", 4.0)
            .ingredient("electronic-circuit", 2.0),
    );
    b.add_recipe(RecipeDef::new("iron-gear-wheel", a, 1.0, 0.5).ingredient("iron-plate", 2.0));
    b.add_recipe(RecipeDef::new("pipe", "assembler-2", 1.0, 0.5).ingredient("iron-plate", 1.0));
    b.add_recipe(
        RecipeDef::new("engine-unit", a, 1.0, 10.0)
            .ingredient("steel-plate", 1.0)
            .ingredient("iron-gear-wheel", 1.0)
            .ingredient("pipe", 2.0),
    );
    b.add_recipe(
        RecipeDef::new("chemical-science-pack", a, 2.0, 24.0)
            .ingredient("sulfur", 1.0)
            .ingredient("advanced-circuit", 3.0)
            .ingredient("engine-unit", 2.0),
    );
    b.build().unwrap()
}

/// A layered graph for benchmarks: `layers` layers of `width` recipes, each
/// consuming every recipe of the layer below, over `width` raw items.
pub fn layered_graph(layers: usize, width: usize) -> ProductionGraph {
    let mut b = ProductionGraphBuilder::new();
    b.add_building(Building::new("assembler", 1.25)).unwrap();
    for i in 0..width {
        b.add_raw(&format!("raw-{i}"));
    }
    for layer in 1..=layers {
        for i in 0..width {
            let mut recipe = RecipeDef::new(&format!("l{layer}-{i}"), "assembler", 1.0, 1.0);
            for j in 0..width {
                let below = if layer == 1 {
                    format!("raw-{j}")
                } else {
                    format!("l{}-{j}", layer - 1)
                };
                recipe = recipe.ingredient(&below, 1.0 + (i + j) as f64 % 3.0);
            }
            b.add_recipe(recipe);
        }
    }
    b.build().unwrap()
}
