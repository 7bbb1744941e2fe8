//! Loading a dataset directory into a validated production graph and plan.
//!
//! A dataset directory contains:
//!
//! | base name   | required | contents                          |
//! |-------------|----------|-----------------------------------|
//! | `raws`      | yes      | list of raw item names            |
//! | `modules`   | no       | list of [`ModuleData`]            |
//! | `buildings` | yes      | list of [`BuildingData`]          |
//! | `recipes`   | yes      | list of [`RecipeData`]            |
//! | `plan`      | no       | a single [`PlanData`]             |
//!
//! each as `.ron`, `.toml`, or `.json`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ratio_core::building::{Building, Module};
use ratio_core::graph::{ProductionGraph, ProductionGraphBuilder, RecipeDef};
use ratio_core::resolver::Demand;
use serde::de::DeserializeOwned;

use crate::loader::{
    DataLoadError, check_duplicate, deserialize_file, deserialize_list, find_data_file,
    require_data_file, resolve_name,
};
use crate::schema::*;

/// What to resolve and how to display it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub lane_capacity: f64,
    pub demands: Vec<Demand>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            lane_capacity: DEFAULT_LANE_CAPACITY,
            demands: Vec::new(),
        }
    }
}

/// A loaded dataset: the validated graph and the plan shipped alongside it.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub graph: ProductionGraph,
    pub plan: Plan,
}

/// The entries of one data file, kept with its path for error reporting.
struct DataFile<T> {
    path: PathBuf,
    entries: Vec<T>,
}

/// Load and validate every data file in `dir`.
///
/// Loading does not stop at the first problem. Every file is read, every
/// name reference is checked, and the graph is validated, so the error
/// carries all of them (see [`DataLoadError::problems`]). Graph validation
/// is skipped when a file could not be read at all, since its missing
/// declarations would only show up again as dangling references.
pub fn load_dataset(dir: &Path) -> Result<Dataset, DataLoadError> {
    let mut problems = Vec::new();

    let raws = read_list::<String>(require_data_file(dir, "raws").map(Some), "raws");
    let modules = read_list::<ModuleData>(find_data_file(dir, "modules"), "modules");
    let buildings =
        read_list::<BuildingData>(require_data_file(dir, "buildings").map(Some), "buildings");
    let recipes =
        read_list::<RecipeData>(require_data_file(dir, "recipes").map(Some), "recipes");
    let plan = find_data_file(dir, "plan")
        .and_then(|path| path.as_deref().map(load_plan).transpose());

    let raws = collect(raws, &mut problems).flatten();
    let modules = collect(modules, &mut problems).flatten();
    let buildings = collect(buildings, &mut problems).flatten();
    let recipes = collect(recipes, &mut problems).flatten();
    let plan = collect(plan, &mut problems).flatten().unwrap_or_default();
    let files_read = problems.is_empty();

    let mut builder = ProductionGraphBuilder::new();
    if let Some(file) = raws {
        register_raws(file, &mut builder, &mut problems);
    }
    let module_names = match modules {
        Some(file) => register_modules(file, &mut builder, &mut problems),
        None => HashSet::new(),
    };
    if let Some(file) = buildings {
        register_buildings(file, &module_names, &mut builder, &mut problems);
    }
    if let Some(file) = recipes {
        register_recipes(file, &mut builder, &mut problems);
    }

    if files_read {
        problems.extend(builder.validate().into_iter().map(DataLoadError::from));
    }
    if let Some(err) = DataLoadError::from_problems(problems) {
        return Err(err);
    }

    let graph = builder.build()?;
    log::info!(
        "loaded dataset {}: {} items, {} recipes, {} buildings, {} demands",
        dir.display(),
        graph.item_count(),
        graph.recipe_count(),
        graph.building_count(),
        plan.demands.len()
    );
    Ok(Dataset { graph, plan })
}

/// Load a plan file on its own.
pub fn load_plan(path: &Path) -> Result<Plan, DataLoadError> {
    let data: PlanData = deserialize_file(path)?;
    if !(data.lane_capacity.is_finite() && data.lane_capacity > 0.0) {
        return Err(DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: format!("lane_capacity must be positive, got {}", data.lane_capacity),
        });
    }
    Ok(Plan {
        lane_capacity: data.lane_capacity,
        demands: data
            .demands
            .into_iter()
            .map(|d| Demand::new(&d.item, d.rate))
            .collect(),
    })
}

fn read_list<T: DeserializeOwned>(
    path: Result<Option<PathBuf>, DataLoadError>,
    toml_key: &str,
) -> Result<Option<DataFile<T>>, DataLoadError> {
    let Some(path) = path? else {
        return Ok(None);
    };
    let entries = deserialize_list(&path, toml_key)?;
    Ok(Some(DataFile { path, entries }))
}

/// Move an error into `problems`.
fn collect<T>(result: Result<T, DataLoadError>, problems: &mut Vec<DataLoadError>) -> Option<T> {
    result.map_err(|e| problems.push(e)).ok()
}

fn register_raws(
    file: DataFile<String>,
    builder: &mut ProductionGraphBuilder,
    problems: &mut Vec<DataLoadError>,
) {
    let mut seen: HashSet<String> = HashSet::new();
    for raw in file.entries {
        if collect(check_duplicate(&seen, &raw, &file.path), problems).is_some() {
            builder.add_raw(&raw);
            seen.insert(raw);
        }
    }
}

/// Returns the declared module names.
fn register_modules(
    file: DataFile<ModuleData>,
    builder: &mut ProductionGraphBuilder,
    problems: &mut Vec<DataLoadError>,
) -> HashSet<String> {
    let mut names: HashSet<String> = HashSet::new();
    for m in file.entries {
        if collect(check_duplicate(&names, &m.name, &file.path), problems).is_none() {
            continue;
        }
        let module = Module::new(&m.name)
            .with_speed(m.speed)
            .with_productivity(m.productivity)
            .with_power(m.power);
        collect(builder.add_module(module).map_err(DataLoadError::from), problems);
        names.insert(m.name);
    }
    names
}

/// Plain buildings are registered first. Modded buildings follow in as many
/// passes as it takes for each base to exist, so a modded building may build
/// on another modded building declared anywhere in the file. A building that
/// fails takes every building derived from it along, without further reports.
fn register_buildings(
    file: DataFile<BuildingData>,
    module_names: &HashSet<String>,
    builder: &mut ProductionGraphBuilder,
    problems: &mut Vec<DataLoadError>,
) {
    let path = &file.path;

    let mut declared: HashSet<String> = HashSet::new();
    let mut buildings = Vec::new();
    for b in file.entries {
        if collect(check_duplicate(&declared, &b.name, path), problems).is_some() {
            declared.insert(b.name.clone());
            buildings.push(b);
        }
    }

    let mut failed: HashSet<String> = HashSet::new();
    let mut pending = Vec::new();
    for b in buildings {
        match b.kind {
            BuildingKindData::Plain {
                crafting_speed,
                productivity,
                slots,
            } => {
                let building = Building::new(&b.name, crafting_speed)
                    .with_productivity(productivity)
                    .with_slots(slots);
                if collect(builder.add_building(building).map_err(DataLoadError::from), problems)
                    .is_none()
                {
                    failed.insert(b.name);
                }
            }
            BuildingKindData::Modded {
                base,
                modules,
                beacon_modules,
            } => {
                let mut resolved =
                    collect(resolve_name(&declared, &base, path, "building"), problems).is_some();
                for module in modules.iter().chain(&beacon_modules) {
                    resolved &=
                        collect(resolve_name(module_names, module, path, "module"), problems)
                            .is_some();
                }
                if resolved {
                    pending.push((b.name, base, modules, beacon_modules));
                } else {
                    failed.insert(b.name);
                }
            }
        }
    }

    while !pending.is_empty() {
        let before = pending.len();
        let mut blocked = Vec::new();
        for (name, base, modules, beacon_modules) in pending {
            if failed.contains(&base) {
                failed.insert(name);
                continue;
            }
            if builder.building_id(&base).is_none() {
                blocked.push((name, base, modules, beacon_modules));
                continue;
            }
            let modules: Vec<&str> = modules.iter().map(String::as_str).collect();
            let beacon_modules: Vec<&str> = beacon_modules.iter().map(String::as_str).collect();
            let added = builder
                .add_modded_building(&name, &base, &modules, &beacon_modules)
                .map_err(DataLoadError::from);
            if collect(added, problems).is_none() {
                failed.insert(name);
            }
        }
        if blocked.len() == before {
            // Every remaining base is itself waiting: a cycle of modded buildings.
            problems.extend(blocked.into_iter().map(|(building, base, ..)| {
                DataLoadError::CyclicBase {
                    file: path.clone(),
                    building,
                    base,
                }
            }));
            break;
        }
        pending = blocked;
    }
}

fn register_recipes(
    file: DataFile<RecipeData>,
    builder: &mut ProductionGraphBuilder,
    problems: &mut Vec<DataLoadError>,
) {
    let mut seen: HashSet<String> = HashSet::new();
    for r in file.entries {
        if collect(check_duplicate(&seen, &r.item, &file.path), problems).is_none() {
            continue;
        }
        let mut def = RecipeDef::new(&r.item, &r.building, r.output, r.time);
        for ingredient in &r.ingredients {
            def = def.ingredient(ingredient.item(), ingredient.quantity());
        }
        for (item, quantity) in &r.side_outputs {
            def = def.side_output(item, *quantity);
        }
        builder.add_recipe(def);
        seen.insert(r.item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratio_core::building::BuildingError;
    use ratio_core::graph::ItemKind;
    use ratio_core::validation::ConfigProblem;
    use std::fs;
    use std::path::PathBuf;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ratio_dataset_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    /// A minimal RON dataset: ore is mined, plate is smelted.
    fn write_minimal(dir: &Path) {
        fs::write(dir.join("raws.ron"), r#"["ore"]"#).unwrap();
        fs::write(
            dir.join("buildings.ron"),
            r#"[(name: "smelter", kind: Plain(crafting_speed: 2.0))]"#,
        )
        .unwrap();
        fs::write(
            dir.join("recipes.ron"),
            r#"[(item: "plate", building: "smelter", time: 2.0, ingredients: ["ore"])]"#,
        )
        .unwrap();
    }

    #[test]
    fn minimal_dataset_without_plan() {
        let dir = make_test_dir("minimal");
        write_minimal(&dir);

        let dataset = load_dataset(&dir).unwrap();
        let plate = dataset.graph.item_id("plate").unwrap();
        assert_eq!(dataset.graph.kind(plate), Some(ItemKind::Recipe));
        assert_eq!(dataset.plan, Plan::default());

        cleanup(&dir);
    }

    #[test]
    fn plan_is_loaded_when_present() {
        let dir = make_test_dir("plan");
        write_minimal(&dir);
        fs::write(
            dir.join("plan.toml"),
            r#"
lane_capacity = 15.0

[[demands]]
item = "plate"
rate = 4.0

[[demands]]
item = "ore"
"#,
        )
        .unwrap();

        let dataset = load_dataset(&dir).unwrap();
        assert_eq!(dataset.plan.lane_capacity, 15.0);
        assert_eq!(
            dataset.plan.demands,
            vec![Demand::new("plate", 4.0), Demand::placeholder("ore")]
        );

        cleanup(&dir);
    }

    #[test]
    fn non_positive_lane_capacity_is_rejected() {
        let dir = make_test_dir("bad_lane");
        write_minimal(&dir);
        fs::write(dir.join("plan.ron"), "(lane_capacity: 0.0)").unwrap();

        let result = load_dataset(&dir);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn missing_recipes_file_is_an_error() {
        let dir = make_test_dir("no_recipes");
        write_minimal(&dir);
        fs::remove_file(dir.join("recipes.ron")).unwrap();

        let result = load_dataset(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::MissingRequired { ref file, .. }) if file == "recipes"
        ));

        cleanup(&dir);
    }

    #[test]
    fn modded_buildings_resolve_in_any_order() {
        let dir = make_test_dir("modded_order");
        write_minimal(&dir);
        fs::write(
            dir.join("modules.json"),
            r#"[{"name": "prod-1", "speed": -0.05, "productivity": 0.04},
                {"name": "speed-2", "speed": 0.3}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("buildings.ron"),
            r#"[
                (name: "smelter:beacon", kind: Modded(base: "smelter:p1", beacon_modules: ["speed-2", "speed-2"])),
                (name: "smelter:p1", kind: Modded(base: "smelter", modules: ["prod-1"])),
                (name: "smelter", kind: Plain(crafting_speed: 2.0, slots: 2)),
            ]"#,
        )
        .unwrap();

        let dataset = load_dataset(&dir).unwrap();
        let id = dataset.graph.building_id("smelter:beacon").unwrap();
        let building = dataset.graph.building(id).unwrap();
        // One loadout on the plain smelter: 2.0 * (1 - 0.05 + 2 * 0.3 / 2)
        assert!((building.crafting_speed - 2.0 * 1.25).abs() < 1e-9);
        assert!((building.productivity - 1.04).abs() < 1e-9);
        let loadout = building.loadout.as_ref().unwrap();
        assert_eq!(loadout.base, "smelter");
        assert_eq!(loadout.modules, vec!["prod-1"]);

        cleanup(&dir);
    }

    #[test]
    fn modded_building_with_unknown_module_is_unresolved() {
        let dir = make_test_dir("modded_unknown");
        write_minimal(&dir);
        fs::write(
            dir.join("buildings.ron"),
            r#"[
                (name: "smelter", kind: Plain(crafting_speed: 2.0, slots: 2)),
                (name: "smelter:p9", kind: Modded(base: "smelter", modules: ["prod-9"])),
            ]"#,
        )
        .unwrap();

        let result = load_dataset(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "module", .. }) if name == "prod-9"
        ));

        cleanup(&dir);
    }

    #[test]
    fn cyclic_modded_buildings_are_rejected() {
        let dir = make_test_dir("modded_cycle");
        write_minimal(&dir);
        fs::write(
            dir.join("buildings.ron"),
            r#"[
                (name: "smelter", kind: Plain(crafting_speed: 2.0)),
                (name: "a", kind: Modded(base: "b")),
                (name: "b", kind: Modded(base: "a")),
            ]"#,
        )
        .unwrap();

        let err = load_dataset(&dir).unwrap_err();
        let cyclic: Vec<&str> = err
            .problems()
            .iter()
            .map(|p| match p {
                DataLoadError::CyclicBase { building, .. } => building.as_str(),
                other => panic!("expected CyclicBase, got: {other:?}"),
            })
            .collect();
        assert_eq!(cyclic, vec!["a", "b"]);

        cleanup(&dir);
    }

    #[test]
    fn buildings_derived_from_a_failed_building_are_not_reported_again() {
        let dir = make_test_dir("modded_cascade");
        write_minimal(&dir);
        fs::write(
            dir.join("buildings.ron"),
            r#"[
                (name: "smelter", kind: Plain(crafting_speed: 2.0, slots: 2)),
                (name: "smelter:s9+beacon", kind: Modded(base: "smelter:s9")),
                (name: "smelter:s9", kind: Modded(base: "smelter", modules: ["speed-9"])),
            ]"#,
        )
        .unwrap();

        let result = load_dataset(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, .. }) if name == "speed-9"
        ));

        cleanup(&dir);
    }

    #[test]
    fn too_many_modules_is_a_building_error() {
        let dir = make_test_dir("too_many");
        write_minimal(&dir);
        fs::write(dir.join("modules.ron"), r#"[(name: "speed-1", speed: 0.2)]"#).unwrap();
        fs::write(
            dir.join("buildings.ron"),
            r#"[
                (name: "smelter", kind: Plain(crafting_speed: 2.0, slots: 1)),
                (name: "smelter:2s1", kind: Modded(base: "smelter", modules: ["speed-1", "speed-1"])),
            ]"#,
        )
        .unwrap();

        let result = load_dataset(&dir);
        assert!(matches!(result, Err(DataLoadError::Building(_))));

        cleanup(&dir);
    }

    #[test]
    fn duplicate_recipe_is_rejected() {
        let dir = make_test_dir("dup_recipe");
        write_minimal(&dir);
        fs::write(
            dir.join("recipes.ron"),
            r#"[
                (item: "plate", building: "smelter", time: 2.0, ingredients: ["ore"]),
                (item: "plate", building: "smelter", time: 1.0, ingredients: ["ore"]),
            ]"#,
        )
        .unwrap();

        let result = load_dataset(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "plate"
        ));

        cleanup(&dir);
    }

    #[test]
    fn inconsistent_recipes_report_every_problem() {
        let dir = make_test_dir("inconsistent");
        write_minimal(&dir);
        fs::write(
            dir.join("recipes.ron"),
            r#"[
                (item: "plate", building: "smelter", time: 2.0, ingredients: ["ore", "flux"]),
                (item: "gear", building: "press", time: 0.5, ingredients: [("plate", 2.0)]),
            ]"#,
        )
        .unwrap();

        match load_dataset(&dir) {
            Err(DataLoadError::Invalid(problems)) => {
                assert_eq!(problems.len(), 2);
                assert!(matches!(
                    &problems[0],
                    DataLoadError::Config(ConfigProblem::DanglingIngredient { ingredient, .. })
                        if ingredient == "flux"
                ));
                assert!(matches!(
                    &problems[1],
                    DataLoadError::Config(ConfigProblem::UnknownBuilding { building, .. })
                        if building == "press"
                ));
            }
            other => panic!("expected Invalid, got: {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn building_and_recipe_problems_are_reported_together() {
        let dir = make_test_dir("all_problems");
        write_minimal(&dir);
        fs::write(dir.join("modules.ron"), r#"[(name: "speed-1", speed: 0.2)]"#).unwrap();
        fs::write(
            dir.join("buildings.ron"),
            r#"[
                (name: "smelter", kind: Plain(crafting_speed: 2.0, slots: 1)),
                (name: "a", kind: Modded(base: "smelter", modules: ["speed-1", "speed-1"])),
                (name: "b", kind: Modded(base: "smelter", modules: ["speed-1", "speed-1", "speed-1"])),
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.join("recipes.ron"),
            r#"[(item: "plate", building: "smelter", time: 2.0, ingredients: ["ore", "flux"])]"#,
        )
        .unwrap();

        let err = load_dataset(&dir).unwrap_err();
        let problems = err.problems();
        assert_eq!(problems.len(), 3);
        assert!(matches!(
            problems[0],
            DataLoadError::Building(BuildingError::TooManyModules { installed: 2, .. })
        ));
        assert!(matches!(
            problems[1],
            DataLoadError::Building(BuildingError::TooManyModules { installed: 3, .. })
        ));
        assert!(matches!(
            problems[2],
            DataLoadError::Config(ConfigProblem::DanglingIngredient { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn unreadable_file_skips_graph_validation() {
        let dir = make_test_dir("unreadable");
        write_minimal(&dir);
        fs::write(dir.join("raws.ron"), r#"["ore", "ore"]"#).unwrap();
        fs::write(dir.join("buildings.ron"), "not ron {{").unwrap();

        let err = load_dataset(&dir).unwrap_err();
        let problems = err.problems();
        // The recipe's missing smelter is not reported on top of the parse error.
        assert_eq!(problems.len(), 2);
        assert!(matches!(problems[0], DataLoadError::Parse { .. }));
        assert!(matches!(
            problems[1],
            DataLoadError::DuplicateName { ref name, .. } if name == "ore"
        ));

        cleanup(&dir);
    }
}
