//! Load-time integrity checks for a production graph.
//!
//! Every check runs to completion so a broken dataset surfaces all of its
//! problems in one pass.

use crate::graph::ProductionGraphBuilder;
use std::collections::{HashMap, HashSet};

/// A single configuration problem found by validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigProblem {
    /// An ingredient names an item that is neither raw nor produced.
    #[error("recipe {recipe} references non-existent ingredient {ingredient}")]
    DanglingIngredient { recipe: String, ingredient: String },

    /// A recipe names a building that was never registered.
    #[error("recipe {recipe} uses unknown building {building}")]
    UnknownBuilding { recipe: String, building: String },

    /// More than one recipe produces the same item.
    #[error("duplicate recipe for {item}")]
    DuplicateRecipe { item: String },

    /// An item is declared raw and also produced by a recipe.
    #[error("{item} is declared raw but also has a recipe")]
    RawWithRecipe { item: String },

    /// A recipe constant (`output`, `time`, or an ingredient quantity) is not
    /// a positive finite number.
    #[error("recipe {recipe} has non-positive {field} ({value})")]
    NonPositiveRecipe {
        recipe: String,
        field: String,
        value: f64,
    },

    /// A building's crafting speed or productivity is not positive.
    #[error("building {building} has non-positive {field} ({value})")]
    NonPositiveBuilding {
        building: String,
        field: &'static str,
        value: f64,
    },
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Run every check over the builder's declarations, in declaration order.
pub(crate) fn validate(builder: &ProductionGraphBuilder) -> Vec<ConfigProblem> {
    let mut problems = Vec::new();

    let raws: HashSet<&str> = builder.raws.iter().map(String::as_str).collect();
    let mut recipe_counts: HashMap<&str, usize> = HashMap::new();
    for recipe in &builder.recipes {
        *recipe_counts.entry(recipe.item.as_str()).or_default() += 1;
    }

    for building in &builder.buildings {
        if !is_positive(building.crafting_speed) {
            problems.push(ConfigProblem::NonPositiveBuilding {
                building: building.name.clone(),
                field: "crafting speed",
                value: building.crafting_speed,
            });
        }
        if !is_positive(building.productivity) {
            problems.push(ConfigProblem::NonPositiveBuilding {
                building: building.name.clone(),
                field: "productivity",
                value: building.productivity,
            });
        }
    }

    let mut reported_duplicates = HashSet::new();
    for recipe in &builder.recipes {
        if raws.contains(recipe.item.as_str()) {
            problems.push(ConfigProblem::RawWithRecipe {
                item: recipe.item.clone(),
            });
        }
        if recipe_counts[recipe.item.as_str()] > 1 && reported_duplicates.insert(recipe.item.as_str())
        {
            problems.push(ConfigProblem::DuplicateRecipe {
                item: recipe.item.clone(),
            });
        }
        if !builder.building_name_to_id.contains_key(&recipe.building) {
            problems.push(ConfigProblem::UnknownBuilding {
                recipe: recipe.item.clone(),
                building: recipe.building.clone(),
            });
        }
        if !is_positive(recipe.output) {
            problems.push(ConfigProblem::NonPositiveRecipe {
                recipe: recipe.item.clone(),
                field: "output".to_string(),
                value: recipe.output,
            });
        }
        if !is_positive(recipe.time) {
            problems.push(ConfigProblem::NonPositiveRecipe {
                recipe: recipe.item.clone(),
                field: "time".to_string(),
                value: recipe.time,
            });
        }
        for (ingredient, quantity) in &recipe.ingredients {
            if !raws.contains(ingredient.as_str()) && !recipe_counts.contains_key(ingredient.as_str())
            {
                problems.push(ConfigProblem::DanglingIngredient {
                    recipe: recipe.item.clone(),
                    ingredient: ingredient.clone(),
                });
            }
            if !is_positive(*quantity) {
                problems.push(ConfigProblem::NonPositiveRecipe {
                    recipe: recipe.item.clone(),
                    field: format!("quantity of {ingredient}"),
                    value: *quantity,
                });
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use crate::building::Building;
    use crate::graph::{ProductionGraphBuilder, RecipeDef};

    use super::*;

    fn base_builder() -> ProductionGraphBuilder {
        let mut b = ProductionGraphBuilder::new();
        b.add_raw("iron-ore").add_raw("copper-ore");
        b.add_building(Building::new("furnace", 2.0)).unwrap();
        b.add_building(Building::new("assembler", 0.75)).unwrap();
        b.add_recipe(RecipeDef::new("iron-plate", "furnace", 1.0, 3.2).ingredient("iron-ore", 1.0));
        b.add_recipe(
            RecipeDef::new("copper-plate", "furnace", 1.0, 3.2).ingredient("copper-ore", 1.0),
        );
        b
    }

    #[test]
    fn consistent_dataset_has_no_problems() {
        let b = base_builder();
        assert!(b.validate().is_empty());
        assert!(b.is_valid());
    }

    #[test]
    fn dangling_ingredient_is_reported() {
        let mut b = base_builder();
        b.add_recipe(RecipeDef::new("pipe", "assembler", 1.0, 0.5).ingredient("iron-plat", 1.0));
        assert_eq!(
            b.validate(),
            vec![ConfigProblem::DanglingIngredient {
                recipe: "pipe".to_string(),
                ingredient: "iron-plat".to_string(),
            }]
        );
    }

    #[test]
    fn every_problem_is_reported_not_just_the_first() {
        let mut b = base_builder();
        b.add_recipe(
            RecipeDef::new("circuit", "assembler", 1.0, 0.5)
                .ingredient("iron-plat", 1.0)
                .ingredient("copper-cable", 3.0),
        );
        b.add_recipe(RecipeDef::new("gear", "assembler", 1.0, 0.5).ingredient("irn-plate", 2.0));
        let problems = b.validate();
        assert_eq!(problems.len(), 3);
        let dangling: Vec<_> = problems
            .iter()
            .map(|p| match p {
                ConfigProblem::DanglingIngredient { recipe, ingredient } => {
                    (recipe.as_str(), ingredient.as_str())
                }
                other => panic!("unexpected problem: {other:?}"),
            })
            .collect();
        assert_eq!(
            dangling,
            vec![
                ("circuit", "iron-plat"),
                ("circuit", "copper-cable"),
                ("gear", "irn-plate"),
            ]
        );
    }

    #[test]
    fn unknown_building_is_reported() {
        let mut b = base_builder();
        b.add_recipe(RecipeDef::new("gear", "assembler-9", 1.0, 0.5).ingredient("iron-plate", 2.0));
        assert_eq!(
            b.validate(),
            vec![ConfigProblem::UnknownBuilding {
                recipe: "gear".to_string(),
                building: "assembler-9".to_string(),
            }]
        );
    }

    #[test]
    fn duplicate_recipe_is_reported_once() {
        let mut b = base_builder();
        b.add_recipe(RecipeDef::new("iron-plate", "assembler", 1.0, 1.0).ingredient("iron-ore", 1.0));
        b.add_recipe(RecipeDef::new("iron-plate", "assembler", 2.0, 1.0).ingredient("iron-ore", 1.0));
        let problems = b.validate();
        assert_eq!(
            problems,
            vec![ConfigProblem::DuplicateRecipe {
                item: "iron-plate".to_string()
            }]
        );
    }

    #[test]
    fn raw_with_recipe_is_reported() {
        let mut b = base_builder();
        b.add_recipe(RecipeDef::new("iron-ore", "assembler", 1.0, 1.0));
        assert_eq!(
            b.validate(),
            vec![ConfigProblem::RawWithRecipe {
                item: "iron-ore".to_string()
            }]
        );
    }

    #[test]
    fn non_positive_constants_are_reported() {
        let mut b = base_builder();
        b.add_building(Building::new("broken", 0.0)).unwrap();
        b.add_recipe(
            RecipeDef::new("gear", "assembler", 0.0, -1.0).ingredient("iron-plate", 0.0),
        );
        let problems = b.validate();
        assert_eq!(problems.len(), 4);
        assert!(matches!(
            &problems[0],
            ConfigProblem::NonPositiveBuilding { building, field: "crafting speed", .. } if building == "broken"
        ));
        assert!(matches!(
            &problems[1],
            ConfigProblem::NonPositiveRecipe { field, .. } if field == "output"
        ));
        assert!(matches!(
            &problems[2],
            ConfigProblem::NonPositiveRecipe { field, .. } if field == "time"
        ));
        assert!(matches!(
            &problems[3],
            ConfigProblem::NonPositiveRecipe { field, .. } if field == "quantity of iron-plate"
        ));
    }

    #[test]
    fn nan_rate_is_not_positive() {
        let mut b = base_builder();
        b.add_recipe(RecipeDef::new("gear", "assembler", f64::NAN, 1.0).ingredient("iron-plate", 2.0));
        assert_eq!(b.validate().len(), 1);
    }

    #[test]
    fn problem_display_names_recipe_and_ingredient() {
        let p = ConfigProblem::DanglingIngredient {
            recipe: "pipe".to_string(),
            ingredient: "iron-plat".to_string(),
        };
        assert_eq!(
            format!("{p}"),
            "recipe pipe references non-existent ingredient iron-plat"
        );
    }
}
