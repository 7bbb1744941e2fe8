//! Ratio Core -- throughput planning for factory-building games.
//!
//! Given a recipe dataset and a list of output demands ("0.75 utility science
//! packs per second, and whatever circuits that takes"), works out the
//! throughput of every intermediate and raw item and how many machines of
//! each kind are needed.
//!
//! # Pipeline
//!
//! 1. **Build** -- Declare raws, modules, buildings, and recipes on a
//!    [`graph::ProductionGraphBuilder`]. Modded buildings are derived eagerly.
//! 2. **Validate** -- [`graph::ProductionGraphBuilder::build`] checks the whole
//!    dataset and reports every problem at once.
//! 3. **Resolve** -- [`resolver::Resolver::resolve`] expands each root demand
//!    in order, accumulating per-item totals and a trace.
//! 4. **Report** -- [`report::Report`] sorts the totals for display.
//!
//! ```rust,ignore
//! let graph = builder.build()?;
//! let resolution = Resolver::new(&graph).resolve(&[Demand::new("plate", 4.0)])?;
//! print!("{}", resolution.trace);
//! print!("{}", Report::from_resolution(&graph, &resolution, 7.5));
//! ```
//!
//! # Key Types
//!
//! - [`graph::ProductionGraph`] -- Immutable item/recipe/building dataset.
//! - [`building::Building`] -- Crafting speed and productivity, optionally
//!   derived from modules and beacons.
//! - [`resolver::Resolver`] -- The demand propagation algorithm.
//! - [`resolver::Aggregate`] -- Per-item throughput, machines, and refcount.
//! - [`trace::Trace`] -- One line per visited node, grouped by root.

pub mod building;
pub mod graph;
pub mod id;
pub mod report;
pub mod resolver;
pub mod trace;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use building::{Building, BuildingError, Module};
pub use graph::{GraphError, ProductionGraph, ProductionGraphBuilder, RecipeDef};
pub use report::{Report, ReportRow};
pub use resolver::{Aggregate, Demand, OrderingWarning, Resolution, ResolveError, Resolver};
pub use validation::ConfigProblem;
