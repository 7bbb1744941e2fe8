//! Demand propagation over a [`ProductionGraph`].
//!
//! Root demands are resolved one at a time, in the order the caller gives
//! them. Each root is expanded depth-first into its recipe's ingredients,
//! adding throughput and machine counts to a per-item [`Aggregate`] shared by
//! the whole run.
//!
//! # Deferred roots
//!
//! Every item that is itself a root demand starts out *deferred*. When a
//! deferred item is reached below depth 0 (as someone else's ingredient) its
//! throughput is recorded but its recipe is not expanded: that happens once,
//! when its own turn as a root comes, with the accumulated throughput as the
//! requested rate. After a root is resolved it leaves the deferred set, and
//! later roots expand through it like any other item.
//!
//! Roots should therefore be ordered from most dependent to least dependent.
//! When a later root adds demand to an item that an earlier root already
//! finalized, the run records an [`OrderingWarning`] and re-synchronizes its
//! bookkeeping; it never re-runs the earlier root.

use crate::graph::ProductionGraph;
use crate::id::ItemId;
use crate::trace::{DEFAULT_LANE_CAPACITY, Trace, TraceLine, TraceProduction, lanes};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that prevent a resolution from starting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("demand for unknown item '{0}'")]
    UnknownItem(String),
    #[error("item '{0}' is demanded more than once")]
    DuplicateDemand(String),
    #[error("demand for '{item}' has invalid rate {rate}")]
    InvalidRate { item: String, rate: f64 },
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// A root demand: at least `min_items_per_sec` of `item`.
///
/// A minimum of zero means "whatever the other roots need", which is useful
/// for listing a sub-factory in the report without forcing extra output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub item: String,
    #[serde(default, alias = "rate")]
    pub min_items_per_sec: f64,
}

impl Demand {
    pub fn new(item: &str, min_items_per_sec: f64) -> Self {
        Self {
            item: item.to_string(),
            min_items_per_sec,
        }
    }

    /// A demand with no minimum of its own.
    pub fn placeholder(item: &str) -> Self {
        Self::new(item, 0.0)
    }
}

/// Accumulated requirements for one item over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Aggregate {
    pub items_per_sec: f64,
    pub machines: f64,
    /// Number of expansions that went through this item's recipe.
    pub refcount: u32,
}

/// A root's expansion changed the throughput of an item that an earlier root
/// had already finalized. Trace lines of that earlier root are stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderingWarning {
    pub item: ItemId,
    pub item_name: String,
    /// The root being resolved when the change was noticed.
    pub while_resolving: ItemId,
    pub while_resolving_name: String,
    pub previous: f64,
    pub current: f64,
}

impl fmt::Display for OrderingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "demand for {} added after it was processed while processing {} ({:.2}/s -> {:.2}/s)",
            self.item_name, self.while_resolving_name, self.previous, self.current
        )
    }
}

/// The outcome of [`Resolver::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// Root items in resolution order.
    pub roots: Vec<ItemId>,
    /// Every item touched by the run.
    pub totals: BTreeMap<ItemId, Aggregate>,
    pub trace: Trace,
    pub warnings: Vec<OrderingWarning>,
}

impl Resolution {
    pub fn aggregate(&self, item: ItemId) -> Option<&Aggregate> {
        self.totals.get(&item)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves ordered root demands against a production graph.
///
/// The resolver holds no run state; every call to [`resolve`](Self::resolve)
/// starts fresh.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'g> {
    graph: &'g ProductionGraph,
    lane_capacity: f64,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g ProductionGraph) -> Self {
        Self {
            graph,
            lane_capacity: DEFAULT_LANE_CAPACITY,
        }
    }

    /// Lane capacity used for the trace's lane annotations.
    pub fn with_lane_capacity(mut self, lane_capacity: f64) -> Self {
        self.lane_capacity = lane_capacity;
        self
    }

    pub fn lane_capacity(&self) -> f64 {
        self.lane_capacity
    }

    /// Resolve `demands` in order.
    ///
    /// All demands are checked before anything is expanded: an unknown item,
    /// an item demanded twice, or a negative or non-finite rate fails the
    /// whole call.
    pub fn resolve(&self, demands: &[Demand]) -> Result<Resolution, ResolveError> {
        let roots = self.check_demands(demands)?;
        let mut run = Run {
            graph: self.graph,
            lane_capacity: self.lane_capacity,
            deferred: roots.iter().map(|(item, _)| *item).collect(),
            processed: Vec::with_capacity(roots.len()),
            resolution: Resolution::default(),
        };
        for (item, min_items_per_sec) in roots {
            run.resolve_root(item, min_items_per_sec);
        }
        Ok(run.resolution)
    }

    fn check_demands(&self, demands: &[Demand]) -> Result<Vec<(ItemId, f64)>, ResolveError> {
        let mut seen = HashSet::new();
        demands
            .iter()
            .map(|d| {
                let item = self
                    .graph
                    .item_id(&d.item)
                    .filter(|id| self.graph.kind(*id).is_some())
                    .ok_or_else(|| ResolveError::UnknownItem(d.item.clone()))?;
                if !seen.insert(item) {
                    return Err(ResolveError::DuplicateDemand(d.item.clone()));
                }
                if !d.min_items_per_sec.is_finite() || d.min_items_per_sec < 0.0 {
                    return Err(ResolveError::InvalidRate {
                        item: d.item.clone(),
                        rate: d.min_items_per_sec,
                    });
                }
                Ok((item, d.min_items_per_sec))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// A pending node in the depth-first expansion.
#[derive(Debug, Clone, Copy)]
struct Frame {
    item: ItemId,
    items_per_sec: f64,
    depth: u32,
}

/// State owned by a single `resolve` call.
struct Run<'g> {
    graph: &'g ProductionGraph,
    lane_capacity: f64,
    /// Roots not yet resolved.
    deferred: HashSet<ItemId>,
    /// Last confirmed throughput of every resolved root, in resolution order.
    processed: Vec<(ItemId, f64)>,
    resolution: Resolution,
}

impl Run<'_> {
    fn name(&self, item: ItemId) -> String {
        self.graph.item_name(item).unwrap_or_default().to_string()
    }

    fn resolve_root(&mut self, root: ItemId, min_items_per_sec: f64) {
        let existing = self
            .resolution
            .totals
            .get(&root)
            .map_or(0.0, |a| a.items_per_sec);
        let requested = if existing < min_items_per_sec {
            min_items_per_sec
        } else {
            existing
        };
        log::debug!(
            "resolving {} at {requested:.3}/s (accumulated {existing:.3}/s, minimum {min_items_per_sec:.3}/s)",
            self.name(root)
        );

        self.processed.push((root, requested));
        self.resolution.roots.push(root);
        self.resolution.totals.insert(root, Aggregate::default());
        self.expand(root, requested);
        self.deferred.remove(&root);
        self.check_consistency(root);
    }

    fn expand(&mut self, root: ItemId, items_per_sec: f64) {
        let graph = self.graph;
        let mut stack = vec![Frame {
            item: root,
            items_per_sec,
            depth: 0,
        }];

        while let Some(frame) = stack.pop() {
            let aggregate = self.resolution.totals.entry(frame.item).or_default();
            aggregate.items_per_sec += frame.items_per_sec;

            let cut = frame.depth != 0 && self.deferred.contains(&frame.item);
            let production = if graph.is_raw(frame.item) || cut {
                None
            } else {
                graph.production(frame.item)
            };

            let mut line = TraceLine {
                root,
                depth: frame.depth,
                item: frame.item,
                name: graph.item_name(frame.item).unwrap_or_default().to_string(),
                items_per_sec: frame.items_per_sec,
                lanes: lanes(frame.items_per_sec, self.lane_capacity),
                production: None,
            };

            let Some((recipe, building)) = production else {
                self.resolution.trace.push(line);
                continue;
            };

            let machines = frame.items_per_sec / recipe.rate_per_machine(building);
            aggregate.refcount += 1;
            aggregate.machines += machines;
            line.production = Some(TraceProduction {
                machines,
                building: building.name.clone(),
            });
            self.resolution.trace.push(line);

            // Reversed so ingredients pop in declaration order.
            for ingredient in recipe.ingredients.iter().rev() {
                stack.push(Frame {
                    item: ingredient.item,
                    items_per_sec: ingredient.quantity * frame.items_per_sec
                        / recipe.output
                        / building.productivity,
                    depth: frame.depth + 1,
                });
            }
        }
    }

    fn check_consistency(&mut self, root: ItemId) {
        for i in 0..self.processed.len() {
            let (item, confirmed) = self.processed[i];
            let current = self
                .resolution
                .totals
                .get(&item)
                .map_or(0.0, |a| a.items_per_sec);
            if current != confirmed {
                let warning = OrderingWarning {
                    item,
                    item_name: self.name(item),
                    while_resolving: root,
                    while_resolving_name: self.name(root),
                    previous: confirmed,
                    current,
                };
                log::warn!("{warning}");
                self.resolution.warnings.push(warning);
                self.processed[i].1 = current;
            }
        }
    }
}
