//! Human-readable trace of a resolution, one line per expanded node.

use crate::id::ItemId;
use serde::Serialize;
use std::fmt;

/// Items per second one transport lane carries unless configured otherwise.
pub const DEFAULT_LANE_CAPACITY: f64 = 7.5;

/// Number of lanes needed for `items_per_sec`, or `None` when a single lane
/// is enough.
pub fn lanes(items_per_sec: f64, lane_capacity: f64) -> Option<f64> {
    if items_per_sec <= lane_capacity {
        None
    } else {
        Some(items_per_sec / lane_capacity)
    }
}

/// Machine count and building for a node that expanded into its recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceProduction {
    pub machines: f64,
    pub building: String,
}

/// One visited node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceLine {
    /// The root demand whose expansion produced this line.
    pub root: ItemId,
    pub depth: u32,
    pub item: ItemId,
    pub name: String,
    pub items_per_sec: f64,
    pub lanes: Option<f64>,
    /// `None` for leaves (raw items and deferred roots).
    pub production: Option<TraceProduction>,
}

impl TraceLine {
    pub fn is_leaf(&self) -> bool {
        self.production.is_none()
    }
}

impl fmt::Display for TraceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            f.write_str("  ")?;
        }
        write!(f, "{:5.2}/s", self.items_per_sec)?;
        if let Some(lanes) = self.lanes {
            write!(f, " {lanes:5.1}┋")?;
        }
        match &self.production {
            Some(p) => write!(f, " {:5.1}🏭 {} ({})", p.machines, self.name, p.building),
            None => write!(f, " {}", self.name),
        }
    }
}

/// All trace lines of a resolution, in visiting order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    lines: Vec<TraceLine>,
}

impl Trace {
    pub(crate) fn push(&mut self, line: TraceLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[TraceLine] {
        &self.lines
    }

    /// Lines emitted while `root` was being resolved.
    pub fn for_root(&self, root: ItemId) -> impl Iterator<Item = &TraceLine> {
        self.lines.iter().filter(move |l| l.root == root)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Each root's block is preceded by a blank line.
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            if line.depth == 0 {
                writeln!(f)?;
            }
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
