//! The totals table printed after all roots are resolved.

use crate::graph::ProductionGraph;
use crate::resolver::{OrderingWarning, Resolution};
use serde::Serialize;
use std::fmt;

/// One item's final requirements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub item: String,
    /// `None` for raw items.
    pub building: Option<String>,
    pub machines: f64,
    pub items_per_sec: f64,
    pub lanes: f64,
    pub refcount: u32,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:6.1}🏭 {:7.2}/sec {:6.1}┋ {} ({})",
            self.machines,
            self.items_per_sec,
            self.lanes,
            self.item,
            self.building.as_deref().unwrap_or("raw")
        )?;
        if self.refcount > 1 {
            write!(f, " ※{}", self.refcount)?;
        }
        Ok(())
    }
}

/// Totals sorted by producing building, raw items last, then by item name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub lane_capacity: f64,
    pub rows: Vec<ReportRow>,
    pub warnings: Vec<OrderingWarning>,
}

impl Report {
    pub fn from_resolution(
        graph: &ProductionGraph,
        resolution: &Resolution,
        lane_capacity: f64,
    ) -> Self {
        let mut rows: Vec<ReportRow> = resolution
            .totals
            .iter()
            .map(|(item, total)| ReportRow {
                item: graph.item_name(*item).unwrap_or_default().to_string(),
                building: graph.producer(*item).map(|b| b.name.clone()),
                machines: total.machines,
                items_per_sec: total.items_per_sec,
                lanes: total.items_per_sec / lane_capacity,
                refcount: total.refcount,
            })
            .collect();

        rows.sort_by(|a, b| {
            let key_a = (a.building.is_none(), a.building.as_deref(), a.item.as_str());
            let key_b = (b.building.is_none(), b.building.as_deref(), b.item.as_str());
            key_a.cmp(&key_b)
        });

        Self {
            lane_capacity,
            rows,
            warnings: resolution.warnings.clone(),
        }
    }

    pub fn row(&self, item: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.item == item)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Totals")?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
