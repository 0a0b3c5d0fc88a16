//! Honey production heatmap over candidate hive locations.
//!
//! Distinct latitudes become rows (north first, so descending) and distinct
//! longitudes become columns (west first, ascending). Each candidate lands in
//! exactly one `(row, col)` cell; a cell with no candidate stays empty.
//! Cell color is the production value normalized against the largest
//! observed value.

use std::collections::HashMap;

use beesync_common::entities::PotentialLocation;
use serde::Serialize;

pub const EMPTY_COLOR: &str = "#fff";
pub const HIGH_COLOR: &str = "green";
pub const MEDIUM_COLOR: &str = "blue";
pub const LOW_COLOR: &str = "red";

const HIGH_THRESHOLD: f64 = 0.7;
const MEDIUM_THRESHOLD: f64 = 0.4;
const COORD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct HoneyGrid {
    lats: Vec<f64>,
    lngs: Vec<f64>,
    locations: Vec<PotentialLocation>,
    cells: HashMap<(usize, usize), usize>,
    max_honey: f64,
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub location_id: Option<i64>,
    pub honey_production: Option<f64>,
    pub color: &'static str,
}

impl HoneyGrid {
    pub fn build(locations: Vec<PotentialLocation>) -> Self {
        let lats = distinct(locations.iter().map(|l| l.lat), true);
        let lngs = distinct(locations.iter().map(|l| l.lng), false);

        let mut cells = HashMap::new();
        for (idx, loc) in locations.iter().enumerate() {
            if let (Some(row), Some(col)) = (position(&lats, loc.lat), position(&lngs, loc.lng)) {
                cells.insert((row, col), idx);
            }
        }

        let max_honey = max_production(&locations);
        Self { lats, lngs, locations, cells, max_honey }
    }

    pub fn rows(&self) -> usize {
        self.lats.len()
    }

    pub fn cols(&self) -> usize {
        self.lngs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    /// Normalization base: the largest non-null production, or 1.
    pub fn max_honey(&self) -> f64 {
        self.max_honey
    }

    pub fn locations(&self) -> &[PotentialLocation] {
        &self.locations
    }

    pub fn location_at(&self, row: usize, col: usize) -> Option<&PotentialLocation> {
        self.cells.get(&(row, col)).map(|&idx| &self.locations[idx])
    }

    pub fn location(&self, id: i64) -> Option<&PotentialLocation> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Grid position of a candidate.
    pub fn cell_of(&self, id: i64) -> Option<(usize, usize)> {
        let loc = self.location(id)?;
        Some((position(&self.lats, loc.lat)?, position(&self.lngs, loc.lng)?))
    }

    pub fn cell_color(&self, row: usize, col: usize) -> &'static str {
        color_for(self.location_at(row, col).and_then(|l| l.honey_production), self.max_honey)
    }

    /// Row-major cells for rendering.
    pub fn cells(&self) -> Vec<Vec<GridCell>> {
        (0..self.rows())
            .map(|row| {
                (0..self.cols())
                    .map(|col| {
                        let loc = self.location_at(row, col);
                        GridCell {
                            row,
                            col,
                            location_id: loc.map(|l| l.id),
                            honey_production: loc.and_then(|l| l.honey_production),
                            color: self.cell_color(row, col),
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Null every stored production value and reset the normalization base.
    pub fn clear_predictions(&mut self) {
        for loc in &mut self.locations {
            loc.honey_production = None;
        }
        self.max_honey = 1.0;
    }

    /// Null one candidate's production. Returns false for an unknown id.
    pub fn clear_prediction(&mut self, id: i64) -> bool {
        let Some(loc) = self.locations.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        loc.honey_production = None;
        self.max_honey = max_production(&self.locations);
        true
    }
}

pub fn color_for(production: Option<f64>, max_honey: f64) -> &'static str {
    let Some(value) = production else {
        return EMPTY_COLOR;
    };
    let normalized = if max_honey > 0.0 { value / max_honey } else { 0.0 };
    if normalized > HIGH_THRESHOLD {
        HIGH_COLOR
    } else if normalized > MEDIUM_THRESHOLD {
        MEDIUM_COLOR
    } else {
        LOW_COLOR
    }
}

fn max_production(locations: &[PotentialLocation]) -> f64 {
    locations
        .iter()
        .filter_map(|l| l.honey_production)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
        .unwrap_or(1.0)
}

fn distinct(values: impl Iterator<Item = f64>, descending: bool) -> Vec<f64> {
    let mut out: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    out.sort_by(|a, b| if descending { b.total_cmp(a) } else { a.total_cmp(b) });
    out.dedup_by(|a, b| (*a - *b).abs() < COORD_EPSILON);
    out
}

fn position(axis: &[f64], value: f64) -> Option<usize> {
    axis.iter().position(|v| (v - value).abs() < COORD_EPSILON)
}
