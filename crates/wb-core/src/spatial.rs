//! Uniform-grid spatial index for proximity queries.
//!
//! Shapes are bucketed into square cells; a shape whose bounding box spans
//! several cells is registered in each of them. Queries scan the block of
//! cells around the query point, so results are a conservative superset of
//! the shapes actually within the radius.
//!
//! The index holds copies of the shapes it was built from and is never
//! invalidated automatically. Call [`SpatialIndex::rebuild`] after the shape
//! set or any shape's geometry changes.

use crate::id::NodeId;
use crate::model::Shape;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_CELL_SIZE: f64 = 100.0;

type CellKey = (i64, i64);

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<NodeId>>,
    shapes: HashMap<NodeId, Shape>,
    /// Smallest and largest occupied cell coordinates.
    occupied: Option<(CellKey, CellKey)>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialIndex {
    /// Create an empty index. Non-positive or non-finite cell sizes fall
    /// back to the default.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            shapes: HashMap::new(),
            occupied: None,
        }
    }

    /// Build an index over `shapes` in one step.
    pub fn build(shapes: &[Shape]) -> Self {
        let mut index = Self::default();
        index.rebuild(shapes);
        index
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.shapes.clear();
        self.occupied = None;
    }

    /// Clear and repopulate from `shapes`.
    pub fn rebuild(&mut self, shapes: &[Shape]) {
        self.clear();
        for shape in shapes {
            let b = shape.bounds();
            let (min_cx, min_cy) = self.cell_of(b.left(), b.top());
            let (max_cx, max_cy) = self.cell_of(b.right(), b.bottom());
            for cx in min_cx..=max_cx {
                for cy in min_cy..=max_cy {
                    self.cells.entry((cx, cy)).or_default().push(shape.id);
                }
            }
            self.occupied = Some(match self.occupied {
                Some(((lo_x, lo_y), (hi_x, hi_y))) => (
                    (lo_x.min(min_cx), lo_y.min(min_cy)),
                    (hi_x.max(max_cx), hi_y.max(max_cy)),
                ),
                None => ((min_cx, min_cy), (max_cx, max_cy)),
            });
            self.shapes.insert(shape.id, shape.clone());
        }
        log::debug!(
            "spatial index rebuilt: {} shapes in {} cells",
            self.shapes.len(),
            self.cells.len()
        );
    }

    /// Shapes registered in any cell within `ceil(radius / cell_size)` cells
    /// of the cell containing `(x, y)`. Each shape appears once, in
    /// first-encountered order of a row-major cell scan.
    ///
    /// The scan never leaves the block of occupied cells, so an unbounded
    /// radius costs no more than visiting every cell once.
    pub fn nearby_shapes(&self, x: f64, y: f64, radius: f64) -> Vec<&Shape> {
        let Some(((min_cx, min_cy), (max_cx, max_cy))) = self.occupied else {
            return Vec::new();
        };
        if !x.is_finite() || !y.is_finite() {
            return Vec::new();
        }
        // Float to int casts saturate, so an infinite radius reaches i64::MAX.
        let reach = (radius.max(0.0) / self.cell_size).ceil() as i64;
        let (qx, qy) = self.cell_of(x, y);
        let (lo_x, hi_x) = (qx.saturating_sub(reach).max(min_cx), qx.saturating_add(reach).min(max_cx));
        let (lo_y, hi_y) = (qy.saturating_sub(reach).max(min_cy), qy.saturating_add(reach).min(max_cy));
        if lo_x > hi_x || lo_y > hi_y {
            return Vec::new();
        }

        let block = (hi_x.abs_diff(lo_x) as u128 + 1) * (hi_y.abs_diff(lo_y) as u128 + 1);
        let keys: Vec<CellKey> = if block > self.cells.len() as u128 {
            let mut keys: Vec<CellKey> = self
                .cells
                .keys()
                .copied()
                .filter(|&(cx, cy)| (lo_x..=hi_x).contains(&cx) && (lo_y..=hi_y).contains(&cy))
                .collect();
            keys.sort_unstable_by_key(|&(cx, cy)| (cy, cx));
            keys
        } else {
            (lo_y..=hi_y)
                .flat_map(|cy| (lo_x..=hi_x).map(move |cx| (cx, cy)))
                .collect()
        };

        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut result = Vec::new();
        for key in keys {
            let Some(ids) = self.cells.get(&key) else {
                continue;
            };
            for id in ids {
                if seen.insert(*id)
                    && let Some(shape) = self.shapes.get(id)
                {
                    result.push(shape);
                }
            }
        }
        result
    }

    fn cell_of(&self, x: f64, y: f64) -> CellKey {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }
}
