//! Drag-time snapping.
//!
//! Given the position a dragged shape is about to move to, find the closest
//! alignment of one of its edges or centers with a snap target (another
//! shape's edge or center, a grid line, or a canvas edge) and adjust the
//! position so the two coincide. The X and Y axes are searched
//! independently; either, both, or neither may snap.
//!
//! [`calculate_snap_position`] is the pure entry point. [`SnapEngine`] wraps
//! it with an owned spatial index and a bounded memo cache.

use crate::id::NodeId;
use crate::model::{Bounds, CanvasSize, Point, Shape};
use crate::spatial::SpatialIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

/// Extra reach of the nearby-shape query beyond the dragged shape itself.
pub const NEARBY_SEARCH_RADIUS: f64 = 400.0;

/// Maximum number of memoized snap results per engine.
pub const SNAP_CACHE_CAPACITY: usize = 100;

// ─── Settings ────────────────────────────────────────────────────────────

/// Snap configuration, passed by value on every call.
///
/// `enabled` gates everything. The other toggles are only consulted when
/// snapping is enabled. Values are not validated: a negative threshold or a
/// non-positive grid simply never matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    pub enabled: bool,
    /// Maximum snap distance in world units (inclusive).
    pub threshold: f64,
    /// Emit guides for snapped axes. Does not affect the snapped position.
    pub show_guides: bool,
    pub snap_to_nodes: bool,
    pub snap_to_grid: bool,
    pub grid_size: f64,
    pub snap_to_canvas: bool,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 8.0,
            show_guides: true,
            snap_to_nodes: true,
            snap_to_grid: false,
            grid_size: 20.0,
            snap_to_canvas: true,
        }
    }
}

// ─── Guides & results ────────────────────────────────────────────────────

/// Orientation of a guide line. A `Horizontal` guide is the line
/// `y = position`; a `Vertical` guide is `x = position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideAxis {
    Horizontal,
    Vertical,
}

impl GuideAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuideAxis::Horizontal => "horizontal",
            GuideAxis::Vertical => "vertical",
        }
    }
}

/// One alignment line, either achieved during a drag or found by the
/// static alignment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapGuide {
    pub id: String,
    pub axis: GuideAxis,
    pub position: f64,
    pub node_ids: SmallVec<[NodeId; 4]>,
    /// Number of shapes aligned on this line, at least 1.
    pub strength: u32,
    /// Extent of the line along its own direction, clamped to the canvas.
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub position: Point,
    pub guides: Vec<SnapGuide>,
    pub snapped: bool,
}

impl SnapResult {
    fn unchanged(position: Point) -> Self {
        Self {
            position,
            guides: Vec::new(),
            snapped: false,
        }
    }
}

// ─── Targets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum TargetSource {
    Node(NodeId),
    Grid,
    Canvas,
}

/// A 1-D snap line plus the span it covers along the perpendicular axis.
#[derive(Debug, Clone, Copy)]
struct SnapTarget {
    value: f64,
    source: TargetSource,
    span: (f64, f64),
}

/// Edge or center of the dragged shape along one axis, as a fraction of
/// its size measured from the leading edge.
const CANDIDATE_FRACTIONS: [f64; 3] = [0.0, 1.0, 0.5];

#[derive(Debug, Clone, Copy)]
struct AxisMatch {
    coord: f64,
    target: SnapTarget,
}

/// Search one axis. `origin` is the dragged shape's leading coordinate at
/// the target position and `size` its extent along the axis.
fn best_axis_match(
    origin: f64,
    size: f64,
    targets: &[SnapTarget],
    threshold: f64,
) -> Option<AxisMatch> {
    let mut best: Option<(f64, AxisMatch)> = None;
    for fraction in CANDIDATE_FRACTIONS {
        let candidate = origin + size * fraction;
        for target in targets {
            let distance = (candidate - target.value).abs();
            let within = distance <= threshold;
            if !within {
                continue;
            }
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((
                    distance,
                    AxisMatch {
                        coord: target.value - size * fraction,
                        target: *target,
                    },
                ));
            }
        }
    }
    best.map(|(_, m)| m)
}

/// Grid lines bracketing each candidate point on one axis. Only the lines
/// that could possibly be within reach are produced.
fn grid_targets(origin: f64, size: f64, grid: f64, span: (f64, f64), out: &mut Vec<SnapTarget>) {
    if !(grid.is_finite() && grid > 0.0) {
        return;
    }
    for fraction in CANDIDATE_FRACTIONS {
        let candidate = origin + size * fraction;
        let below = (candidate / grid).floor() * grid;
        for value in [below, below + grid] {
            out.push(SnapTarget {
                value,
                source: TargetSource::Grid,
                span,
            });
        }
    }
}

fn canvas_targets(extent: f64, span: (f64, f64), out: &mut Vec<SnapTarget>) {
    for value in [0.0, extent] {
        out.push(SnapTarget {
            value,
            source: TargetSource::Canvas,
            span,
        });
    }
}

fn clamp_span(a: f64, b: f64, limit: f64) -> (f64, f64) {
    let lo = a.min(b).max(0.0);
    let hi = a.max(b).min(limit.max(0.0));
    (lo, hi.max(lo))
}

fn guide_for(axis: GuideAxis, m: &AxisMatch, dragged: &Bounds, canvas: CanvasSize) -> SnapGuide {
    let (own_start, own_end, limit) = match axis {
        GuideAxis::Horizontal => (dragged.left(), dragged.right(), canvas.width),
        GuideAxis::Vertical => (dragged.top(), dragged.bottom(), canvas.height),
    };
    let (start, end) = clamp_span(
        own_start.min(m.target.span.0),
        own_end.max(m.target.span.1),
        limit,
    );
    let node_ids = match m.target.source {
        TargetSource::Node(id) => SmallVec::from_slice(&[id]),
        TargetSource::Grid | TargetSource::Canvas => SmallVec::new(),
    };
    SnapGuide {
        id: format!("snap-{}-{}", axis.as_str(), m.target.value),
        axis,
        position: m.target.value,
        node_ids,
        strength: 1,
        start,
        end,
    }
}

// ─── Snap calculation ────────────────────────────────────────────────────

/// Compute the snapped position for `dragged` moving to `target`.
///
/// Node targets come from `index` when one is supplied (only shapes near
/// the drop position are considered), otherwise from every shape in
/// `shapes`. The dragged shape never snaps to itself.
pub fn calculate_snap_position(
    dragged: &Shape,
    target: Point,
    shapes: &[Shape],
    canvas: CanvasSize,
    settings: &SnapSettings,
    index: Option<&SpatialIndex>,
) -> SnapResult {
    if !settings.enabled {
        return SnapResult::unchanged(target);
    }

    let bounds = dragged.bounds_at(target);
    let mut x_targets: Vec<SnapTarget> = Vec::new();
    let mut y_targets: Vec<SnapTarget> = Vec::new();

    if settings.snap_to_nodes {
        let nearby: Vec<&Shape> = match index {
            Some(index) => {
                let half_diagonal = bounds.width.hypot(bounds.height) / 2.0;
                let radius = half_diagonal + NEARBY_SEARCH_RADIUS + settings.threshold.max(0.0);
                let center = bounds.center();
                index.nearby_shapes(center.x, center.y, radius)
            }
            None => shapes.iter().collect(),
        };
        for other in nearby.into_iter().filter(|s| s.id != dragged.id) {
            let b = other.bounds();
            let source = TargetSource::Node(other.id);
            for value in [b.left(), b.right(), b.center_x()] {
                x_targets.push(SnapTarget {
                    value,
                    source,
                    span: (b.top(), b.bottom()),
                });
            }
            for value in [b.top(), b.bottom(), b.center_y()] {
                y_targets.push(SnapTarget {
                    value,
                    source,
                    span: (b.left(), b.right()),
                });
            }
        }
    }

    if settings.snap_to_grid {
        let grid = settings.grid_size;
        grid_targets(bounds.x, bounds.width, grid, (0.0, canvas.height), &mut x_targets);
        grid_targets(bounds.y, bounds.height, grid, (0.0, canvas.width), &mut y_targets);
    }

    if settings.snap_to_canvas {
        canvas_targets(canvas.width, (0.0, canvas.height), &mut x_targets);
        canvas_targets(canvas.height, (0.0, canvas.width), &mut y_targets);
    }

    let x_match = best_axis_match(bounds.x, bounds.width, &x_targets, settings.threshold);
    let y_match = best_axis_match(bounds.y, bounds.height, &y_targets, settings.threshold);

    let position = Point::new(
        x_match.map_or(target.x, |m| m.coord),
        y_match.map_or(target.y, |m| m.coord),
    );
    let snapped_bounds = dragged.bounds_at(position);

    let mut guides = Vec::new();
    if settings.show_guides {
        if let Some(m) = &y_match {
            guides.push(guide_for(GuideAxis::Horizontal, m, &snapped_bounds, canvas));
        }
        if let Some(m) = &x_match {
            guides.push(guide_for(GuideAxis::Vertical, m, &snapped_bounds, canvas));
        }
    }

    SnapResult {
        position,
        guides,
        snapped: x_match.is_some() || y_match.is_some(),
    }
}

// ─── Engine with index and cache ─────────────────────────────────────────

/// Bounded memo of snap results, evicting the oldest insertion first.
#[derive(Debug, Clone)]
struct SnapCache {
    capacity: usize,
    entries: HashMap<String, SnapResult>,
    order: VecDeque<String>,
}

impl SnapCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&SnapResult> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: String, value: SnapResult) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                log::trace!("snap cache evict {oldest}");
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Per-canvas snapping engine.
///
/// Owns a spatial index over the scene and a cache of recent results. The
/// cache key covers the dragged shape (id and size), the target position,
/// the canvas and the settings. Every call also hashes the ids and bounds
/// of the other shapes; when they differ from what the cache and index were
/// built against, the index is rebuilt and the cache dropped.
#[derive(Debug, Clone)]
pub struct SnapEngine {
    index: SpatialIndex,
    indexed: bool,
    cache: SnapCache,
    /// Target-shape hash the index and cache currently reflect.
    targets: Option<u64>,
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapEngine {
    pub fn new() -> Self {
        Self {
            index: SpatialIndex::default(),
            indexed: false,
            cache: SnapCache::new(SNAP_CACHE_CAPACITY),
            targets: None,
        }
    }

    pub fn with_cell_size(cell_size: f64) -> Self {
        Self {
            index: SpatialIndex::new(cell_size),
            ..Self::new()
        }
    }

    /// Rebuild the spatial index from `shapes` and drop cached results.
    pub fn rebuild_index(&mut self, shapes: &[Shape]) {
        self.index.rebuild(shapes);
        self.indexed = true;
        self.cache.clear();
        self.targets = None;
    }

    /// Drop cached results without touching the index.
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.targets = None;
    }

    /// Bring the index and cache in line with `shapes`, ignoring the
    /// dragged shape itself since it is never a target.
    fn sync_targets(&mut self, shapes: &[Shape], dragged: NodeId) {
        let hash = targets_hash(shapes, dragged);
        if self.targets == Some(hash) {
            return;
        }
        if self.targets.is_some() {
            log::debug!("snap targets changed, dropping {} cached results", self.cache.len());
        }
        if self.indexed {
            self.index.rebuild(shapes);
        }
        self.cache.clear();
        self.targets = Some(hash);
    }

    /// The index, once it has been built.
    pub fn index(&self) -> Option<&SpatialIndex> {
        self.indexed.then_some(&self.index)
    }

    pub fn cached_results(&self) -> usize {
        self.cache.len()
    }

    /// Memoized [`calculate_snap_position`]. Uses the engine's index when it
    /// has been built, otherwise scans `shapes`.
    pub fn calculate(
        &mut self,
        dragged: &Shape,
        target: Point,
        shapes: &[Shape],
        canvas: CanvasSize,
        settings: &SnapSettings,
    ) -> SnapResult {
        if !settings.enabled {
            return SnapResult::unchanged(target);
        }

        self.sync_targets(shapes, dragged.id);
        let key = cache_key(dragged, target, canvas, settings);
        if let Some(hit) = self.cache.get(&key) {
            log::trace!("snap cache hit for {}", dragged.id);
            return hit.clone();
        }

        let result = calculate_snap_position(
            dragged,
            target,
            shapes,
            canvas,
            settings,
            self.index(),
        );
        self.cache.insert(key, result.clone());
        result
    }
}

/// Order-sensitive hash of every shape but `dragged`: ids and bounds.
fn targets_hash(shapes: &[Shape], dragged: NodeId) -> u64 {
    let mut h = DefaultHasher::new();
    for shape in shapes.iter().filter(|s| s.id != dragged) {
        shape.id.as_str().hash(&mut h);
        let b = shape.bounds();
        for v in [b.x, b.y, b.width, b.height] {
            (v + 0.0).to_bits().hash(&mut h);
        }
    }
    h.finish()
}

fn cache_key(dragged: &Shape, target: Point, canvas: CanvasSize, settings: &SnapSettings) -> String {
    let size = dragged.effective_size();
    let settings_json = serde_json::to_string(settings).unwrap_or_default();
    format!(
        "{}|{:x}|{:x}|{:x}|{:x}|{:x}|{:x}|{}",
        dragged.id,
        target.x.to_bits(),
        target.y.to_bits(),
        size.width.to_bits(),
        size.height.to_bits(),
        canvas.width.to_bits(),
        canvas.height.to_bits(),
        settings_json
    )
}
