//! Canvas data model consumed by the geometry and history kernel.
//!
//! Shapes are axis-aligned boxes positioned by their top-left corner in
//! world coordinates. Edges reference shapes by id; an edge whose endpoints
//! do not resolve is kept in the scene but has no geometry. The `Scene`
//! keeps shapes and edges in paint order.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SHAPE_WIDTH: f64 = 200.0;
pub const DEFAULT_SHAPE_HEIGHT: f64 = 100.0;

// ─── Primitives ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The canvas dimensions. Canvas edges at `0` and `width`/`height` are
/// snap targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// AABB overlap test. Touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    /// Euclidean distance from a point to the nearest point of the box
    /// (0 when inside).
    pub fn distance_to_point(&self, px: f64, py: f64) -> f64 {
        let dx = (self.x - px).max(0.0).max(px - self.right());
        let dy = (self.y - py).max(0.0).max(py - self.bottom());
        dx.hypot(dy)
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
    StickyNote,
    Text,
}

/// A shape on the canvas.
///
/// Three size sources may be present. `measured_size` is what the host last
/// measured on screen, `style_size` is the nominal size from styling, and
/// `width`/`height` are explicit values set on the node. See
/// [`effective_size`] for the order in which they are consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: NodeId,
    #[serde(default)]
    pub kind: ShapeKind,
    /// Top-left corner.
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_size: Option<Size>,
}

impl Shape {
    pub fn new(id: NodeId, kind: ShapeKind, x: f64, y: f64) -> Self {
        Self {
            id,
            kind,
            position: Point::new(x, y),
            width: None,
            height: None,
            style_size: None,
            measured_size: None,
        }
    }

    /// Shorthand for a rectangle with explicit dimensions.
    pub fn rect(id: &str, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(NodeId::intern(id), ShapeKind::Rectangle, x, y).with_size(width, height)
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_style_size(mut self, width: f64, height: f64) -> Self {
        self.style_size = Some(Size::new(width, height));
        self
    }

    pub fn with_measured_size(mut self, width: f64, height: f64) -> Self {
        self.measured_size = Some(Size::new(width, height));
        self
    }

    pub fn effective_size(&self) -> Size {
        effective_size(self)
    }

    /// Bounding box at the shape's current position.
    pub fn bounds(&self) -> Bounds {
        self.bounds_at(self.position)
    }

    /// Bounding box if the shape's top-left corner were at `position`.
    pub fn bounds_at(&self, position: Point) -> Bounds {
        let size = self.effective_size();
        Bounds::new(position.x, position.y, size.width, size.height)
    }
}

/// The size every geometry computation uses for a shape.
///
/// Fallback chain: measured size, then style size, then the explicit
/// `width`/`height` (each defaulting to 200×100 when unset). Negative
/// dimensions clamp to 0.
pub fn effective_size(shape: &Shape) -> Size {
    let size = shape
        .measured_size
        .or(shape.style_size)
        .unwrap_or_else(|| {
            Size::new(
                shape.width.unwrap_or(DEFAULT_SHAPE_WIDTH),
                shape.height.unwrap_or(DEFAULT_SHAPE_HEIGHT),
            )
        });
    Size::new(size.width.max(0.0), size.height.max(0.0))
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// How the edge path is drawn between two anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Straight,
    Step,
    SmoothStep,
    Curved,
    Orthogonal,
    #[default]
    Bezier,
}

/// Glyph drawn at an edge end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    #[default]
    Arrow,
    Circle,
    Square,
    Diamond,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub kind: MarkerKind,
    pub size: f64,
    /// CSS color string, usually `#RRGGBB`.
    pub color: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            kind: MarkerKind::Arrow,
            size: 10.0,
            color: "#6B7080".to_string(),
        }
    }
}

impl MarkerConfig {
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
}

/// A visual connection between two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: NodeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub kind: EdgeKind,
    /// Bend amount for `Curved` edges, roughly 0..1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curvature: Option<f64>,
    /// Corner rounding for `Step` edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<MarkerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<MarkerConfig>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(id: NodeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            kind: EdgeKind::default(),
            curvature: None,
            corner_radius: None,
            marker_start: None,
            marker_end: None,
            animated: false,
            label: None,
        }
    }

    /// Shorthand used by hosts and tests: `Edge::between("e1", "a", "b")`.
    pub fn between(id: &str, source: &str, target: &str) -> Self {
        Self::new(
            NodeId::intern(id),
            NodeId::intern(source),
            NodeId::intern(target),
        )
    }

    pub fn with_kind(mut self, kind: EdgeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_marker_start(mut self, marker: MarkerConfig) -> Self {
        self.marker_start = Some(marker);
        self
    }

    pub fn with_marker_end(mut self, marker: MarkerConfig) -> Self {
        self.marker_end = Some(marker);
        self
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────

/// The shapes and edges of one canvas, in paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    shapes: Vec<Shape>,
    edges: Vec<Edge>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(shapes: Vec<Shape>, edges: Vec<Edge>) -> Self {
        Self { shapes, edges }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Insert at `index`, clamped to the end of the list.
    pub fn insert_shape(&mut self, index: usize, shape: Shape) {
        let index = index.min(self.shapes.len());
        self.shapes.insert(index, shape);
    }

    /// Remove a shape, returning its former paint index with it.
    /// Edges touching the shape are left in place and become dangling.
    pub fn remove_shape(&mut self, id: NodeId) -> Option<(usize, Shape)> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        Some((index, self.shapes.remove(index)))
    }

    pub fn shape(&self, id: NodeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn shape_mut(&mut self, id: NodeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn insert_edge(&mut self, index: usize, edge: Edge) {
        let index = index.min(self.edges.len());
        self.edges.insert(index, edge);
    }

    pub fn remove_edge(&mut self, id: NodeId) -> Option<(usize, Edge)> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        Some((index, self.edges.remove(index)))
    }

    pub fn edge(&self, id: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: NodeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    /// Resolve an edge's source and target shapes. `None` when either
    /// endpoint is missing, in which case the edge is not drawn.
    pub fn endpoints(&self, edge: &Edge) -> Option<(&Shape, &Shape)> {
        Some((self.shape(edge.source)?, self.shape(edge.target)?))
    }
}
