//! Edge attachment points.
//!
//! An edge attaches to the midpoint of one side of each shape's bounding
//! box. The side is chosen from the direction toward the other shape's
//! center: mostly-horizontal directions use the left or right side,
//! everything else the top or bottom. Anchors lie exactly on the box so
//! host-drawn handles coincide with path endpoints.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use wb_core::model::{Edge, Scene, Shape};

/// Side of a shape's bounding box an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// Unit vector pointing out of the shape through this side.
    pub fn direction(self) -> Vec2 {
        match self {
            Side::Left => Vec2::new(-1.0, 0.0),
            Side::Right => Vec2::new(1.0, 0.0),
            Side::Top => Vec2::new(0.0, -1.0),
            Side::Bottom => Vec2::new(0.0, 1.0),
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
    pub side: Side,
}

impl Anchor {
    pub fn new(x: f64, y: f64, side: Side) -> Self {
        Self { x, y, side }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Attachment point on `shape` for an edge heading toward `toward`.
///
/// Coincident centers attach on the left side.
pub fn resolve_anchor(shape: &Shape, toward: &Shape) -> Anchor {
    let from = shape.bounds();
    let to = toward.bounds();
    let dx = to.center_x() - from.center_x();
    let dy = to.center_y() - from.center_y();
    let angle = dy.atan2(dx).to_degrees().abs();

    if angle < 45.0 || angle > 135.0 {
        if dx > 0.0 {
            Anchor::new(from.right(), from.center_y(), Side::Right)
        } else {
            Anchor::new(from.left(), from.center_y(), Side::Left)
        }
    } else if dy > 0.0 {
        Anchor::new(from.center_x(), from.bottom(), Side::Bottom)
    } else {
        Anchor::new(from.center_x(), from.top(), Side::Top)
    }
}

/// Source and target anchors for `edge`, or `None` when either endpoint
/// is missing from the scene.
pub fn resolve_edge_anchors(edge: &Edge, scene: &Scene) -> Option<(Anchor, Anchor)> {
    let (source, target) = scene.endpoints(edge)?;
    Some((resolve_anchor(source, target), resolve_anchor(target, source)))
}
