//! Marker glyphs for edge ends.
//!
//! Each glyph is built in a local frame where the edge arrives along +x at
//! the origin, then rotated to the path tangent and moved to the endpoint.
//! Arrow and triangle tips sit on the endpoint; circle, square and diamond
//! are centered on it.

use crate::path::EdgePath;
use crate::svg::to_svg_path;
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as _};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f64::consts::PI;
use wb_core::model::{Edge, MarkerConfig, MarkerKind};

/// Flattening tolerance for curved glyph outlines.
const GLYPH_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPlacement {
    Start,
    End,
}

#[derive(Debug, Clone)]
pub struct MarkerGlyph {
    pub placement: MarkerPlacement,
    pub kind: MarkerKind,
    /// SVG path data in world coordinates.
    pub d: String,
    pub path: BezPath,
    /// `None` for open glyphs (the arrow chevron).
    pub fill: Option<String>,
    pub stroke: String,
    /// Endpoint the glyph is attached to.
    pub point: Point,
    /// Direction the glyph points, in radians.
    pub angle: f64,
}

fn local_outline(kind: MarkerKind, size: f64) -> BezPath {
    let half = size / 2.0;
    let mut path = BezPath::new();
    match kind {
        MarkerKind::Arrow => {
            path.move_to((-size, -half));
            path.line_to((0.0, 0.0));
            path.line_to((-size, half));
        }
        MarkerKind::Triangle => {
            path.move_to((0.0, 0.0));
            path.line_to((-size, -half));
            path.line_to((-size, half));
            path.close_path();
        }
        MarkerKind::Diamond => {
            path.move_to((half, 0.0));
            path.line_to((0.0, -half));
            path.line_to((-half, 0.0));
            path.line_to((0.0, half));
            path.close_path();
        }
        MarkerKind::Square => return Rect::new(-half, -half, half, half).to_path(GLYPH_TOLERANCE),
        MarkerKind::Circle => return Circle::new((0.0, 0.0), half).to_path(GLYPH_TOLERANCE),
    }
    path
}

/// Glyph for one end of `path`.
///
/// End markers point along the direction of travel into the target; start
/// markers point the opposite way, out of the source.
pub fn marker_glyph(config: &MarkerConfig, placement: MarkerPlacement, path: &EdgePath) -> MarkerGlyph {
    let (point, angle) = match placement {
        MarkerPlacement::Start => (path.source, path.start_angle + PI),
        MarkerPlacement::End => (path.target, path.end_angle),
    };
    let size = config.size.max(0.0);
    let transform = Affine::translate(point.to_vec2()) * Affine::rotate(angle);
    let outline = transform * local_outline(config.kind, size);

    MarkerGlyph {
        placement,
        kind: config.kind,
        d: to_svg_path(&outline),
        path: outline,
        fill: match config.kind {
            MarkerKind::Arrow => None,
            _ => Some(config.color.clone()),
        },
        stroke: config.color.clone(),
        point,
        angle,
    }
}

/// Glyphs for whichever ends of `edge` have a marker configured.
pub fn edge_markers(edge: &Edge, path: &EdgePath) -> SmallVec<[MarkerGlyph; 2]> {
    let mut glyphs = SmallVec::new();
    if let Some(config) = &edge.marker_start {
        glyphs.push(marker_glyph(config, MarkerPlacement::Start, path));
    }
    if let Some(config) = &edge.marker_end {
        glyphs.push(marker_glyph(config, MarkerPlacement::End, path));
    }
    glyphs
}
