//! Edge path generation.
//!
//! Turns two resolved anchors into a kurbo [`BezPath`] for one of the six
//! edge kinds, plus the SVG path data and the metadata markers and labels
//! need (end tangents, arc-length midpoint).
//!
//! Endpoints are rounded to whole pixels before any geometry is built.

use crate::anchor::{Anchor, Side};
use crate::svg::to_svg_path;
use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathSeg, Point, Vec2};
use serde::{Deserialize, Serialize};
use wb_core::model::{Edge, EdgeKind};

pub const DEFAULT_CURVATURE: f64 = 0.25;

const MIN_CONTROL_OFFSET: f64 = 30.0;
const MAX_CONTROL_OFFSET: f64 = 150.0;

/// Tolerance for arc-length estimates, in world units.
const ARCLEN_ACCURACY: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Bend of `curved` edges as a fraction of the anchor distance.
    pub curvature: f64,
    /// Corner rounding for `step` edges; 0 keeps sharp corners.
    pub corner_radius: f64,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            curvature: DEFAULT_CURVATURE,
            corner_radius: 0.0,
        }
    }
}

impl PathOptions {
    /// Options from an edge's own parameters, defaulting what it leaves unset.
    pub fn for_edge(edge: &Edge) -> Self {
        let defaults = Self::default();
        Self {
            curvature: edge.curvature.unwrap_or(defaults.curvature),
            corner_radius: edge.corner_radius.unwrap_or(defaults.corner_radius),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgePath {
    /// SVG path data.
    pub d: String,
    pub path: BezPath,
    /// Rounded source endpoint.
    pub source: Point,
    /// Rounded target endpoint.
    pub target: Point,
    /// Point halfway along the path by arc length.
    pub label_point: Point,
    /// Direction of travel leaving the source, in radians.
    pub start_angle: f64,
    /// Direction of travel arriving at the target, in radians.
    pub end_angle: f64,
}

/// Build the path for `kind` between two anchors.
pub fn generate_path(kind: EdgeKind, source: &Anchor, target: &Anchor, options: &PathOptions) -> EdgePath {
    let s = Point::new(source.x.round(), source.y.round());
    let t = Point::new(target.x.round(), target.y.round());
    let distance = s.distance(t);
    let offset = (distance * 0.4).clamp(MIN_CONTROL_OFFSET, MAX_CONTROL_OFFSET);

    let path = match kind {
        EdgeKind::Straight => straight(s, t),
        EdgeKind::Bezier => bezier(s, source.side, t, target.side, offset),
        EdgeKind::Step => {
            let points = elbow_points(s, source.side, t, target.side);
            rounded_polyline(&points, options.corner_radius)
        }
        EdgeKind::SmoothStep => smooth_step(s, source.side, t),
        EdgeKind::Curved => curved(s, t, options.curvature),
        EdgeKind::Orthogonal => rounded_polyline(&orthogonal_points(s, source.side, t), 0.0),
    };

    let (start_angle, end_angle) = end_angles(&path, s, t);
    EdgePath {
        d: to_svg_path(&path),
        label_point: arclen_midpoint(&path).unwrap_or_else(|| s.midpoint(t)),
        path,
        source: s,
        target: t,
        start_angle,
        end_angle,
    }
}

// ─── Kinds ───────────────────────────────────────────────────────────────

fn straight(s: Point, t: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(s);
    path.line_to(t);
    path
}

/// Cubic whose control points extend outward from each anchor's side, so
/// the curve leaves and enters perpendicular to the shapes.
fn bezier(s: Point, s_side: Side, t: Point, t_side: Side, offset: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(s);
    path.curve_to(
        s + s_side.direction() * offset,
        t + t_side.direction() * offset,
        t,
    );
    path
}

fn smooth_step(s: Point, s_side: Side, t: Point) -> BezPath {
    let mid = s.midpoint(t);
    let mut path = BezPath::new();
    path.move_to(s);
    if s_side.is_horizontal() {
        let bend_in = Point::new(mid.x, s.y);
        let bend_out = Point::new(mid.x, t.y);
        path.curve_to(bend_in, bend_in, mid);
        path.curve_to(bend_out, bend_out, t);
    } else {
        let bend_in = Point::new(s.x, mid.y);
        let bend_out = Point::new(t.x, mid.y);
        path.curve_to(bend_in, bend_in, mid);
        path.curve_to(bend_out, bend_out, t);
    }
    path
}

fn curved(s: Point, t: Point, curvature: f64) -> BezPath {
    let delta = t - s;
    let distance = delta.hypot();
    let mid = s.midpoint(t);
    let control = if distance > 0.0 {
        let normal = Vec2::new(-delta.y, delta.x) / distance;
        mid + normal * (distance * curvature * 0.5)
    } else {
        mid
    };
    let mut path = BezPath::new();
    path.move_to(s);
    path.quad_to(control, t);
    path
}

/// Right-angle route between two anchors.
///
/// Both sides horizontal: turn at the midpoint x. Both vertical: turn at
/// the midpoint y. Mixed: one bend where the source's axis meets the
/// target's.
fn elbow_points(s: Point, s_side: Side, t: Point, t_side: Side) -> Vec<Point> {
    match (s_side.is_horizontal(), t_side.is_horizontal()) {
        (true, true) => {
            let mx = (s.x + t.x) / 2.0;
            vec![s, Point::new(mx, s.y), Point::new(mx, t.y), t]
        }
        (false, false) => {
            let my = (s.y + t.y) / 2.0;
            vec![s, Point::new(s.x, my), Point::new(t.x, my), t]
        }
        (true, false) => vec![s, Point::new(t.x, s.y), t],
        (false, true) => vec![s, Point::new(s.x, t.y), t],
    }
}

/// Right-angle route with exactly one bend. The source leaves along its
/// own axis and turns once, toward the target, where that axis crosses the
/// target's coordinate. The target side does not affect the route.
fn orthogonal_points(s: Point, s_side: Side, t: Point) -> Vec<Point> {
    let bend = if s_side.is_horizontal() {
        Point::new(t.x, s.y)
    } else {
        Point::new(s.x, t.y)
    };
    vec![s, bend, t]
}

/// Polyline through `points`, each interior corner replaced by a quadratic
/// with the corner as control point. The radius is clamped to half of each
/// adjacent segment.
fn rounded_polyline(points: &[Point], radius: f64) -> BezPath {
    let mut pts: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if pts.last() != Some(&p) {
            pts.push(p);
        }
    }

    let mut path = BezPath::new();
    let Some(&first) = pts.first() else {
        return path;
    };
    path.move_to(first);
    if pts.len() == 1 {
        path.line_to(first);
        return path;
    }

    for w in pts.windows(3) {
        let (prev, corner, next) = (w[0], w[1], w[2]);
        let incoming = corner - prev;
        let outgoing = next - corner;
        let r = radius
            .min(incoming.hypot() / 2.0)
            .min(outgoing.hypot() / 2.0);
        let collinear = incoming.cross(outgoing) == 0.0;
        if r > 0.0 && !collinear {
            path.line_to(corner - incoming / incoming.hypot() * r);
            path.quad_to(corner, corner + outgoing / outgoing.hypot() * r);
        } else {
            path.line_to(corner);
        }
    }
    if let Some(&last) = pts.last() {
        path.line_to(last);
    }
    path
}

// ─── Metadata ────────────────────────────────────────────────────────────

/// First control point that differs from the segment start.
fn leading_direction(seg: PathSeg) -> Option<Vec2> {
    let (start, rest): (Point, Vec<Point>) = match seg {
        PathSeg::Line(l) => (l.p0, vec![l.p1]),
        PathSeg::Quad(q) => (q.p0, vec![q.p1, q.p2]),
        PathSeg::Cubic(c) => (c.p0, vec![c.p1, c.p2, c.p3]),
    };
    rest.into_iter().find(|p| *p != start).map(|p| p - start)
}

fn trailing_direction(seg: PathSeg) -> Option<Vec2> {
    leading_direction(seg.reverse()).map(|v| -v)
}

/// Travel direction at both ends. Zero-length paths fall back to the
/// direction between the endpoints (0 when they coincide).
fn end_angles(path: &BezPath, s: Point, t: Point) -> (f64, f64) {
    let segments: Vec<PathSeg> = path.segments().collect();
    let fallback = if s == t { 0.0 } else { (t - s).atan2() };
    let start = segments
        .iter()
        .find_map(|seg| leading_direction(*seg))
        .map_or(fallback, |v| v.atan2());
    let end = segments
        .iter()
        .rev()
        .find_map(|seg| trailing_direction(*seg))
        .map_or(fallback, |v| v.atan2());
    (start, end)
}

fn arclen_midpoint(path: &BezPath) -> Option<Point> {
    let segments: Vec<PathSeg> = path.segments().collect();
    let lengths: Vec<f64> = segments
        .iter()
        .map(|seg| {
            // Fully collapsed quads make kurbo's closed-form arclen divide by zero.
            if leading_direction(*seg).is_some() {
                seg.arclen(ARCLEN_ACCURACY)
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = lengths.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let mut remaining = total / 2.0;
    for (seg, len) in segments.iter().zip(&lengths) {
        if remaining <= *len {
            let t = seg.inv_arclen(remaining, ARCLEN_ACCURACY);
            return Some(seg.eval(t));
        }
        remaining -= len;
    }
    segments.last().map(|seg| seg.eval(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn anchor(x: f64, y: f64, side: Side) -> Anchor {
        Anchor::new(x, y, side)
    }

    fn path(kind: EdgeKind, s: Anchor, t: Anchor) -> EdgePath {
        generate_path(kind, &s, &t, &PathOptions::default())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-2
    }

    #[test]
    fn straight_between_facing_anchors() {
        let p = path(
            EdgeKind::Straight,
            anchor(0.0, 50.0, Side::Right),
            anchor(100.0, 50.0, Side::Left),
        );
        assert_eq!(p.d, "M 0 50 L 100 50");
        assert_eq!(p.label_point, Point::new(50.0, 50.0));
        assert_eq!(p.start_angle, 0.0);
        assert_eq!(p.end_angle, 0.0);
    }

    #[test]
    fn endpoints_are_rounded() {
        let p = path(
            EdgeKind::Straight,
            anchor(0.4, 49.6, Side::Right),
            anchor(100.5, 50.2, Side::Left),
        );
        assert_eq!(p.d, "M 0 50 L 101 50");
    }

    #[test]
    fn bezier_controls_follow_sides() {
        // Distance 100: offset clamps up to 40.
        let p = path(
            EdgeKind::Bezier,
            anchor(0.0, 0.0, Side::Right),
            anchor(100.0, 0.0, Side::Left),
        );
        assert_eq!(p.d, "M 0 0 C 40 0, 60 0, 100 0");

        // Distance 1000: offset clamps down to 150.
        let p = path(
            EdgeKind::Bezier,
            anchor(0.0, 0.0, Side::Bottom),
            anchor(0.0, 1000.0, Side::Top),
        );
        assert_eq!(p.d, "M 0 0 C 0 150, 0 850, 0 1000");
        assert!(close(p.start_angle, FRAC_PI_2));
        assert!(close(p.end_angle, FRAC_PI_2));
    }

    #[test]
    fn bezier_short_distance_uses_minimum_offset() {
        let p = path(
            EdgeKind::Bezier,
            anchor(0.0, 0.0, Side::Right),
            anchor(20.0, 0.0, Side::Left),
        );
        assert_eq!(p.d, "M 0 0 C 30 0, -10 0, 20 0");
    }

    #[test]
    fn step_horizontal_sides_turn_at_mid_x() {
        let p = path(
            EdgeKind::Step,
            anchor(0.0, 0.0, Side::Right),
            anchor(100.0, 60.0, Side::Left),
        );
        assert_eq!(p.d, "M 0 0 L 50 0 L 50 60 L 100 60");
    }

    #[test]
    fn step_vertical_sides_turn_at_mid_y() {
        let p = path(
            EdgeKind::Step,
            anchor(0.0, 0.0, Side::Bottom),
            anchor(80.0, 100.0, Side::Top),
        );
        assert_eq!(p.d, "M 0 0 L 0 50 L 80 50 L 80 100");
    }

    #[test]
    fn step_mixed_sides_bend_once() {
        let p = path(
            EdgeKind::Step,
            anchor(0.0, 0.0, Side::Right),
            anchor(100.0, 80.0, Side::Top),
        );
        assert_eq!(p.d, "M 0 0 L 100 0 L 100 80");
    }

    #[test]
    fn step_corners_are_rounded_and_clamped() {
        let options = PathOptions {
            corner_radius: 10.0,
            ..Default::default()
        };
        let p = generate_path(
            EdgeKind::Step,
            &anchor(0.0, 0.0, Side::Right),
            &anchor(100.0, 60.0, Side::Left),
            &options,
        );
        assert_eq!(p.d, "M 0 0 L 40 0 Q 50 0, 50 10 L 50 50 Q 50 60, 60 60 L 100 60");

        // Middle segment is only 8 long, so the radius clamps to 4.
        let options = PathOptions {
            corner_radius: 50.0,
            ..Default::default()
        };
        let p = generate_path(
            EdgeKind::Step,
            &anchor(0.0, 0.0, Side::Right),
            &anchor(100.0, 8.0, Side::Left),
            &options,
        );
        assert_eq!(p.d, "M 0 0 L 46 0 Q 50 0, 50 4 L 50 4 Q 50 8, 54 8 L 100 8");
    }

    #[test]
    fn step_aligned_anchors_stay_straight() {
        let options = PathOptions {
            corner_radius: 10.0,
            ..Default::default()
        };
        let p = generate_path(
            EdgeKind::Step,
            &anchor(0.0, 40.0, Side::Right),
            &anchor(100.0, 40.0, Side::Left),
            &options,
        );
        assert_eq!(p.d, "M 0 40 L 50 40 L 100 40");
    }

    #[test]
    fn orthogonal_is_never_rounded() {
        let options = PathOptions {
            corner_radius: 10.0,
            ..Default::default()
        };
        let p = generate_path(
            EdgeKind::Orthogonal,
            &anchor(0.0, 0.0, Side::Bottom),
            &anchor(100.0, 80.0, Side::Left),
            &options,
        );
        assert_eq!(p.d, "M 0 0 L 0 80 L 100 80");
    }

    #[test]
    fn orthogonal_bends_once_where_step_bends_twice() {
        let (s, t) = (anchor(0.0, 0.0, Side::Right), anchor(100.0, 60.0, Side::Left));
        let step = path(EdgeKind::Step, s, t);
        let orthogonal = path(EdgeKind::Orthogonal, s, t);
        assert_eq!(step.d, "M 0 0 L 50 0 L 50 60 L 100 60");
        assert_eq!(orthogonal.d, "M 0 0 L 100 0 L 100 60");
        assert!(close(orthogonal.start_angle, 0.0));
        assert!(close(orthogonal.end_angle, FRAC_PI_2));

        let (s, t) = (anchor(0.0, 0.0, Side::Bottom), anchor(80.0, 100.0, Side::Top));
        assert_eq!(path(EdgeKind::Step, s, t).d, "M 0 0 L 0 50 L 80 50 L 80 100");
        assert_eq!(path(EdgeKind::Orthogonal, s, t).d, "M 0 0 L 0 100 L 80 100");
    }

    #[test]
    fn orthogonal_aligned_anchors_stay_straight() {
        let p = path(
            EdgeKind::Orthogonal,
            anchor(0.0, 40.0, Side::Right),
            anchor(100.0, 40.0, Side::Left),
        );
        assert_eq!(p.d, "M 0 40 L 100 40");
    }

    #[test]
    fn smooth_step_passes_through_midpoint() {
        let p = path(
            EdgeKind::SmoothStep,
            anchor(0.0, 0.0, Side::Right),
            anchor(100.0, 60.0, Side::Left),
        );
        assert_eq!(p.d, "M 0 0 C 50 0, 50 0, 50 30 C 50 60, 50 60, 100 60");
        assert!(close(p.start_angle, 0.0));
        assert!(close(p.end_angle, 0.0));

        let p = path(
            EdgeKind::SmoothStep,
            anchor(0.0, 0.0, Side::Bottom),
            anchor(60.0, 100.0, Side::Left),
        );
        assert_eq!(p.d, "M 0 0 C 0 50, 0 50, 30 50 C 60 50, 60 50, 60 100");
    }

    #[test]
    fn curved_control_is_offset_perpendicular() {
        let p = generate_path(
            EdgeKind::Curved,
            &anchor(0.0, 0.0, Side::Right),
            &anchor(200.0, 0.0, Side::Left),
            &PathOptions {
                curvature: 0.5,
                ..Default::default()
            },
        );
        // 200 * 0.5 * 0.5 = 50 along the left-hand normal (0, 1).
        assert_eq!(p.d, "M 0 0 Q 100 50, 200 0");
        assert!(close(p.label_point.x, 100.0));
        assert!(close(p.label_point.y, 25.0));
    }

    #[test]
    fn coincident_anchors_are_nan_free() {
        for kind in [
            EdgeKind::Straight,
            EdgeKind::Bezier,
            EdgeKind::Step,
            EdgeKind::SmoothStep,
            EdgeKind::Curved,
            EdgeKind::Orthogonal,
        ] {
            let p = path(kind, anchor(10.0, 10.0, Side::Left), anchor(10.0, 10.0, Side::Left));
            assert!(!p.d.contains("NaN"), "{kind:?}: {}", p.d);
            assert!(p.start_angle.is_finite() && p.end_angle.is_finite());
            assert!(p.label_point.x.is_finite() && p.label_point.y.is_finite());
        }
    }

    #[test]
    fn reversed_straight_points_left() {
        let p = path(
            EdgeKind::Straight,
            anchor(100.0, 0.0, Side::Left),
            anchor(0.0, 0.0, Side::Right),
        );
        assert!(close(p.end_angle.abs(), PI));
    }

    #[test]
    fn options_from_edge() {
        let mut edge = Edge::between("e", "a", "b");
        assert_eq!(PathOptions::for_edge(&edge), PathOptions::default());
        edge.curvature = Some(0.8);
        edge.corner_radius = Some(6.0);
        assert_eq!(
            PathOptions::for_edge(&edge),
            PathOptions {
                curvature: 0.8,
                corner_radius: 6.0
            }
        );
    }
}
