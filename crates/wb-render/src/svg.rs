//! SVG path-data output for kurbo paths.

use kurbo::{BezPath, PathEl, Point};

/// Format a coordinate: whole numbers print without decimals, anything else
/// with at most two. `-0` prints as `0`, non-finite values as `0`.
pub fn fmt_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0".to_string()
    } else if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

fn fmt_point(p: Point) -> String {
    format!("{} {}", fmt_num(p.x), fmt_num(p.y))
}

/// Render a path as SVG `d` attribute data.
///
/// Commands are absolute and space separated; control points within one
/// command are separated by commas, e.g. `M 0 0 Q 50 20, 100 0`.
pub fn to_svg_path(path: &BezPath) -> String {
    let parts: Vec<String> = path
        .elements()
        .iter()
        .map(|el| match *el {
            PathEl::MoveTo(p) => format!("M {}", fmt_point(p)),
            PathEl::LineTo(p) => format!("L {}", fmt_point(p)),
            PathEl::QuadTo(c, p) => format!("Q {}, {}", fmt_point(c), fmt_point(p)),
            PathEl::CurveTo(c1, c2, p) => {
                format!("C {}, {}, {}", fmt_point(c1), fmt_point(c2), fmt_point(p))
            }
            PathEl::ClosePath => "Z".to_string(),
        })
        .collect();
    parts.join(" ")
}
