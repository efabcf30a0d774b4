//! Static alignment pass for guide overlays.
//!
//! Reports which shapes already share an edge or center line, independent
//! of any drag. Nothing is moved. Coordinates are grouped greedily: each
//! value joins the first same-axis group whose representative lies within
//! the tolerance, otherwise it opens a new group.

use crate::id::NodeId;
use crate::model::{CanvasSize, Shape};
use crate::snap::{GuideAxis, SnapGuide};
use smallvec::SmallVec;

pub const DEFAULT_ALIGNMENT_TOLERANCE: f64 = 2.0;

/// Upper bound on reported guides, keeping dense canvases cheap to draw.
pub const MAX_ALIGNMENT_GUIDES: usize = 20;

struct AlignmentGroup {
    axis: GuideAxis,
    /// Value of the coordinate that opened the group.
    position: f64,
    node_ids: SmallVec<[NodeId; 4]>,
    start: f64,
    end: f64,
}

/// Find groups of mutually aligned edges and centers among `shapes`.
///
/// Only groups with at least two distinct shapes are reported, in the order
/// they were first opened, truncated to [`MAX_ALIGNMENT_GUIDES`].
pub fn find_alignment_guides(shapes: &[Shape], canvas: CanvasSize, tolerance: f64) -> Vec<SnapGuide> {
    let mut groups: Vec<AlignmentGroup> = Vec::new();

    for shape in shapes {
        let b = shape.bounds();
        let vertical = [b.left(), b.right(), b.center_x()].map(|v| (GuideAxis::Vertical, v, b.top(), b.bottom()));
        let horizontal =
            [b.top(), b.bottom(), b.center_y()].map(|v| (GuideAxis::Horizontal, v, b.left(), b.right()));

        for (axis, value, span_start, span_end) in vertical.into_iter().chain(horizontal) {
            let existing = groups
                .iter_mut()
                .find(|g| g.axis == axis && (g.position - value).abs() <= tolerance);
            match existing {
                Some(group) => {
                    if !group.node_ids.contains(&shape.id) {
                        group.node_ids.push(shape.id);
                    }
                    group.start = group.start.min(span_start);
                    group.end = group.end.max(span_end);
                }
                None => groups.push(AlignmentGroup {
                    axis,
                    position: value,
                    node_ids: SmallVec::from_slice(&[shape.id]),
                    start: span_start,
                    end: span_end,
                }),
            }
        }
    }

    groups
        .into_iter()
        .filter(|g| g.node_ids.len() >= 2)
        .take(MAX_ALIGNMENT_GUIDES)
        .enumerate()
        .map(|(i, g)| {
            let limit = match g.axis {
                GuideAxis::Horizontal => canvas.width,
                GuideAxis::Vertical => canvas.height,
            };
            let start = g.start.clamp(0.0, limit.max(0.0));
            let end = g.end.clamp(start, limit.max(start));
            SnapGuide {
                id: format!("align-{}-{i}", g.axis.as_str()),
                axis: g.axis,
                position: g.position,
                strength: g.node_ids.len() as u32,
                node_ids: g.node_ids,
                start,
                end,
            }
        })
        .collect()
}
