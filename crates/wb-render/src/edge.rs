//! Per-edge geometry assembly.
//!
//! Resolves both endpoints against the scene and skips edges that do not
//! resolve, so anchor and path generation only ever see real shapes.

use crate::anchor::{Anchor, resolve_edge_anchors};
use crate::marker::{MarkerGlyph, edge_markers};
use crate::path::{EdgePath, PathOptions, generate_path};
use smallvec::SmallVec;
use wb_core::NodeId;
use wb_core::model::{Edge, Scene};

#[derive(Debug, Clone)]
pub struct EdgeGeometry {
    pub edge_id: NodeId,
    pub source_anchor: Anchor,
    pub target_anchor: Anchor,
    pub path: EdgePath,
    pub markers: SmallVec<[MarkerGlyph; 2]>,
    pub label: Option<String>,
    pub animated: bool,
}

/// Everything needed to draw `edge`, or `None` if either endpoint is
/// missing from the scene.
pub fn edge_geometry(edge: &Edge, scene: &Scene) -> Option<EdgeGeometry> {
    let Some((source_anchor, target_anchor)) = resolve_edge_anchors(edge, scene) else {
        log::trace!(
            "skipping edge {}: endpoint {} -> {} not in scene",
            edge.id,
            edge.source,
            edge.target
        );
        return None;
    };
    let path = generate_path(
        edge.kind,
        &source_anchor,
        &target_anchor,
        &PathOptions::for_edge(edge),
    );
    Some(EdgeGeometry {
        edge_id: edge.id,
        source_anchor,
        target_anchor,
        markers: edge_markers(edge, &path),
        path,
        label: edge.label.clone(),
        animated: edge.animated,
    })
}

/// Geometry for every drawable edge, in scene order.
pub fn scene_geometry(scene: &Scene) -> Vec<EdgeGeometry> {
    scene
        .edges()
        .iter()
        .filter_map(|edge| edge_geometry(edge, scene))
        .collect()
}
