//! Scene fingerprints for staleness detection.
//!
//! Two hashes are kept per scene:
//!
//! - **structure**: which shapes exist (id + kind) and how edges connect
//!   them (source, target, edge kind). Moving or resizing shapes does not
//!   change it.
//! - **layout**: structure plus effective bounds and edge parameters.
//!
//! Both are independent of paint order. Consumers cache derived data (edge
//! geometry, guide overlays, exports) against a fingerprint and recompute
//! when it goes stale.

use crate::id::NodeId;
use crate::model::{Edge, Scene, Shape};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub structure: u64,
    pub layout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintChange {
    Unchanged,
    /// Same shapes and connections, different geometry or edge parameters.
    LayoutOnly,
    Structural,
}

impl Fingerprint {
    pub fn of(scene: &Scene) -> Self {
        Self {
            structure: structure_hash(scene),
            layout: layout_hash(scene),
        }
    }

    /// Whether `scene` no longer matches this fingerprint.
    pub fn is_stale(&self, scene: &Scene) -> bool {
        *self != Self::of(scene)
    }

    pub fn diff(&self, other: &Fingerprint) -> FingerprintChange {
        if self.structure != other.structure {
            FingerprintChange::Structural
        } else if self.layout != other.layout {
            FingerprintChange::LayoutOnly
        } else {
            FingerprintChange::Unchanged
        }
    }
}

/// Connectivity graph of a scene: shape nodes, one graph edge per scene
/// edge whose endpoints both resolve. Dangling edges are hashed separately.
struct SceneGraph<'a> {
    graph: DiGraph<&'a Shape, &'a Edge>,
    dangling: Vec<&'a Edge>,
}

impl<'a> SceneGraph<'a> {
    fn build(scene: &'a Scene) -> Self {
        let mut graph = DiGraph::new();
        let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();
        for shape in scene.shapes() {
            index.insert(shape.id, graph.add_node(shape));
        }
        let mut dangling = Vec::new();
        for edge in scene.edges() {
            match (index.get(&edge.source), index.get(&edge.target)) {
                (Some(&s), Some(&t)) => {
                    graph.add_edge(s, t, edge);
                }
                _ => dangling.push(edge),
            }
        }
        Self { graph, dangling }
    }

    /// Node indices sorted by shape id.
    fn sorted_nodes(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id));
        nodes
    }

    /// Outgoing edges of `node`, sorted by edge id.
    fn sorted_outgoing(&self, node: NodeIndex) -> Vec<&'a Edge> {
        let mut out: Vec<&'a Edge> = self.graph.edges(node).map(|e| *e.weight()).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

fn hash_edge_structure(edge: &Edge, h: &mut DefaultHasher) {
    edge.id.as_str().hash(h);
    edge.source.as_str().hash(h);
    edge.target.as_str().hash(h);
    edge.kind.hash(h);
}

fn hash_f64(value: f64, h: &mut DefaultHasher) {
    // Normalize -0.0 so it hashes like 0.0.
    (value + 0.0).to_bits().hash(h);
}

fn hash_opt_f64(value: Option<f64>, h: &mut DefaultHasher) {
    value.is_some().hash(h);
    if let Some(v) = value {
        hash_f64(v, h);
    }
}

fn hash_scene(scene: &Scene, with_layout: bool) -> u64 {
    let sg = SceneGraph::build(scene);
    let mut h = DefaultHasher::new();

    for node in sg.sorted_nodes() {
        let shape = sg.graph[node];
        shape.id.as_str().hash(&mut h);
        shape.kind.hash(&mut h);
        if with_layout {
            let b = shape.bounds();
            for v in [b.x, b.y, b.width, b.height] {
                hash_f64(v, &mut h);
            }
        }
        for edge in sg.sorted_outgoing(node) {
            hash_edge_structure(edge, &mut h);
            if with_layout {
                hash_edge_params(edge, &mut h);
            }
        }
    }

    let mut dangling = sg.dangling;
    dangling.sort_by(|a, b| a.id.cmp(&b.id));
    dangling.len().hash(&mut h);
    for edge in dangling {
        hash_edge_structure(edge, &mut h);
        if with_layout {
            hash_edge_params(edge, &mut h);
        }
    }

    h.finish()
}

fn hash_edge_params(edge: &Edge, h: &mut DefaultHasher) {
    hash_opt_f64(edge.curvature, h);
    hash_opt_f64(edge.corner_radius, h);
    for marker in [&edge.marker_start, &edge.marker_end] {
        marker.is_some().hash(h);
        if let Some(m) = marker {
            m.kind.hash(h);
            hash_f64(m.size, h);
            m.color.hash(h);
        }
    }
    edge.animated.hash(h);
    edge.label.hash(h);
}

/// Hash of shape identities and edge connectivity.
pub fn structure_hash(scene: &Scene) -> u64 {
    hash_scene(scene, false)
}

/// Hash of structure plus geometry and edge parameters.
pub fn layout_hash(scene: &Scene) -> u64 {
    hash_scene(scene, true)
}
