//! Lint diagnostics for canvas scenes.
//!
//! Reports inputs the geometry kernel treats as degenerate without
//! modifying the scene. The renderer skips dangling edges on its own; lint
//! exists so hosts can surface the problem to the user.

use crate::id::NodeId;
use crate::model::Scene;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Likely a mistake; something will not render.
    Warning,
    Info,
}

/// A single lint finding for a shape or edge.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    pub element_id: NodeId,
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "dangling-edge").
    pub rule: &'static str,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run all lint rules over the scene.
#[must_use]
pub fn lint_scene(scene: &Scene) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_duplicate_ids(scene, &mut diags);
    lint_dangling_edges(scene, &mut diags);
    lint_self_loops(scene, &mut diags);
    lint_degenerate_sizes(scene, &mut diags);
    diags
}

// ─── Rules ───────────────────────────────────────────────────────────────

/// Shape and edge ids share one namespace; lookups return the first match.
fn lint_duplicate_ids(scene: &Scene, diags: &mut Vec<LintDiagnostic>) {
    let mut seen = HashSet::new();
    let ids = scene
        .shapes()
        .iter()
        .map(|s| s.id)
        .chain(scene.edges().iter().map(|e| e.id));
    for id in ids {
        if !seen.insert(id) {
            diags.push(LintDiagnostic {
                element_id: id,
                message: format!("Duplicate id `{id}`; only the first element with it is addressable."),
                severity: LintSeverity::Warning,
                rule: "duplicate-id",
            });
        }
    }
}

fn lint_dangling_edges(scene: &Scene, diags: &mut Vec<LintDiagnostic>) {
    for edge in scene.edges() {
        let missing: Vec<NodeId> = [edge.source, edge.target]
            .into_iter()
            .filter(|id| scene.shape(*id).is_none())
            .collect();
        if missing.is_empty() {
            continue;
        }
        let names: Vec<&str> = missing.iter().map(|id| id.as_str()).collect();
        diags.push(LintDiagnostic {
            element_id: edge.id,
            message: format!(
                "Edge `{}` references missing shape(s) {} and will not be drawn.",
                edge.id,
                names.join(", ")
            ),
            severity: LintSeverity::Warning,
            rule: "dangling-edge",
        });
    }
}

fn lint_self_loops(scene: &Scene, diags: &mut Vec<LintDiagnostic>) {
    for edge in scene.edges().iter().filter(|e| e.source == e.target) {
        diags.push(LintDiagnostic {
            element_id: edge.id,
            message: format!(
                "Edge `{}` connects `{}` to itself; both ends attach to the same side.",
                edge.id, edge.source
            ),
            severity: LintSeverity::Info,
            rule: "self-loop",
        });
    }
}

fn lint_degenerate_sizes(scene: &Scene, diags: &mut Vec<LintDiagnostic>) {
    for shape in scene.shapes() {
        let size = shape.effective_size();
        if size.width > 0.0 && size.height > 0.0 {
            continue;
        }
        diags.push(LintDiagnostic {
            element_id: shape.id,
            message: format!(
                "Shape `{}` has an effective size of {}×{}; it cannot be hit or anchored sensibly.",
                shape.id, size.width, size.height
            ),
            severity: LintSeverity::Info,
            rule: "degenerate-size",
        });
    }
}
