//! Reversible scene edits.
//!
//! A [`SceneMutation`] is a single structural or geometric change to a
//! shared [`Scene`]. [`compute_inverse`] reads the scene before the change
//! and produces the mutation that restores it; [`MutationCommand`] pairs
//! the two so the history manager can undo it.

use crate::command::{Command, CommandMeta, CommandResult};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wb_core::NodeId;
use wb_core::model::{Edge, EdgeKind, Point, Scene, Shape};

/// Scene shared between the host, commands and drag sessions.
pub type SharedScene = Rc<RefCell<Scene>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneMutation {
    /// Move a shape's top-left corner to an absolute position.
    MoveShape { id: NodeId, x: f64, y: f64 },
    /// Set explicit dimensions. Measured and style sizes are cleared so the
    /// new size takes effect.
    ResizeShape { id: NodeId, width: f64, height: f64 },
    /// Insert at `index` in paint order, or append.
    AddShape { index: Option<usize>, shape: Shape },
    /// Remove a shape. Edges attached to it stay and stop rendering.
    RemoveShape { id: NodeId },
    AddEdge { index: Option<usize>, edge: Edge },
    RemoveEdge { id: NodeId },
    SetEdgeKind { id: NodeId, kind: EdgeKind },
    /// Overwrite a shape wholesale, keeping its paint order.
    ReplaceShape { shape: Shape },
}

impl SceneMutation {
    /// Short tag used as the command kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SceneMutation::MoveShape { .. } => "move_shape",
            SceneMutation::ResizeShape { .. } => "resize_shape",
            SceneMutation::AddShape { .. } => "add_shape",
            SceneMutation::RemoveShape { .. } => "remove_shape",
            SceneMutation::AddEdge { .. } => "add_edge",
            SceneMutation::RemoveEdge { .. } => "remove_edge",
            SceneMutation::SetEdgeKind { .. } => "set_edge_kind",
            SceneMutation::ReplaceShape { .. } => "replace_shape",
        }
    }

    /// Id of the shape or edge the mutation touches.
    pub fn target(&self) -> NodeId {
        match self {
            SceneMutation::MoveShape { id, .. }
            | SceneMutation::ResizeShape { id, .. }
            | SceneMutation::RemoveShape { id }
            | SceneMutation::RemoveEdge { id }
            | SceneMutation::SetEdgeKind { id, .. } => *id,
            SceneMutation::AddShape { shape, .. } | SceneMutation::ReplaceShape { shape } => shape.id,
            SceneMutation::AddEdge { edge, .. } => edge.id,
        }
    }

    pub fn apply(&self, scene: &mut Scene) -> Result<(), String> {
        match self {
            SceneMutation::MoveShape { id, x, y } => {
                shape_mut(scene, *id)?.position = Point::new(*x, *y);
            }
            SceneMutation::ResizeShape { id, width, height } => {
                let shape = shape_mut(scene, *id)?;
                shape.width = Some(*width);
                shape.height = Some(*height);
                shape.measured_size = None;
                shape.style_size = None;
            }
            SceneMutation::AddShape { index, shape } => {
                if scene.shape(shape.id).is_some() {
                    return Err(format!("shape `{}` already exists", shape.id));
                }
                match index {
                    Some(i) => scene.insert_shape(*i, shape.clone()),
                    None => scene.add_shape(shape.clone()),
                }
            }
            SceneMutation::RemoveShape { id } => {
                scene
                    .remove_shape(*id)
                    .ok_or_else(|| format!("shape `{id}` not found"))?;
            }
            SceneMutation::AddEdge { index, edge } => {
                if scene.edge(edge.id).is_some() {
                    return Err(format!("edge `{}` already exists", edge.id));
                }
                match index {
                    Some(i) => scene.insert_edge(*i, edge.clone()),
                    None => scene.add_edge(edge.clone()),
                }
            }
            SceneMutation::RemoveEdge { id } => {
                scene
                    .remove_edge(*id)
                    .ok_or_else(|| format!("edge `{id}` not found"))?;
            }
            SceneMutation::SetEdgeKind { id, kind } => {
                scene
                    .edge_mut(*id)
                    .ok_or_else(|| format!("edge `{id}` not found"))?
                    .kind = *kind;
            }
            SceneMutation::ReplaceShape { shape } => {
                *shape_mut(scene, shape.id)? = shape.clone();
            }
        }
        Ok(())
    }
}

fn shape_mut(scene: &mut Scene, id: NodeId) -> Result<&mut Shape, String> {
    scene
        .shape_mut(id)
        .ok_or_else(|| format!("shape `{id}` not found"))
}

fn shape_ref(scene: &Scene, id: NodeId) -> Result<&Shape, String> {
    scene.shape(id).ok_or_else(|| format!("shape `{id}` not found"))
}

fn edge_index(scene: &Scene, id: NodeId) -> Result<usize, String> {
    scene
        .edges()
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| format!("edge `{id}` not found"))
}

/// The mutation that undoes `mutation`, computed from `scene` as it is
/// before `mutation` is applied.
pub fn compute_inverse(scene: &Scene, mutation: &SceneMutation) -> Result<SceneMutation, String> {
    Ok(match mutation {
        SceneMutation::MoveShape { id, .. } => {
            let position = shape_ref(scene, *id)?.position;
            SceneMutation::MoveShape {
                id: *id,
                x: position.x,
                y: position.y,
            }
        }
        SceneMutation::ResizeShape { id, .. } => SceneMutation::ReplaceShape {
            shape: shape_ref(scene, *id)?.clone(),
        },
        SceneMutation::ReplaceShape { shape } => SceneMutation::ReplaceShape {
            shape: shape_ref(scene, shape.id)?.clone(),
        },
        SceneMutation::AddShape { shape, .. } => SceneMutation::RemoveShape { id: shape.id },
        SceneMutation::RemoveShape { id } => {
            let index = scene
                .shapes()
                .iter()
                .position(|s| s.id == *id)
                .ok_or_else(|| format!("shape `{id}` not found"))?;
            SceneMutation::AddShape {
                index: Some(index),
                shape: scene.shapes()[index].clone(),
            }
        }
        SceneMutation::AddEdge { edge, .. } => SceneMutation::RemoveEdge { id: edge.id },
        SceneMutation::RemoveEdge { id } => {
            let index = edge_index(scene, *id)?;
            SceneMutation::AddEdge {
                index: Some(index),
                edge: scene.edges()[index].clone(),
            }
        }
        SceneMutation::SetEdgeKind { id, .. } => {
            let index = edge_index(scene, *id)?;
            SceneMutation::SetEdgeKind {
                id: *id,
                kind: scene.edges()[index].kind,
            }
        }
    })
}

// ─── Command ─────────────────────────────────────────────────────────────

/// A scene mutation as an undoable command.
///
/// The inverse is computed from the scene on first execute unless one was
/// supplied up front (e.g. by a drag session that already moved the shape).
pub struct MutationCommand {
    meta: CommandMeta,
    scene: SharedScene,
    forward: SceneMutation,
    inverse: Option<SceneMutation>,
}

impl MutationCommand {
    pub fn new(scene: SharedScene, mutation: SceneMutation) -> Self {
        Self {
            meta: CommandMeta::new(mutation.kind()),
            scene,
            forward: mutation,
            inverse: None,
        }
    }

    pub fn with_inverse(mut self, inverse: SceneMutation) -> Self {
        self.inverse = Some(inverse);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta = self.meta.with_description(description);
        self
    }

    pub fn forward(&self) -> &SceneMutation {
        &self.forward
    }

    pub fn inverse(&self) -> Option<&SceneMutation> {
        self.inverse.as_ref()
    }

    fn apply(&self, mutation: &SceneMutation) -> CommandResult {
        let mut scene = self
            .scene
            .try_borrow_mut()
            .map_err(|_| "scene is already borrowed".to_string())?;
        mutation.apply(&mut scene)
    }
}

impl Command for MutationCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn execute(&mut self) -> CommandResult {
        if self.inverse.is_none() {
            let inverse = {
                let scene = self
                    .scene
                    .try_borrow()
                    .map_err(|_| "scene is already borrowed".to_string())?;
                compute_inverse(&scene, &self.forward)?
            };
            self.inverse = Some(inverse);
        }
        self.apply(&self.forward)
    }

    fn undo(&mut self) -> CommandResult {
        let inverse = self
            .inverse
            .as_ref()
            .ok_or_else(|| format!("{} was never executed", self.forward.kind()))?;
        self.apply(inverse)
    }

    fn redo(&mut self) -> CommandResult {
        self.apply(&self.forward)
    }
}
