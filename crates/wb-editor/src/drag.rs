//! Drag gestures: live snapped movement, one history entry at the end.
//!
//! While the pointer moves, each [`DragSession::update`] snaps the proposed
//! position and writes it straight into the scene. Finishing records a
//! single move command whose inverse is the position the drag started
//! from, so undo returns the shape there in one step.

use crate::history::UndoRedoManager;
use crate::mutation::{MutationCommand, SceneMutation, SharedScene};
use std::time::Instant;
use wb_core::NodeId;
use wb_core::model::{CanvasSize, Point};
use wb_core::snap::{SnapEngine, SnapResult, SnapSettings};

#[derive(Debug)]
pub struct DragSession {
    scene: SharedScene,
    shape_id: NodeId,
    start: Point,
    current: Point,
}

impl DragSession {
    pub fn begin(scene: &SharedScene, shape_id: NodeId) -> Result<Self, String> {
        let start = scene
            .borrow()
            .shape(shape_id)
            .map(|s| s.position)
            .ok_or_else(|| format!("shape `{shape_id}` not found"))?;
        log::trace!("drag start {shape_id} at ({}, {})", start.x, start.y);
        Ok(Self {
            scene: scene.clone(),
            shape_id,
            start,
            current: start,
        })
    }

    pub fn shape_id(&self) -> NodeId {
        self.shape_id
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn current(&self) -> Point {
        self.current
    }

    /// Snap `target` and move the shape there.
    pub fn update(
        &mut self,
        target: Point,
        engine: &mut SnapEngine,
        canvas: CanvasSize,
        settings: &SnapSettings,
    ) -> Result<SnapResult, String> {
        let mut scene = self.scene.borrow_mut();
        let dragged = scene
            .shape(self.shape_id)
            .cloned()
            .ok_or_else(|| format!("shape `{}` was removed during drag", self.shape_id))?;
        let result = engine.calculate(&dragged, target, scene.shapes(), canvas, settings);
        if let Some(shape) = scene.shape_mut(self.shape_id) {
            shape.position = result.position;
        }
        self.current = result.position;
        Ok(result)
    }

    fn into_command(self) -> Option<MutationCommand> {
        if self.current == self.start {
            return None;
        }
        let forward = SceneMutation::MoveShape {
            id: self.shape_id,
            x: self.current.x,
            y: self.current.y,
        };
        let inverse = SceneMutation::MoveShape {
            id: self.shape_id,
            x: self.start.x,
            y: self.start.y,
        };
        Some(
            MutationCommand::new(self.scene, forward)
                .with_inverse(inverse)
                .with_description(format!("Move {}", self.shape_id)),
        )
    }

    /// Record the move. Returns `false` if the shape did not move or the
    /// manager rejected the command.
    pub fn finish(self, manager: &UndoRedoManager) -> bool {
        match self.into_command() {
            Some(command) => manager.execute(command),
            None => false,
        }
    }

    /// Record the move through the manager's debounce window, replacing
    /// any move still pending from an earlier drag.
    pub fn finish_debounced(self, manager: &UndoRedoManager, now: Instant) -> bool {
        match self.into_command() {
            Some(command) => {
                manager.execute_debounced_at(Box::new(command), now);
                true
            }
            None => false,
        }
    }

    /// Put the shape back where the drag started and drop any pending
    /// debounced command.
    pub fn abort(self, manager: &UndoRedoManager) {
        if let Some(shape) = self.scene.borrow_mut().shape_mut(self.shape_id) {
            shape.position = self.start;
        }
        manager.cancel_debounced();
        log::trace!("drag of {} aborted", self.shape_id);
    }
}
