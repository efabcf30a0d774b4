//! Integration tests: drag → snap → history → edge geometry.

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use wb_core::model::{CanvasSize, Edge, EdgeKind, Point, Scene, Shape};
use wb_core::{NodeId, SnapEngine, SnapSettings, calculate_snap_position};
use wb_editor::{DragSession, SharedScene, UndoRedoManager};
use wb_render::edge_geometry;

fn board() -> SharedScene {
    let mut scene = Scene::new();
    scene.add_shape(Shape::rect("left", 100.0, 100.0, 120.0, 60.0));
    scene.add_shape(Shape::rect("right", 500.0, 300.0, 120.0, 60.0));
    scene.add_edge(Edge::between("link", "left", "right").with_kind(EdgeKind::Straight));
    Rc::new(RefCell::new(scene))
}

fn link_path(scene: &SharedScene) -> String {
    let scene = scene.borrow();
    let edge = scene.edge(NodeId::intern("link")).unwrap();
    edge_geometry(edge, &scene).unwrap().path.d
}

fn settings() -> SnapSettings {
    SnapSettings {
        snap_to_canvas: false,
        ..Default::default()
    }
}

#[test]
fn snapped_drag_reroutes_edge_and_undoes_in_one_step() {
    let scene = board();
    let manager = UndoRedoManager::default();
    let mut engine = SnapEngine::new();
    engine.rebuild_index(scene.borrow().shapes());

    let original = link_path(&scene);
    assert_eq!(original, "M 220 130 L 500 330");

    let mut drag = DragSession::begin(&scene, NodeId::intern("right")).unwrap();
    for y in [250.0, 180.0, 104.0] {
        drag.update(Point::new(500.0, y), &mut engine, CanvasSize::default(), &settings())
            .unwrap();
    }
    // Top edge 104 snaps onto the left shape's top edge at 100.
    assert_eq!(drag.current(), Point::new(500.0, 100.0));
    assert!(drag.finish(&manager));

    assert_eq!(link_path(&scene), "M 220 130 L 500 130");
    assert_eq!(manager.len(), 1);

    assert!(manager.undo());
    assert_eq!(link_path(&scene), original);
    assert!(manager.redo());
    assert_eq!(link_path(&scene), "M 220 130 L 500 130");
}

#[test]
fn consecutive_debounced_drags_collapse() {
    let scene = board();
    let manager = UndoRedoManager::default();
    let mut engine = SnapEngine::new();
    let off = SnapSettings {
        enabled: false,
        ..Default::default()
    };
    let t0 = Instant::now();

    let mut first = DragSession::begin(&scene, NodeId::intern("right")).unwrap();
    first
        .update(Point::new(600.0, 300.0), &mut engine, CanvasSize::default(), &off)
        .unwrap();
    assert!(first.finish_debounced(&manager, t0));

    let mut second = DragSession::begin(&scene, NodeId::intern("right")).unwrap();
    second
        .update(Point::new(700.0, 300.0), &mut engine, CanvasSize::default(), &off)
        .unwrap();
    assert!(second.finish_debounced(&manager, t0 + Duration::from_millis(50)));

    assert!(manager.poll(t0 + Duration::from_millis(400)));
    assert_eq!(manager.len(), 1);

    // Only the second move is recorded; its inverse is where that drag began.
    assert!(manager.undo());
    let position = scene.borrow().shape(NodeId::intern("right")).unwrap().position;
    assert_eq!(position, Point::new(600.0, 300.0));
}

#[test]
fn later_drag_sees_where_neighbours_moved() {
    let scene = board();
    let manager = UndoRedoManager::default();
    let mut engine = SnapEngine::new();
    engine.rebuild_index(scene.borrow().shapes());
    let target = Point::new(500.0, 104.0);

    let mut drag = DragSession::begin(&scene, NodeId::intern("right")).unwrap();
    let first = drag.update(target, &mut engine, CanvasSize::default(), &settings()).unwrap();
    assert_eq!(first.position, Point::new(500.0, 100.0));
    assert!(drag.finish(&manager));
    assert!(manager.undo());

    let mut drag = DragSession::begin(&scene, NodeId::intern("left")).unwrap();
    drag.update(Point::new(100.0, 600.0), &mut engine, CanvasSize::default(), &settings())
        .unwrap();
    assert!(drag.finish(&manager));

    // Same shape, target and settings as the first drag, but the top edge
    // it snapped to has moved away.
    let mut drag = DragSession::begin(&scene, NodeId::intern("right")).unwrap();
    let again = drag.update(target, &mut engine, CanvasSize::default(), &settings()).unwrap();
    let expected = {
        let scene = scene.borrow();
        let right = scene.shape(NodeId::intern("right")).unwrap();
        calculate_snap_position(right, target, scene.shapes(), CanvasSize::default(), &settings(), None)
    };
    assert_eq!(again, expected);
    assert!(!again.snapped);
    assert_eq!(again.position, target);
}
