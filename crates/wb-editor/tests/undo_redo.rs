//! Integration tests: undo/redo manager (wb-editor).
//!
//! Exercises the manager against closure commands, scene mutations and the
//! drag flow, including the error and re-entrancy paths.

use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};
use wb_core::NodeId;
use wb_core::model::{Edge, EdgeKind, Scene, Shape};
use wb_editor::{
    Command, FnCommand, HistoryConfig, MutationCommand, SceneMutation, SharedScene, UndoRedoManager,
};

type Trace = Rc<RefCell<Vec<String>>>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Command that pushes `value` onto a shared stack and pops it on undo.
fn push(stack: &Rc<RefCell<Vec<i32>>>, value: i32) -> FnCommand {
    let (a, b) = (stack.clone(), stack.clone());
    FnCommand::new(
        "push",
        move || {
            a.borrow_mut().push(value);
            Ok(())
        },
        move || {
            b.borrow_mut().pop();
            Ok(())
        },
    )
    .with_description(format!("push {value}"))
}

fn traced(trace: &Trace, name: &'static str) -> Box<dyn Command> {
    let (a, b) = (trace.clone(), trace.clone());
    Box::new(FnCommand::new(
        "traced",
        move || {
            a.borrow_mut().push(format!("{name}.execute"));
            Ok(())
        },
        move || {
            b.borrow_mut().push(format!("{name}.undo"));
            Ok(())
        },
    ))
}

fn shared_scene() -> SharedScene {
    let mut scene = Scene::new();
    scene.add_shape(Shape::rect("a", 0.0, 0.0, 100.0, 50.0));
    scene.add_shape(Shape::rect("b", 300.0, 0.0, 100.0, 50.0));
    scene.add_edge(Edge::between("ab", "a", "b"));
    Rc::new(RefCell::new(scene))
}

// ─── Round trip ──────────────────────────────────────────────────────────

#[test]
fn n_undos_restore_initial_state_and_n_redos_replay() {
    let stack = Rc::new(RefCell::new(Vec::new()));
    let manager = UndoRedoManager::default();

    for v in 1..=5 {
        assert!(manager.execute(push(&stack, v)));
    }
    let after = stack.borrow().clone();
    for _ in 0..5 {
        assert!(manager.undo());
    }
    assert!(stack.borrow().is_empty());
    assert!(!manager.undo());

    for _ in 0..5 {
        assert!(manager.redo());
    }
    assert_eq!(*stack.borrow(), after);
}

#[test]
fn scene_mutations_round_trip() {
    let scene = shared_scene();
    let manager = UndoRedoManager::default();
    let initial = scene.borrow().clone();

    let mutations = vec![
        SceneMutation::MoveShape {
            id: NodeId::intern("a"),
            x: 20.0,
            y: 40.0,
        },
        SceneMutation::SetEdgeKind {
            id: NodeId::intern("ab"),
            kind: EdgeKind::Orthogonal,
        },
        SceneMutation::RemoveShape {
            id: NodeId::intern("b"),
        },
        SceneMutation::AddShape {
            index: None,
            shape: Shape::rect("c", 500.0, 500.0, 40.0, 40.0),
        },
    ];
    for m in mutations {
        assert!(manager.execute(MutationCommand::new(scene.clone(), m)));
    }
    let edited = scene.borrow().clone();

    while manager.can_undo() {
        assert!(manager.undo());
    }
    assert_eq!(*scene.borrow(), initial);
    while manager.can_redo() {
        assert!(manager.redo());
    }
    assert_eq!(*scene.borrow(), edited);
}

// ─── Branch pruning & cap ────────────────────────────────────────────────

#[test]
fn executing_after_undo_prunes_future() {
    let stack = Rc::new(RefCell::new(Vec::new()));
    let manager = UndoRedoManager::default();
    manager.execute(push(&stack, 1));
    manager.execute(push(&stack, 2));
    manager.undo();
    manager.execute(push(&stack, 3));

    let info = manager.history_info();
    assert_eq!(info.total, 2);
    assert!(!manager.can_redo());
    assert_eq!(*stack.borrow(), vec![1, 3]);
    let descriptions: Vec<Option<String>> = info.entries.into_iter().map(|e| e.description).collect();
    assert_eq!(
        descriptions,
        vec![Some("push 1".to_string()), Some("push 3".to_string())]
    );
}

#[test]
fn history_cap_evicts_oldest_permanently() {
    let stack = Rc::new(RefCell::new(Vec::new()));
    let manager = UndoRedoManager::new(HistoryConfig {
        max_history_size: 10,
        ..Default::default()
    });
    for v in 0..15 {
        manager.execute(push(&stack, v));
    }
    assert_eq!(manager.history_info().total, 10);
    assert_eq!(manager.current_index(), 9);

    for _ in 0..10 {
        assert!(manager.undo());
    }
    assert!(!manager.undo());
    assert_eq!(*stack.borrow(), vec![0, 1, 2, 3, 4]);
}

// ─── Batch & checkpoint ──────────────────────────────────────────────────

#[test]
fn batch_undo_runs_in_reverse() {
    let trace: Trace = Rc::default();
    let manager = UndoRedoManager::default();
    let commands = vec![traced(&trace, "c1"), traced(&trace, "c2"), traced(&trace, "c3")];
    assert!(manager.batch(commands, Some("three steps")));
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.history_info().undo_description.as_deref(), Some("three steps"));

    trace.borrow_mut().clear();
    assert!(manager.undo());
    assert_eq!(*trace.borrow(), vec!["c3.undo", "c2.undo", "c1.undo"]);
}

#[test]
fn failed_batch_is_not_recorded() {
    init_logger();
    let trace: Trace = Rc::default();
    let manager = UndoRedoManager::default();
    let failing: Box<dyn Command> = Box::new(FnCommand::new("fail", || Err("disk full".to_string()), || Ok(())));
    assert!(!manager.batch(vec![traced(&trace, "c1"), failing, traced(&trace, "c3")], None));
    assert!(manager.is_empty());
    assert_eq!(*trace.borrow(), vec!["c1.execute"]);
}

#[test]
fn checkpoint_undo_restores_snapshot() {
    let doc = Rc::new(RefCell::new(String::from("draft")));
    let manager = UndoRedoManager::default();
    let (get, set) = (doc.clone(), doc.clone());
    assert!(manager.checkpoint(
        move || get.borrow().clone(),
        move |s| *set.borrow_mut() = s,
        Some("before rewrite"),
    ));
    doc.borrow_mut().push_str(" v2");

    assert!(manager.undo());
    assert_eq!(*doc.borrow(), "draft");

    // Redo re-reads the live value rather than the post-checkpoint one.
    assert!(manager.redo());
    assert_eq!(*doc.borrow(), "draft");
}

// ─── Error paths ─────────────────────────────────────────────────────────

fn flaky(fail_undo: Rc<Cell<bool>>, fail_redo: Rc<Cell<bool>>) -> FnCommand {
    FnCommand::new("flaky", || Ok(()), move || {
        if fail_undo.get() { Err("undo failed".to_string()) } else { Ok(()) }
    })
    .with_redo(move || {
        if fail_redo.get() { Err("redo failed".to_string()) } else { Ok(()) }
    })
}

#[test]
fn failed_redo_rolls_back_cursor() {
    init_logger();
    let fail_redo = Rc::new(Cell::new(true));
    let manager = UndoRedoManager::default();
    manager.execute(flaky(Rc::new(Cell::new(false)), fail_redo.clone()));
    assert!(manager.undo());
    assert_eq!(manager.current_index(), -1);

    assert!(!manager.redo());
    assert_eq!(manager.current_index(), -1);
    assert!(manager.can_redo());

    fail_redo.set(false);
    assert!(manager.redo());
    assert_eq!(manager.current_index(), 0);
}

#[test]
fn failed_undo_still_moves_cursor() {
    init_logger();
    let manager = UndoRedoManager::default();
    manager.execute(flaky(Rc::new(Cell::new(true)), Rc::new(Cell::new(false))));

    assert!(!manager.undo());
    assert_eq!(manager.current_index(), -1);
    assert!(!manager.can_undo());
    assert!(manager.can_redo());
}

// ─── Re-entrancy ─────────────────────────────────────────────────────────

#[test]
fn reentrant_calls_are_ignored() {
    init_logger();
    let manager = Rc::new(UndoRedoManager::default());
    let inner_result = Rc::new(Cell::new(None));

    let (handle, seen) = (manager.clone(), inner_result.clone());
    let outer = FnCommand::new(
        "outer",
        move || {
            let nested = FnCommand::new("inner", || Ok(()), || Ok(()));
            seen.set(Some((handle.execute(nested), handle.undo(), handle.redo())));
            Ok(())
        },
        || Ok(()),
    );

    assert!(manager.execute(outer));
    assert_eq!(inner_result.get(), Some((false, false, false)));
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.state(), wb_editor::ManagerState::Idle);
}

#[test]
fn queries_work_inside_command_bodies() {
    let manager = Rc::new(UndoRedoManager::default());
    let observed = Rc::new(Cell::new(None));
    let (handle, seen) = (manager.clone(), observed.clone());
    manager.execute(FnCommand::new("first", || Ok(()), || Ok(())));
    manager.execute(FnCommand::new(
        "second",
        || Ok(()),
        move || {
            seen.set(Some(handle.history_info().total));
            Ok(())
        },
    ));
    assert!(manager.undo());
    assert_eq!(observed.get(), Some(2));
}

// ─── Debounce ────────────────────────────────────────────────────────────

#[test]
fn debounce_executes_only_the_last_command() {
    let a_runs = Rc::new(Cell::new(0));
    let b_runs = Rc::new(Cell::new(0));
    let manager = UndoRedoManager::default();
    let t0 = Instant::now();

    let a = a_runs.clone();
    let cmd_a = FnCommand::new(
        "a",
        move || {
            a.set(a.get() + 1);
            Ok(())
        },
        || Ok(()),
    );
    let b = b_runs.clone();
    let cmd_b = FnCommand::new(
        "b",
        move || {
            b.set(b.get() + 1);
            Ok(())
        },
        || Ok(()),
    );

    manager.execute_debounced_at(Box::new(cmd_a), t0);
    manager.execute_debounced_at(Box::new(cmd_b), t0 + Duration::from_millis(100));

    // 300ms after the first call, but only 200ms after the second.
    assert!(!manager.poll(t0 + Duration::from_millis(300)));
    assert!(manager.poll(t0 + Duration::from_millis(400)));
    assert!(!manager.poll(t0 + Duration::from_millis(1000)));

    assert_eq!(a_runs.get(), 0);
    assert_eq!(b_runs.get(), 1);
    assert_eq!(manager.len(), 1);
}

#[test]
fn cancel_and_clear_drop_pending() {
    let ran = Rc::new(Cell::new(false));
    let manager = UndoRedoManager::default();
    let now = Instant::now();

    let r = ran.clone();
    manager.execute_debounced_at(
        Box::new(FnCommand::new(
            "late",
            move || {
                r.set(true);
                Ok(())
            },
            || Ok(()),
        )),
        now,
    );
    assert!(manager.cancel_debounced());
    assert!(!manager.cancel_debounced());

    manager.execute_debounced_at(Box::new(FnCommand::new("late", || Ok(()), || Ok(()))), now);
    manager.clear();
    assert!(!manager.has_pending());
    assert!(!manager.poll(now + Duration::from_secs(5)));
    assert!(!ran.get());
}

#[test]
fn flush_runs_pending_immediately() {
    let stack = Rc::new(RefCell::new(Vec::new()));
    let manager = UndoRedoManager::default();
    manager.execute_debounced_at(Box::new(push(&stack, 9)), Instant::now());
    assert!(manager.flush_debounced());
    assert_eq!(*stack.borrow(), vec![9]);
    assert!(!manager.flush_debounced());
}
