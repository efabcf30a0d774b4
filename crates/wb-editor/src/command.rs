//! Reversible commands.
//!
//! A command is an opaque unit of work with `execute`, `undo` and `redo`
//! bodies. The history manager never looks inside; it only records the
//! metadata and calls the bodies in order. Bodies report failure as
//! `Err(String)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub type CommandResult = Result<(), String>;

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique, increasing command identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(u64);

impl CommandId {
    pub fn next() -> Self {
        Self(NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMeta {
    pub id: CommandId,
    /// Category tag, e.g. `"move_shape"` or `"batch"`.
    pub kind: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub description: Option<String>,
}

impl CommandMeta {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: CommandId::next(),
            kind: kind.into(),
            timestamp: now_millis(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A reversible operation.
///
/// After a successful `execute`, `undo` must restore the observable state
/// from before it, and `redo` must reproduce the state after it.
pub trait Command {
    fn meta(&self) -> &CommandMeta;

    fn execute(&mut self) -> CommandResult;

    fn undo(&mut self) -> CommandResult;

    fn redo(&mut self) -> CommandResult {
        self.execute()
    }

    fn id(&self) -> CommandId {
        self.meta().id
    }

    fn description(&self) -> Option<&str> {
        self.meta().description.as_deref()
    }
}

// ─── Closure commands ────────────────────────────────────────────────────

type Action = Box<dyn FnMut() -> CommandResult>;

/// Command built from closures. Without an explicit redo body, redo runs
/// the execute body again.
pub struct FnCommand {
    meta: CommandMeta,
    execute: Action,
    undo: Action,
    redo: Option<Action>,
}

impl FnCommand {
    pub fn new(
        kind: impl Into<String>,
        execute: impl FnMut() -> CommandResult + 'static,
        undo: impl FnMut() -> CommandResult + 'static,
    ) -> Self {
        Self {
            meta: CommandMeta::new(kind),
            execute: Box::new(execute),
            undo: Box::new(undo),
            redo: None,
        }
    }

    pub fn with_redo(mut self, redo: impl FnMut() -> CommandResult + 'static) -> Self {
        self.redo = Some(Box::new(redo));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta = self.meta.with_description(description);
        self
    }
}

impl Command for FnCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn execute(&mut self) -> CommandResult {
        (self.execute)()
    }

    fn undo(&mut self) -> CommandResult {
        (self.undo)()
    }

    fn redo(&mut self) -> CommandResult {
        match self.redo.as_mut() {
            Some(redo) => redo(),
            None => (self.execute)(),
        }
    }
}

// ─── Batch ───────────────────────────────────────────────────────────────

/// Several commands recorded as one history entry.
///
/// Execute and redo run the children in order; undo runs them in reverse.
/// Each pass stops at the first failing child and reports its error;
/// children already run are not compensated.
pub struct BatchCommand {
    meta: CommandMeta,
    commands: Vec<Box<dyn Command>>,
}

impl BatchCommand {
    pub fn new(commands: Vec<Box<dyn Command>>, description: Option<&str>) -> Self {
        let mut meta = CommandMeta::new("batch");
        if let Some(description) = description {
            meta = meta.with_description(description);
        }
        Self { meta, commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for BatchCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn execute(&mut self) -> CommandResult {
        for command in self.commands.iter_mut() {
            command.execute()?;
        }
        Ok(())
    }

    fn undo(&mut self) -> CommandResult {
        for command in self.commands.iter_mut().rev() {
            command.undo()?;
        }
        Ok(())
    }

    fn redo(&mut self) -> CommandResult {
        for command in self.commands.iter_mut() {
            command.redo()?;
        }
        Ok(())
    }
}

// ─── Checkpoint ──────────────────────────────────────────────────────────

/// Snapshot of host state taken when the command is created.
///
/// Execute does nothing. Undo restores the snapshot. Redo reads the live
/// state at redo time and writes it back, so it does not return to the
/// state that followed the checkpoint if something else changed in the
/// meantime.
pub struct CheckpointCommand<S: Clone> {
    meta: CommandMeta,
    snapshot: S,
    get_state: Box<dyn Fn() -> S>,
    set_state: Box<dyn FnMut(S)>,
}

impl<S: Clone> CheckpointCommand<S> {
    pub fn new(
        get_state: impl Fn() -> S + 'static,
        set_state: impl FnMut(S) + 'static,
        description: Option<&str>,
    ) -> Self {
        let mut meta = CommandMeta::new("checkpoint");
        if let Some(description) = description {
            meta = meta.with_description(description);
        }
        Self {
            meta,
            snapshot: get_state(),
            get_state: Box::new(get_state),
            set_state: Box::new(set_state),
        }
    }

    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }
}

impl<S: Clone> Command for CheckpointCommand<S> {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn execute(&mut self) -> CommandResult {
        Ok(())
    }

    fn undo(&mut self) -> CommandResult {
        (self.set_state)(self.snapshot.clone());
        Ok(())
    }

    fn redo(&mut self) -> CommandResult {
        let live = (self.get_state)();
        (self.set_state)(live);
        Ok(())
    }
}
