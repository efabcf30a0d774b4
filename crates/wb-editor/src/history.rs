//! Undo/redo history.
//!
//! History is a list of executed commands plus a cursor (`current_index`)
//! pointing at the most recent applied entry, `-1` when nothing is applied.
//! Executing from a non-tip position discards the entries after the
//! cursor; the oldest entries are evicted once the list exceeds the
//! configured size.
//!
//! All methods take `&self` so commands may hold a handle to the manager.
//! Calls that would mutate history while a command body is running are
//! ignored and return `false`.
//!
//! Debounced execution keeps at most one pending command. The host drives
//! it by calling [`UndoRedoManager::poll`] with the current time.

use crate::command::{BatchCommand, CheckpointCommand, Command, CommandId, CommandMeta};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_history_size: usize,
    pub debounce_delay_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_size: 50,
            debounce_delay_ms: 300,
        }
    }
}

impl HistoryConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Idle,
    /// A command body is running.
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: CommandId,
    pub kind: String,
    pub timestamp: u64,
    pub description: Option<String>,
}

/// Snapshot of the history for UI display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryInfo {
    pub total: usize,
    pub current_index: isize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
    pub entries: Vec<HistoryEntry>,
}

/// A recorded command. Metadata is copied out so history queries never
/// touch a command whose body may be running.
struct Record {
    meta: CommandMeta,
    command: Rc<RefCell<Box<dyn Command>>>,
}

impl Record {
    fn new(command: Box<dyn Command>) -> Self {
        Self {
            meta: command.meta().clone(),
            command: Rc::new(RefCell::new(command)),
        }
    }
}

struct Pending {
    command: Box<dyn Command>,
    deadline: Instant,
}

/// Resets the manager to `Idle` when dropped.
struct BusyGuard<'a>(&'a Cell<ManagerState>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(ManagerState::Idle);
    }
}

fn label(meta: &CommandMeta) -> &str {
    meta.description.as_deref().unwrap_or(&meta.kind)
}

pub struct UndoRedoManager {
    config: HistoryConfig,
    history: RefCell<Vec<Record>>,
    current: Cell<isize>,
    state: Cell<ManagerState>,
    pending: RefCell<Option<Pending>>,
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl UndoRedoManager {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            history: RefCell::new(Vec::new()),
            current: Cell::new(-1),
            state: Cell::new(ManagerState::Idle),
            pending: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn state(&self) -> ManagerState {
        self.state.get()
    }

    pub fn len(&self) -> usize {
        self.history.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.borrow().is_empty()
    }

    pub fn current_index(&self) -> isize {
        self.current.get()
    }

    fn enter(&self, op: &str) -> Option<BusyGuard<'_>> {
        if self.state.get() == ManagerState::Busy {
            log::warn!("ignoring re-entrant {op} while a command is running");
            return None;
        }
        self.state.set(ManagerState::Busy);
        Some(BusyGuard(&self.state))
    }

    // ─── Execute / undo / redo ───────────────────────────────────────────

    /// Run `command` and record it. Returns `false` if it failed (nothing
    /// is recorded) or if the call was re-entrant.
    pub fn execute<C: Command + 'static>(&self, command: C) -> bool {
        self.execute_boxed(Box::new(command))
    }

    pub fn execute_boxed(&self, mut command: Box<dyn Command>) -> bool {
        let Some(_guard) = self.enter("execute") else {
            return false;
        };
        let started = Instant::now();
        if let Err(err) = command.execute() {
            log::error!("command {} failed: {err}", label(command.meta()));
            return false;
        }
        log::debug!(
            "executed {} `{}` in {:?}",
            command.id(),
            label(command.meta()),
            started.elapsed()
        );
        self.record(command);
        true
    }

    fn record(&self, command: Box<dyn Command>) {
        let mut history = self.history.borrow_mut();
        history.truncate((self.current.get() + 1) as usize);
        history.push(Record::new(command));

        let mut current = history.len() as isize - 1;
        if history.len() > self.config.max_history_size {
            let excess = history.len() - self.config.max_history_size;
            history.drain(..excess);
            current -= excess as isize;
            log::debug!("evicted {excess} oldest history entries");
        }
        self.current.set(current);
    }

    /// Undo the entry at the cursor.
    ///
    /// The cursor moves back even when the undo body fails; the failure is
    /// only reported through the return value.
    pub fn undo(&self) -> bool {
        let Some(_guard) = self.enter("undo") else {
            return false;
        };
        let index = self.current.get();
        let Some((command, name)) = self.command_at(index) else {
            return false;
        };
        self.current.set(index - 1);
        let result = command.borrow_mut().undo();
        match result {
            Ok(()) => true,
            Err(err) => {
                log::error!("undo of {name} failed: {err}");
                false
            }
        }
    }

    /// Redo the entry after the cursor. On failure the cursor is restored.
    pub fn redo(&self) -> bool {
        let Some(_guard) = self.enter("redo") else {
            return false;
        };
        let index = self.current.get() + 1;
        let Some((command, name)) = self.command_at(index) else {
            return false;
        };
        self.current.set(index);
        let result = command.borrow_mut().redo();
        match result {
            Ok(()) => true,
            Err(err) => {
                log::error!("redo of {name} failed: {err}");
                self.current.set(index - 1);
                false
            }
        }
    }

    fn command_at(&self, index: isize) -> Option<(Rc<RefCell<Box<dyn Command>>>, String)> {
        let history = self.history.borrow();
        let record = history.get(usize::try_from(index).ok()?)?;
        Some((record.command.clone(), label(&record.meta).to_string()))
    }

    pub fn can_undo(&self) -> bool {
        self.current.get() >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.current.get() + 1 < self.history.borrow().len() as isize
    }

    /// Drop all history and any pending debounced command.
    pub fn clear(&self) {
        if self.state.get() == ManagerState::Busy {
            log::warn!("ignoring clear while a command is running");
            return;
        }
        self.cancel_debounced();
        self.history.borrow_mut().clear();
        self.current.set(-1);
    }

    pub fn history_info(&self) -> HistoryInfo {
        let history = self.history.borrow();
        let current = self.current.get();
        let description_at = |index: isize| {
            usize::try_from(index)
                .ok()
                .and_then(|i| history.get(i))
                .map(|r| label(&r.meta).to_string())
        };
        HistoryInfo {
            total: history.len(),
            current_index: current,
            can_undo: current >= 0,
            can_redo: current + 1 < history.len() as isize,
            undo_description: description_at(current),
            redo_description: description_at(current + 1),
            entries: history
                .iter()
                .map(|r| HistoryEntry {
                    id: r.meta.id,
                    kind: r.meta.kind.clone(),
                    timestamp: r.meta.timestamp,
                    description: r.meta.description.clone(),
                })
                .collect(),
        }
    }

    // ─── Debounce ────────────────────────────────────────────────────────

    /// Schedule `command` to run once the debounce delay passes without
    /// another debounced call. Replaces any pending command, which is
    /// dropped without running.
    pub fn execute_debounced<C: Command + 'static>(&self, command: C) {
        self.execute_debounced_at(Box::new(command), Instant::now());
    }

    pub fn execute_debounced_at(&self, command: Box<dyn Command>, now: Instant) {
        let deadline = now + self.config.debounce_delay();
        let replaced = self.pending.borrow_mut().replace(Pending { command, deadline });
        if let Some(old) = replaced {
            log::trace!("debounce replaced pending {}", label(old.command.meta()));
        }
    }

    /// Execute the pending command if its deadline has passed by `now`.
    /// Returns whether a command was executed successfully.
    pub fn poll(&self, now: Instant) -> bool {
        if self.state.get() == ManagerState::Busy {
            return false;
        }
        let due = self
            .pending
            .borrow()
            .as_ref()
            .is_some_and(|p| p.deadline <= now);
        if !due {
            return false;
        }
        self.flush_debounced()
    }

    /// Execute the pending command now, regardless of its deadline.
    pub fn flush_debounced(&self) -> bool {
        if self.state.get() == ManagerState::Busy {
            log::warn!("ignoring debounce flush while a command is running");
            return false;
        }
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(p) => self.execute_boxed(p.command),
            None => false,
        }
    }

    /// Drop the pending command without running it. Returns whether one
    /// was pending.
    pub fn cancel_debounced(&self) -> bool {
        let dropped = self.pending.borrow_mut().take();
        if let Some(p) = &dropped {
            log::trace!("debounce cancelled {}", label(p.command.meta()));
        }
        dropped.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    // ─── Composite commands ──────────────────────────────────────────────

    /// Execute `commands` as one history entry.
    pub fn batch(&self, commands: Vec<Box<dyn Command>>, description: Option<&str>) -> bool {
        self.execute(BatchCommand::new(commands, description))
    }

    /// Record a checkpoint of host state. Undoing it restores the state as
    /// it was at this call.
    pub fn checkpoint<S: Clone + 'static>(
        &self,
        get_state: impl Fn() -> S + 'static,
        set_state: impl FnMut(S) + 'static,
        description: Option<&str>,
    ) -> bool {
        self.execute(CheckpointCommand::new(get_state, set_state, description))
    }
}
