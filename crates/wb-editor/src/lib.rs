pub mod command;
pub mod drag;
pub mod history;
pub mod mutation;

pub use command::{BatchCommand, CheckpointCommand, Command, CommandId, CommandMeta, CommandResult, FnCommand};
pub use drag::DragSession;
pub use history::{HistoryConfig, HistoryEntry, HistoryInfo, ManagerState, UndoRedoManager};
pub use mutation::{MutationCommand, SceneMutation, SharedScene, compute_inverse};
