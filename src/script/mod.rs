// TABLE:
// ┌──────────────────────────────────────────────────────────────┐
// │                     Undoable Scripts                         │
// ├────────────┬─────────────────────────────────────────────────┤
// │ runner.rs  │ runs actions in order, unwinds them on Cancel   │
// │ actions.rs │ control flow and small helpers for scripts      │
// └────────────┴─────────────────────────────────────────────────┘
pub mod actions;
pub mod runner;

pub use actions::Actions;
pub use runner::{Act, Action, Additions, Cond, FnAction, Outcome, Runner, RunnerState};
