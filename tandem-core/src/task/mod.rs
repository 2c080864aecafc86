//! Task model
//!
//! Exactly two tasks exist for the lifetime of the system. Each has a
//! fixed priority and stack budget and moves through a small lifecycle
//! state machine. Tasks are never destroyed; a task that cannot continue
//! is parked in `Suspended` for good.

pub mod control;
pub mod spec;
pub mod state;

pub use control::{suspend_forever, TaskControl};
pub use spec::{TaskId, TaskPriority, TaskSpec, TASK_COUNT};
pub use state::{TaskEvent, TaskState};
