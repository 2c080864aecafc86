//! Task lifecycle state machine
//!
//! ```text
//!   ┌──────────┐     Dispatch       ┌─────────┐
//!   │  Ready   │ ─────────────────► │ Running │
//!   └──────────┘ ◄───────────────── └─────────┘
//!        ▲            Preempt            │
//!        │                               │ Block
//!        │          Wake            ┌──────────┐
//!        └───────────────────────── │ Blocked  │
//!                                   └──────────┘
//!
//!   any state ──Suspend──► Suspended (absorbing)
//! ```

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    /// Runnable, waiting for the processor
    Ready,
    /// Currently executing
    Running,
    /// Waiting on the deadline signal or an idle delay
    Blocked,
    /// Permanently parked after an unrecoverable task-local failure
    Suspended,
}

/// Events that move a task between lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskEvent {
    /// Dispatcher gave the processor to the task
    Dispatch,
    /// A higher-priority task became ready
    Preempt,
    /// Task waits on a signal or a delay
    Block,
    /// The awaited signal or delay completed
    Wake,
    /// Task gave up for good
    Suspend,
}

impl TaskState {
    /// Check if the dispatcher may pick this task
    pub fn is_schedulable(&self) -> bool {
        matches!(self, TaskState::Ready | TaskState::Running)
    }

    /// Check if the task has been parked for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Suspended)
    }

    /// Process an event and return the next state
    ///
    /// Events that make no sense in the current state leave it unchanged.
    pub fn transition(self, event: TaskEvent) -> Self {
        use TaskEvent::*;
        use TaskState::*;

        match (self, event) {
            (Suspended, _) => Suspended,
            (_, Suspend) => Suspended,

            (Ready, Dispatch) => Running,
            (Running, Preempt) => Ready,
            (Running, Block) => Blocked,
            (Blocked, Wake) => Ready,

            _ => self,
        }
    }
}
