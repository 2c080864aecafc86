//! Per-task lifecycle tracking

use super::spec::{TaskId, TaskSpec};
use super::state::{TaskEvent, TaskState};

/// A task's identity, static parameters and current lifecycle state
///
/// Each execution context owns its own `TaskControl`; nothing here is
/// shared across contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskControl {
    id: TaskId,
    spec: TaskSpec,
    state: TaskState,
}

impl TaskControl {
    /// Create a control block in the `Ready` state
    pub const fn new(id: TaskId, spec: TaskSpec) -> Self {
        Self {
            id,
            spec,
            state: TaskState::Ready,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Apply a lifecycle event
    ///
    /// Returns `Some(new_state)` if the state changed.
    pub fn apply(&mut self, event: TaskEvent) -> Option<TaskState> {
        let next = self.state.transition(event);
        if next == self.state {
            return None;
        }
        self.state = next;
        Some(next)
    }

    /// Shorthand for a task that resumes after a wait: wake then dispatch
    pub fn resume(&mut self) -> Option<TaskState> {
        self.apply(TaskEvent::Wake);
        self.apply(TaskEvent::Dispatch)
    }
}

/// Park the calling task forever
///
/// The future never completes, so the executor never polls the task
/// again. Used when a task hits an unrecoverable task-local failure.
pub async fn suspend_forever() {
    core::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> TaskControl {
        TaskControl::new(TaskId::Pipeline, TaskSpec::new("pipeline", 2, 32 * 1024))
    }

    #[test]
    fn test_starts_ready() {
        let control = pipeline();
        assert_eq!(control.state(), TaskState::Ready);
        assert_eq!(control.name(), "pipeline");
        assert_eq!(control.id(), TaskId::Pipeline);
    }

    #[test]
    fn test_apply_reports_changes_only() {
        let mut control = pipeline();
        assert_eq!(control.apply(TaskEvent::Dispatch), Some(TaskState::Running));
        assert_eq!(control.apply(TaskEvent::Dispatch), None);
    }

    #[test]
    fn test_resume_after_block() {
        let mut control = pipeline();
        control.apply(TaskEvent::Dispatch);
        control.apply(TaskEvent::Block);
        assert_eq!(control.resume(), Some(TaskState::Running));
    }

    #[test]
    fn test_suspended_task_never_resumes() {
        let mut control = pipeline();
        control.apply(TaskEvent::Suspend);
        assert_eq!(control.resume(), None);
        assert_eq!(control.state(), TaskState::Suspended);
    }

    #[test]
    fn test_suspend_forever_never_completes() {
        use core::future::Future;
        use core::pin::pin;
        use core::task::{Context, Poll, Waker};

        let mut cx = Context::from_waker(Waker::noop());
        let mut fut = pin!(suspend_forever());

        for _ in 0..8 {
            assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Pending));
        }
    }
}
