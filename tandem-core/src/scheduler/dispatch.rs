//! Dispatch policy model
//!
//! The highest-priority Ready task runs. When a task of higher priority
//! than the running one becomes Ready, the running task is preempted at
//! once. With no runnable task the core idles.

use crate::config::SystemConfig;
use crate::task::{TaskControl, TaskEvent, TaskId, TaskSpec, TaskState, TASK_COUNT};

/// A context switch decided by the dispatcher
///
/// `None` stands for the idle context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Switch {
    pub from: Option<TaskId>,
    pub to: Option<TaskId>,
}

/// Scheduler state for the two application tasks
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tasks: [TaskControl; TASK_COUNT],
    running: Option<TaskId>,
}

impl Dispatcher {
    /// Both tasks start Ready; nothing runs until `start`
    pub fn new(pipeline: TaskSpec, responder: TaskSpec) -> Self {
        Self {
            tasks: [
                TaskControl::new(TaskId::Pipeline, pipeline),
                TaskControl::new(TaskId::Responder, responder),
            ],
            running: None,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.pipeline, config.responder)
    }

    /// Start scheduling
    pub fn start(&mut self) -> Option<Switch> {
        self.reschedule()
    }

    /// Task currently on the processor
    pub fn running(&self) -> Option<TaskId> {
        self.running
    }

    pub fn state(&self, id: TaskId) -> TaskState {
        self.tasks[id.index()].state()
    }

    pub fn control(&self, id: TaskId) -> &TaskControl {
        &self.tasks[id.index()]
    }

    /// The running task waits (signal take or idle delay)
    ///
    /// Ignored for a task that is not running.
    pub fn block(&mut self, id: TaskId) -> Option<Switch> {
        if self.running != Some(id) {
            return None;
        }
        self.tasks[id.index()].apply(TaskEvent::Block);
        self.reschedule()
    }

    /// A blocked task's wait completed
    pub fn wake(&mut self, id: TaskId) -> Option<Switch> {
        self.tasks[id.index()].apply(TaskEvent::Wake);
        self.reschedule()
    }

    /// Park a task permanently
    pub fn suspend(&mut self, id: TaskId) -> Option<Switch> {
        self.tasks[id.index()].apply(TaskEvent::Suspend);
        self.reschedule()
    }

    /// Re-evaluate which task should run
    ///
    /// Returns the switch if the running task changes.
    pub fn reschedule(&mut self) -> Option<Switch> {
        let next = self.select();
        if next == self.running {
            return None;
        }

        let from = self.running;
        if let Some(current) = from {
            // A task that blocked or was suspended already left Running
            self.tasks[current.index()].apply(TaskEvent::Preempt);
        }
        if let Some(to) = next {
            self.tasks[to.index()].apply(TaskEvent::Dispatch);
        }

        self.running = next;
        Some(Switch { from, to: next })
    }

    /// Highest-priority runnable task; the running task wins ties
    fn select(&self) -> Option<TaskId> {
        let mut best: Option<&TaskControl> = None;
        for task in &self.tasks {
            if !task.state().is_schedulable() {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => {
                    let (mine, theirs) = (task.spec().priority, b.spec().priority);
                    mine > theirs || (mine == theirs && self.running == Some(task.id()))
                }
            };
            if better {
                best = Some(task);
            }
        }
        best.map(TaskControl::id)
    }
}
