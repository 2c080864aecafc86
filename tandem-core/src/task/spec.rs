//! Static task descriptions

/// Number of application tasks
pub const TASK_COUNT: usize = 2;

/// Identity of one of the two application tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskId {
    /// Perception pipeline (lower priority, best effort)
    Pipeline,
    /// Deadline responder (highest priority)
    Responder,
}

impl TaskId {
    /// All task identities, in table order
    pub const ALL: [TaskId; TASK_COUNT] = [TaskId::Pipeline, TaskId::Responder];

    /// Index into per-task tables
    pub const fn index(self) -> usize {
        match self {
            TaskId::Pipeline => 0,
            TaskId::Responder => 1,
        }
    }
}

/// Task priority (higher value preempts lower)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskPriority(pub u8);

impl TaskPriority {
    /// Reserved for the idle context; no application task may use it
    pub const IDLE: TaskPriority = TaskPriority(0);

    /// Raw priority value
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Immutable per-task parameters, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskSpec {
    /// Diagnostic name
    pub name: &'static str,
    /// Scheduling priority
    pub priority: TaskPriority,
    /// Stack budget in bytes (never resized)
    pub stack_budget: u32,
}

impl TaskSpec {
    /// Create a task spec
    pub const fn new(name: &'static str, priority: u8, stack_budget: u32) -> Self {
        Self {
            name,
            priority: TaskPriority(priority),
            stack_budget,
        }
    }

    /// Check if this task preempts `other`
    pub fn preempts(&self, other: &TaskSpec) -> bool {
        self.priority > other.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_match_table_order() {
        for (i, id) in TaskId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_preemption_is_strict() {
        let low = TaskSpec::new("low", 2, 1024);
        let high = TaskSpec::new("high", 4, 1024);
        let peer = TaskSpec::new("peer", 2, 1024);

        assert!(high.preempts(&low));
        assert!(!low.preempts(&high));
        assert!(!peer.preempts(&low));
    }
}
