//! Liveness diagnostics

use crate::task::TaskId;
use crate::traits::RuntimeStats;

/// Snapshot of resource headroom, taken once per pipeline cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LivenessReport {
    /// Free dynamic memory (bytes)
    pub free_heap_bytes: u32,
    /// Untouched stack (bytes)
    pub stack_headroom_bytes: u32,
}

impl LivenessReport {
    /// Sample both metrics for `task`
    pub fn sample<R: RuntimeStats>(stats: &R, task: TaskId) -> Self {
        Self {
            free_heap_bytes: stats.free_heap_bytes(),
            stack_headroom_bytes: stats.stack_headroom_bytes(task),
        }
    }

    /// Remaining stack expressed in 32-bit words
    pub fn stack_headroom_words(&self) -> u32 {
        self.stack_headroom_bytes / 4
    }
}
