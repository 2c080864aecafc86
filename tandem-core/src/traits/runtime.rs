//! Runtime statistics

use crate::task::TaskId;

/// Read-only snapshots of runtime resources
///
/// Values are observational only; callers never branch on them.
pub trait RuntimeStats {
    /// Bytes still available from the dynamic-memory allocator
    fn free_heap_bytes(&self) -> u32;

    /// Bytes of stack never touched so far in the region `task` runs on
    fn stack_headroom_bytes(&self, task: TaskId) -> u32;
}
