//! Runtime collaborators backed by the board

use embassy_time::Instant;
use tandem_core::task::TaskId;
use tandem_core::traits::{MicrosClock, RuntimeStats};

use crate::{stack, HEAP};

/// Microsecond clock on the embassy time driver (RP2040 TIMER)
#[derive(Clone, Copy)]
pub struct EmbassyClock;

impl MicrosClock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }
}

/// Heap and stack snapshots
#[derive(Clone, Copy)]
pub struct FirmwareStats;

/// Both executors and every interrupt handler run on the main stack (MSP),
/// so there is one painted region for the whole system. Stack headroom is
/// the untouched part of that shared region: the same value for either
/// task, and it includes interrupt usage. Per-task figures would need a
/// separate stack per task.
impl RuntimeStats for FirmwareStats {
    fn free_heap_bytes(&self) -> u32 {
        HEAP.free() as u32
    }

    /// Headroom of the shared main stack; `_task` does not select a region
    fn stack_headroom_bytes(&self, _task: TaskId) -> u32 {
        stack::headroom_bytes()
    }
}
