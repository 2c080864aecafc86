//! Fatal fault policy
//!
//! Heap exhaustion and stack overflow are unrecoverable. The system stops
//! in a fixed order:
//!
//! 1. disable interrupts, so neither task nor the tick runs again
//! 2. emit one best-effort diagnostic (first fault only)
//! 3. park forever
//!
//! Halting never attempts recovery. A fault raised while another fault is
//! already being handled skips the report and goes straight to parking.

use portable_atomic::{AtomicBool, Ordering};

use crate::task::TaskId;

/// Fatal fault cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Dynamic allocation returned nothing
    AllocationFailed { size: usize, align: usize },
    /// Stack canary clobbered, detected by `task`
    StackOverflow { task: TaskId },
}

impl FaultKind {
    /// Short diagnostic line
    pub fn message(&self) -> &'static str {
        match self {
            FaultKind::AllocationFailed { .. } => "allocation failed: out of heap",
            FaultKind::StackOverflow { .. } => "stack overflow in task",
        }
    }

    /// Task named by the fault, if any
    pub fn task(&self) -> Option<TaskId> {
        match self {
            FaultKind::AllocationFailed { .. } => None,
            FaultKind::StackOverflow { task } => Some(*task),
        }
    }
}

/// Platform hooks used while halting
pub trait HaltControl {
    /// Mask every interrupt on the core
    fn disable_interrupts(&self);

    /// Emit a diagnostic; must not allocate
    fn report(&self, fault: &FaultKind);

    /// Spin forever
    fn park(&self) -> !;
}

/// Records whether a fault is already being handled
pub struct FaultLatch {
    tripped: AtomicBool,
}

impl FaultLatch {
    pub const fn new() -> Self {
        Self {
            tripped: AtomicBool::new(false),
        }
    }

    /// Trip the latch
    ///
    /// Returns true only for the first caller.
    pub fn trip(&self) -> bool {
        !self.tripped.swap(true, Ordering::AcqRel)
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }
}

impl Default for FaultLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Stop the system
pub fn halt<H: HaltControl>(latch: &FaultLatch, platform: &H, fault: FaultKind) -> ! {
    platform.disable_interrupts();
    if latch.trip() {
        platform.report(&fault);
    }
    platform.park()
}
