//! Fatal fault hooks
//!
//! Two hooks end in the same halt path:
//! - the global allocator returned no memory
//! - a task found the stack canary clobbered
//!
//! Halting masks interrupts, logs once and spins. Nothing is recovered.

use core::alloc::{GlobalAlloc, Layout};

use defmt::*;
use embedded_alloc::LlffHeap;
use tandem_core::fault::{self, FaultKind, FaultLatch, HaltControl};

use crate::config::task_name;

/// First fault wins the report
static LATCH: FaultLatch = FaultLatch::new();

/// Board halt hooks
struct Board;

impl HaltControl for Board {
    fn disable_interrupts(&self) {
        cortex_m::interrupt::disable();
    }

    fn report(&self, fault: &FaultKind) {
        match fault {
            FaultKind::AllocationFailed { size, align } => {
                error!("{} ({} bytes, align {})", fault.message(), size, align);
            }
            FaultKind::StackOverflow { task } => {
                error!("{}: {}", fault.message(), task_name(*task));
            }
        }
    }

    fn park(&self) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }
}

/// Stop the system
pub fn halt(fault: FaultKind) -> ! {
    fault::halt(&LATCH, &Board, fault)
}

/// Global allocator that halts instead of returning null
pub struct GuardedHeap {
    heap: LlffHeap,
}

impl GuardedHeap {
    pub const fn empty() -> Self {
        Self {
            heap: LlffHeap::empty(),
        }
    }

    /// Hand the heap its memory
    ///
    /// # Safety
    ///
    /// Must be called once, before the first allocation, with a region
    /// that is valid for the rest of the program.
    pub unsafe fn init(&self, start: usize, size: usize) {
        self.heap.init(start, size)
    }

    /// Bytes still available
    pub fn free(&self) -> usize {
        self.heap.free()
    }
}

unsafe impl GlobalAlloc for GuardedHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.heap.alloc(layout);
        if ptr.is_null() {
            halt(FaultKind::AllocationFailed {
                size: layout.size(),
                align: layout.align(),
            });
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.heap.dealloc(ptr, layout)
    }
}
