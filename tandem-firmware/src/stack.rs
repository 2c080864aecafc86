//! Main stack painting and overflow checks
//!
//! Both tasks and all interrupt handlers run on the main stack. The
//! monitored region is the top `STACK_REGION_BYTES` of RAM, directly below
//! `_stack_start`. It is painted at boot; the lowest words act as canary.

use core::ptr;

use defmt::*;
use tandem_core::fault::FaultKind;
use tandem_core::stack::{self as watermark, StackRegion, STACK_PAINT};
use tandem_core::task::TaskId;

use crate::config::STACK_REGION_BYTES;
use crate::fault;

/// Bytes below the live stack pointer left unpainted at boot
const PAINT_MARGIN_BYTES: usize = 256;

extern "C" {
    // Provided by cortex-m-rt's link.x
    static _stack_start: u32;
    static __ebss: u32;
}

/// Monitored stack region, read with volatile loads
#[derive(Clone, Copy)]
pub struct MainStack {
    base: *const u32,
    words: usize,
}

impl MainStack {
    pub fn get() -> Self {
        let top = unsafe { ptr::addr_of!(_stack_start) } as usize;
        Self {
            base: (top - STACK_REGION_BYTES) as *const u32,
            words: STACK_REGION_BYTES / 4,
        }
    }

    pub fn base(&self) -> usize {
        self.base as usize
    }
}

impl StackRegion for MainStack {
    fn len_words(&self) -> usize {
        self.words
    }

    fn read_word(&self, index: usize) -> u32 {
        // SAFETY: index < words keeps the read inside RAM below _stack_start
        unsafe { ptr::read_volatile(self.base.add(index)) }
    }
}

/// Paint the region up to just below the current stack pointer
///
/// Returns false if the region overlaps static data.
pub fn paint() -> bool {
    let stack = MainStack::get();
    let ebss = unsafe { ptr::addr_of!(__ebss) } as usize;
    if stack.base() < ebss {
        return false;
    }

    let sp = cortex_m::register::msp::read() as usize;
    let limit = sp.saturating_sub(PAINT_MARGIN_BYTES);
    let mut addr = stack.base();
    while addr < limit {
        // SAFETY: between the end of static data and the live frame
        unsafe { ptr::write_volatile(addr as *mut u32, STACK_PAINT) };
        addr += 4;
    }

    debug!(
        "Stack region painted: {:#x}..{:#x} ({} bytes)",
        stack.base(),
        limit,
        limit.saturating_sub(stack.base())
    );
    true
}

/// Untouched stack in bytes
pub fn headroom_bytes() -> u32 {
    watermark::headroom_bytes(&MainStack::get())
}

/// Halt if the canary was clobbered; `task` names the detecting task
pub fn check(task: TaskId) {
    if watermark::overflowed(&MainStack::get()) {
        fault::halt(FaultKind::StackOverflow { task });
    }
}
