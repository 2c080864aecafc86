//! Scheduler tick
//!
//! SysTick fires every `TICK_PERIOD_US` at the most urgent interrupt
//! level. The handler owns the tick divider; every
//! `DEADLINE_THRESHOLD_TICKS` ticks it gives the deadline signal. The give
//! pends the responder's executor interrupt, which runs once this handler
//! returns.

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{SCB, SYST};
use cortex_m_rt::exception;
use defmt::*;
use tandem_core::tick::DeadlineTimer;

use crate::channels::DEADLINE;
use crate::config::{DEADLINE_THRESHOLD_TICKS, NVIC_PRIO_BITS, TICK_PERIOD_US};

/// Largest SysTick reload value (24-bit counter)
const SYST_MAX_RELOAD: u64 = 0x00FF_FFFF;

/// Tick configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum TickError {
    /// Requested period does not fit the 24-bit counter at this clock
    ReloadOutOfRange { reload: u64 },
}

/// Convert an NVIC level (0 = most urgent) to a priority byte
pub const fn priority_byte(level: u8) -> u8 {
    level << (8 - NVIC_PRIO_BITS)
}

/// Configure and start SysTick
///
/// `sys_clk_hz` is the core clock feeding SysTick; `level` the NVIC level
/// it runs at.
pub fn start(syst: &mut SYST, scb: &mut SCB, sys_clk_hz: u32, level: u8) -> Result<(), TickError> {
    let cycles = sys_clk_hz as u64 * TICK_PERIOD_US as u64 / 1_000_000;
    let reload = cycles.saturating_sub(1);
    if reload == 0 || reload > SYST_MAX_RELOAD {
        return Err(TickError::ReloadOutOfRange { reload });
    }

    // SAFETY: only changes the SysTick priority, before it is enabled
    unsafe { scb.set_priority(SystemHandler::SysTick, priority_byte(level)) };

    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(reload as u32);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();

    debug!("SysTick: reload={} level={}", reload, level);
    Ok(())
}

#[exception]
fn SysTick() {
    static mut TIMER: DeadlineTimer = DeadlineTimer::new(DEADLINE_THRESHOLD_TICKS);

    TIMER.on_tick(&DEADLINE);
}
