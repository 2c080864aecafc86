//! Cross-context synchronization
//!
//! The deadline signal is the only object shared between execution
//! contexts. The tick interrupt gives it; the responder takes it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use tandem_core::signal::DeadlineSignal;

/// Deadline event raised every `DEADLINE_THRESHOLD_TICKS` ticks
pub static DEADLINE: DeadlineSignal<CriticalSectionRawMutex> = DeadlineSignal::new();
