//! Deadline responder task
//!
//! Highest priority. Waits on the deadline signal with no timeout and
//! logs each wake-up with the measured period.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use tandem_core::responder::Responder;
use tandem_core::signal::DeadlineSignal;
use tandem_core::task::{TaskControl, TaskEvent, TaskId};

use crate::config::SYSTEM;
use crate::stack;
use crate::stats::EmbassyClock;

#[embassy_executor::task]
pub async fn responder_task(signal: &'static DeadlineSignal<CriticalSectionRawMutex>) {
    let mut control = TaskControl::new(TaskId::Responder, SYSTEM.responder);
    control.apply(TaskEvent::Dispatch);
    info!(
        "Responder task started (priority {})",
        control.spec().priority.value()
    );

    let mut responder = Responder::new(EmbassyClock);

    loop {
        if let Some(state) = control.apply(TaskEvent::Block) {
            debug!("{}: {}", control.name(), state);
        }

        let reaction = responder.react(signal).await;

        if let Some(state) = control.resume() {
            debug!("{}: {}", control.name(), state);
        }

        match reaction.period_us {
            Some(period_us) => info!(
                "Deadline event received (#{}, period {} us)",
                reaction.sequence, period_us
            ),
            None => info!("Deadline event received (#{})", reaction.sequence),
        }

        stack::check(TaskId::Responder);
    }
}
