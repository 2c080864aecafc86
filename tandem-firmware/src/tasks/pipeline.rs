//! Perception pipeline task
//!
//! Lower priority, runs on the thread-mode executor. Inference blocks the
//! executor for its whole duration; the responder still preempts it
//! because its executor runs from an interrupt.

use defmt::*;
use embassy_time::Delay;
use tandem_core::pipeline::{CycleOutcome, Pipeline};
use tandem_core::task::{suspend_forever, TaskControl, TaskEvent, TaskId};
use tandem_core::traits::Model;
use tandem_drivers::{Detection, LumaHistogramEngine, StaticFrameSource, TensorModel, TopClass};

use crate::config::SYSTEM;
use crate::stack;
use crate::stats::{EmbassyClock, FirmwareStats};

/// Model wired up by the firmware
pub type FirmwareModel = TensorModel<LumaHistogramEngine<Delay>, TopClass>;

#[embassy_executor::task]
pub async fn pipeline_task(model: FirmwareModel, source: StaticFrameSource<'static>) {
    let mut control = TaskControl::new(TaskId::Pipeline, SYSTEM.pipeline);
    control.apply(TaskEvent::Dispatch);
    info!(
        "Pipeline task started (priority {})",
        control.spec().priority.value()
    );

    let name = model.name();
    let mut pipeline = match Pipeline::start(model, source, EmbassyClock, FirmwareStats) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Model {} init failed: {}", name, e);
            if let Some(state) = control.apply(TaskEvent::Suspend) {
                warn!("{}: {}", control.name(), state);
            }
            suspend_forever().await;
            return;
        }
    };

    let output = pipeline.model().output_info();
    info!(
        "Model {} initialized: input {}, output {} ({})",
        name,
        pipeline.geometry(),
        output.dims.as_slice(),
        output.dtype
    );

    let mut delay = Delay;
    loop {
        let completed = pipeline
            .run_cycle(&mut delay, SYSTEM.timing.pipeline_idle_ms, |outcome| {
                log_outcome(outcome);
                if outcome.is_completed() {
                    control.apply(TaskEvent::Block);
                }
            })
            .await;

        if completed {
            control.resume();
        }

        stack::check(TaskId::Pipeline);
    }
}

fn log_outcome(outcome: &CycleOutcome<Detection>) {
    match outcome {
        CycleOutcome::Completed(report) => {
            match report.output.top {
                Some(top) => info!(
                    "Cycle #{}: {} ({}%)",
                    report.sequence, top.label, top.confidence_pct
                ),
                None => info!("Cycle #{}: no class above threshold", report.sequence),
            }
            info!("Inference time: {} us", report.latency_us);
            info!(
                "Free heap: {} bytes, stack headroom: {} words",
                report.liveness.free_heap_bytes,
                report.liveness.stack_headroom_words()
            );
        }
        CycleOutcome::AcquisitionFailed(e) => {
            warn!("Image acquisition failed: {}", e);
        }
    }
}
