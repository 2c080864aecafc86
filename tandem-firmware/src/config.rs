//! Build-time system configuration
//!
//! Constants come from system.toml via build.rs. The values were already
//! validated on the host; `SYSTEM` is validated again at boot before any
//! task is spawned.

use tandem_core::config::{SystemConfig, TimingConfig};
use tandem_core::task::{TaskId, TaskSpec};
use tandem_core::tensor::{ImageGeometry, TensorType};

include!(concat!(env!("OUT_DIR"), "/system_config.rs"));

/// Interrupt priority bits implemented by the Cortex-M0+ NVIC
pub const NVIC_PRIO_BITS: u8 = 2;

/// Number of distinct interrupt priority levels
pub const NVIC_PRIO_LEVELS: u8 = 1 << NVIC_PRIO_BITS;

pub const SYSTEM: SystemConfig = SystemConfig {
    timing: TimingConfig {
        tick_period_us: TICK_PERIOD_US,
        deadline_threshold_ticks: DEADLINE_THRESHOLD_TICKS,
        pipeline_idle_ms: PIPELINE_IDLE_MS,
    },
    pipeline: TaskSpec::new("pipeline", PIPELINE_PRIORITY, PIPELINE_STACK_BYTES),
    responder: TaskSpec::new("responder", RESPONDER_PRIORITY, RESPONDER_STACK_BYTES),
    max_priority: MAX_PRIORITY,
    isr_stack_reserve: ISR_STACK_RESERVE,
};

/// Model input geometry
pub const INPUT_GEOMETRY: ImageGeometry = ImageGeometry {
    width: INPUT_WIDTH,
    height: INPUT_HEIGHT,
    channels: INPUT_CHANNELS,
};

/// Built-in test frame geometry (same channel count as the model input)
pub const FRAME_GEOMETRY: ImageGeometry = ImageGeometry {
    width: FRAME_WIDTH,
    height: FRAME_HEIGHT,
    channels: INPUT_CHANNELS,
};

/// Built-in test frame size in bytes
pub const FRAME_LEN: usize = (FRAME_WIDTH * FRAME_HEIGHT * INPUT_CHANNELS) as usize;

/// Diagnostic task name
pub fn task_name(id: TaskId) -> &'static str {
    SYSTEM.task(id).name
}
