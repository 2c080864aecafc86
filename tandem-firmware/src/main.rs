//! Tandem - deadline responder and perception pipeline firmware
//!
//! Main firmware binary for RP2040 boards. Two tasks share one core:
//!
//! - Responder: highest priority, on an interrupt executor, woken every
//!   `DEADLINE_THRESHOLD_TICKS` scheduler ticks
//! - Pipeline: acquire → convert → infer → post-process → report → idle,
//!   on the thread-mode executor
//!
//! Preemption comes from interrupt priorities:
//!
//! ```text
//!   SysTick (tick level)  >  SWI_IRQ_1 (responder)  >  thread mode (pipeline)
//! ```

#![no_std]
#![no_main]

extern crate alloc;

use core::mem::MaybeUninit;

use cortex_m_rt::entry;
use defmt::*;
use embassy_executor::{Executor, InterruptExecutor};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_time::Delay;
use static_cell::StaticCell;
use tandem_core::scheduler::{ExecutionContext, PriorityPlan};
use tandem_core::task::TaskId;
use tandem_drivers::engine::LumaConfig;
use tandem_drivers::image::gradient;
use tandem_drivers::{LumaHistogramEngine, StaticFrameSource, TensorModel, TopClass};
use {defmt_rtt as _, panic_probe as _};

use crate::config::{
    FRAME_GEOMETRY, FRAME_LEN, HEAP_BYTES, INPUT_GEOMETRY, INPUT_TYPE, LABELS, MODEL_NAME,
    NVIC_PRIO_LEVELS, SYSTEM, THRESHOLD_PCT, WORKLOAD_MS,
};
use crate::fault::GuardedHeap;

mod channels;
mod config;
mod fault;
mod stack;
mod stats;
mod tasks;
mod tick;

// Heap allocator for tensor storage; exhaustion halts the system
#[global_allocator]
static HEAP: GuardedHeap = GuardedHeap::empty();

/// Built-in test frame served to the pipeline
static FRAME: [u8; FRAME_LEN] = gradient::<FRAME_LEN>(
    FRAME_GEOMETRY.width,
    FRAME_GEOMETRY.height,
    FRAME_GEOMETRY.channels,
);

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_LOW: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[entry]
fn main() -> ! {
    // Paint before anything deepens the stack
    let painted = stack::paint();

    info!("Tandem firmware starting...");

    if !painted {
        defmt::panic!("Stack region overlaps static data; shrink the task stacks");
    }

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals (clocks, time driver)
    let _p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    if let Err(e) = SYSTEM.validate() {
        defmt::panic!("Invalid system configuration: {}", e);
    }
    let plan = match PriorityPlan::derive(&SYSTEM, NVIC_PRIO_LEVELS) {
        Ok(plan) => plan,
        Err(e) => defmt::panic!("No priority plan: {}", e),
    };
    let responder_level = match plan.context(TaskId::Responder) {
        ExecutionContext::Interrupt { level } => level,
        ExecutionContext::Thread => defmt::panic!("Responder must run from an interrupt"),
    };

    let timing = SYSTEM.timing;
    info!("Model: {}", MODEL_NAME);
    info!(
        "Input: {}x{}x{} {}",
        INPUT_GEOMETRY.width, INPUT_GEOMETRY.height, INPUT_GEOMETRY.channels, INPUT_TYPE
    );
    info!(
        "Tick: {} us, deadline every {} ticks ({} us)",
        timing.tick_period_us,
        timing.deadline_threshold_ticks,
        timing.deadline_period_us().unwrap_or(u32::MAX)
    );

    // Collaborators for the pipeline
    let luma = LumaConfig {
        geometry: INPUT_GEOMETRY,
        dtype: INPUT_TYPE,
        classes: LABELS.len() as u32,
        workload_ms: WORKLOAD_MS,
        ..LumaConfig::default()
    };
    let engine = LumaHistogramEngine::new(luma, Delay);
    let post = TopClass::new(LABELS, THRESHOLD_PCT);
    let model = TensorModel::new(MODEL_NAME, engine, post).with_arena_limit(HEAP_BYTES);
    let source = match StaticFrameSource::new(&FRAME, FRAME_GEOMETRY) {
        Ok(source) => source,
        Err(e) => defmt::panic!("Test frame rejected: {}", e),
    };

    // Responder: interrupt executor, above thread mode
    interrupt::SWI_IRQ_1.set_priority(interrupt_priority(responder_level));
    let spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    spawner
        .spawn(tasks::responder_task(&channels::DEADLINE))
        .unwrap();

    // Tick: most urgent level, started once the responder is waiting
    let mut cp = unwrap!(cortex_m::Peripherals::take());
    let sys_clk_hz = embassy_rp::clocks::clk_sys_freq();
    if let Err(e) = tick::start(&mut cp.SYST, &mut cp.SCB, sys_clk_hz, plan.tick_level) {
        defmt::panic!("SysTick setup failed: {}", e);
    }

    info!("Starting scheduler");

    // Pipeline: thread-mode executor, never returns
    let executor = EXECUTOR_LOW.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(tasks::pipeline_task(model, source)).unwrap();
    })
}

/// Initialize the heap allocator
fn init_heap() {
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_BYTES] = [MaybeUninit::uninit(); HEAP_BYTES];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_BYTES)
    }
}

/// Map an NVIC level onto the RP2040 priority enum
fn interrupt_priority(level: u8) -> Priority {
    match level {
        0 => Priority::P0,
        1 => Priority::P1,
        2 => Priority::P2,
        _ => Priority::P3,
    }
}
