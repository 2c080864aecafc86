//! Tick-level simulation of the two tasks and the tick interrupt
//!
//! Each simulated tick runs the tick hook, then lets the dispatcher act on
//! the pending signal at interrupt exit, then polls the responder if it
//! holds the processor. The pipeline never yields unless a test drives it.

use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, Waker};
use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use tandem_core::config::{SystemConfig, TimingConfig};
use tandem_core::fault::{halt, FaultKind, FaultLatch, HaltControl};
use tandem_core::pipeline::{CycleOutcome, Pipeline};
use tandem_core::responder::{Reaction, Responder};
use tandem_core::scheduler::{Dispatcher, Switch};
use tandem_core::signal::{DeadlineSignal, SignalState};
use tandem_core::task::{TaskId, TaskState};
use tandem_core::tensor::{TensorInfo, TensorType};
use tandem_core::tick::DeadlineTimer;
use tandem_core::traits::{AcquireError, ImageSource, MicrosClock, Model, ModelError, RuntimeStats};

type Signal = DeadlineSignal<CriticalSectionRawMutex>;

struct SimClock {
    now_us: Cell<u64>,
}

impl MicrosClock for SimClock {
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}

#[derive(Default)]
struct SimPlatform {
    interrupts_enabled: Cell<bool>,
    reports: RefCell<Vec<FaultKind>>,
}

impl HaltControl for SimPlatform {
    fn disable_interrupts(&self) {
        self.interrupts_enabled.set(false);
    }

    fn report(&self, fault: &FaultKind) {
        self.reports.borrow_mut().push(*fault);
    }

    fn park(&self) -> ! {
        panic!("parked");
    }
}

struct Sim {
    timing: TimingConfig,
    timer: DeadlineTimer,
    signal: &'static Signal,
    clock: &'static SimClock,
    dispatcher: Dispatcher,
    responder: Responder<&'static SimClock>,
    platform: SimPlatform,
    latch: FaultLatch,
    tick: u64,
    raises: Vec<u64>,
    responder_dispatches: Vec<(u64, Switch)>,
    reactions: Vec<(u64, Reaction)>,
}

impl Sim {
    fn new(config: SystemConfig) -> Self {
        let signal: &'static Signal = Box::leak(Box::new(Signal::new()));
        let clock: &'static SimClock = Box::leak(Box::new(SimClock {
            now_us: Cell::new(0),
        }));

        let platform = SimPlatform::default();
        platform.interrupts_enabled.set(true);

        let mut sim = Self {
            timing: config.timing,
            timer: DeadlineTimer::new(config.timing.deadline_threshold_ticks),
            signal,
            clock,
            dispatcher: Dispatcher::from_config(&config),
            responder: Responder::new(clock),
            platform,
            latch: FaultLatch::new(),
            tick: 0,
            raises: Vec::new(),
            responder_dispatches: Vec::new(),
            reactions: Vec::new(),
        };

        // Responder runs first and blocks on the empty signal
        sim.dispatcher.start();
        sim.run_responder();
        sim
    }

    fn step(&mut self) {
        if !self.platform.interrupts_enabled.get() {
            return;
        }

        self.tick += 1;
        self.clock
            .now_us
            .set(self.tick * self.timing.tick_period_us as u64);

        if self.timer.on_tick(self.signal).is_some() {
            self.raises.push(self.tick);
        }

        // Interrupt exit: the pended executor gets the processor if it outranks
        if self.signal.state() == SignalState::Signaled
            && self.dispatcher.state(TaskId::Responder) == TaskState::Blocked
        {
            if let Some(switch) = self.dispatcher.wake(TaskId::Responder) {
                self.responder_dispatches.push((self.tick, switch));
            }
        }

        self.run_responder();
    }

    fn run_for(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    fn run_responder(&mut self) {
        if self.dispatcher.running() != Some(TaskId::Responder) {
            return;
        }

        let mut cx = Context::from_waker(Waker::noop());
        loop {
            let poll = {
                let mut reaction = pin!(self.responder.react(self.signal));
                reaction.as_mut().poll(&mut cx)
            };
            match poll {
                Poll::Ready(reaction) => self.reactions.push((self.tick, reaction)),
                Poll::Pending => {
                    self.dispatcher.block(TaskId::Responder);
                    break;
                }
            }
        }
    }

    fn fault(&mut self, fault: FaultKind) {
        let halting = AssertUnwindSafe(|| halt(&self.latch, &self.platform, fault));
        let result = catch_unwind(halting);
        assert!(result.is_err(), "halt returned");
    }
}

#[test]
fn test_signal_raised_every_500_ticks() {
    let mut sim = Sim::new(SystemConfig::DEFAULT);
    sim.run_for(10_000);

    let expected: Vec<u64> = (1..=20).map(|n| n * 500).collect();
    assert_eq!(sim.raises, expected);
}

#[test]
fn test_every_reaction_follows_a_raise() {
    let mut sim = Sim::new(SystemConfig::DEFAULT);
    sim.run_for(7_777);

    assert_eq!(sim.reactions.len(), sim.raises.len());
    for ((reaction_tick, reaction), raise_tick) in sim.reactions.iter().zip(&sim.raises) {
        assert!(raise_tick <= reaction_tick);
        let position = sim.raises.iter().position(|t| t == raise_tick).unwrap();
        assert_eq!(reaction.sequence as usize, position + 1);
    }

    // Nothing reacts before the first raise
    let mut early = Sim::new(SystemConfig::DEFAULT);
    early.run_for(499);
    assert!(early.reactions.is_empty());
}

#[test]
fn test_responder_preempts_busy_pipeline_within_one_tick() {
    let mut sim = Sim::new(SystemConfig::DEFAULT);

    // Pipeline is stuck in an inference that never yields
    assert_eq!(sim.dispatcher.running(), Some(TaskId::Pipeline));
    sim.run_for(50_000);

    let preemption = Switch {
        from: Some(TaskId::Pipeline),
        to: Some(TaskId::Responder),
    };
    assert_eq!(sim.responder_dispatches.len(), sim.raises.len());
    for ((dispatch_tick, switch), raise_tick) in sim.responder_dispatches.iter().zip(&sim.raises) {
        assert!(dispatch_tick - raise_tick <= 1);
        assert_eq!(*switch, preemption);
    }

    // After each reaction the pipeline gets the processor back
    assert_eq!(sim.dispatcher.running(), Some(TaskId::Pipeline));
}

#[test]
fn test_responder_period_is_2500_ms() {
    let mut sim = Sim::new(SystemConfig::DEFAULT);
    sim.run_for(500 * 12);

    let periods: Vec<u64> = sim
        .reactions
        .iter()
        .filter_map(|(_, reaction)| reaction.period_us)
        .collect();

    assert_eq!(periods.len(), 11);
    for period in periods {
        assert!((2_495_000..=2_505_000).contains(&period), "period {period}");
    }
}

#[test]
fn test_custom_timing_scales_period() {
    let mut config = SystemConfig::DEFAULT;
    config.timing.tick_period_us = 1_000;
    config.timing.deadline_threshold_ticks = 100;
    assert_eq!(config.validate(), Ok(()));

    let mut sim = Sim::new(config);
    sim.run_for(1_000);

    assert_eq!(sim.raises.len(), 10);
    assert_eq!(sim.reactions[1].1.period_us, Some(100_000));
}

// Pipeline collaborators

#[derive(Clone, Default)]
struct Counters {
    acquire: Rc<Cell<u32>>,
    convert: Rc<Cell<u32>>,
    infer: Rc<Cell<u32>>,
}

struct SimModel {
    input: TensorInfo,
    output: TensorInfo,
    buffer: Vec<u8>,
    fail_init: bool,
    counters: Counters,
}

impl SimModel {
    fn new(counters: Counters, fail_init: bool) -> Self {
        Self {
            input: TensorInfo::new(&[1, 8, 8, 1], TensorType::Int8).unwrap(),
            output: TensorInfo::new(&[1, 3], TensorType::Int8).unwrap(),
            buffer: vec![0; 64],
            fail_init,
            counters,
        }
    }
}

impl Model for SimModel {
    type Output = ();

    fn name(&self) -> &'static str {
        "sim"
    }

    fn init(&mut self) -> Result<(), ModelError> {
        if self.fail_init {
            Err(ModelError::ArenaSetup)
        } else {
            Ok(())
        }
    }

    fn input_info(&self) -> &TensorInfo {
        &self.input
    }

    fn output_info(&self) -> &TensorInfo {
        &self.output
    }

    fn input_buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    fn convert_input(&mut self) {
        self.counters.convert.set(self.counters.convert.get() + 1);
    }

    fn run_inference(&mut self) {
        self.counters.infer.set(self.counters.infer.get() + 1);
    }

    fn process_output(&mut self, _latency_us: u32) {}
}

struct FailingSource {
    counters: Counters,
}

impl ImageSource for FailingSource {
    fn acquire(&mut self, _: &mut [u8], _: u32, _: u32, _: u32) -> Result<(), AcquireError> {
        self.counters.acquire.set(self.counters.acquire.get() + 1);
        Err(AcquireError::Device)
    }
}

struct NoStats;

impl RuntimeStats for NoStats {
    fn free_heap_bytes(&self) -> u32 {
        0
    }

    fn stack_headroom_bytes(&self, _task: TaskId) -> u32 {
        0
    }
}

#[test]
fn test_failed_pipeline_init_does_not_affect_responder() {
    let counters = Counters::default();
    let mut sim = Sim::new(SystemConfig::DEFAULT);

    let started = Pipeline::start(
        SimModel::new(counters.clone(), true),
        FailingSource {
            counters: counters.clone(),
        },
        sim.clock,
        NoStats,
    );
    assert!(matches!(started, Err(ModelError::ArenaSetup)));
    sim.dispatcher.suspend(TaskId::Pipeline);

    sim.run_for(5_000);

    assert_eq!(counters.acquire.get(), 0);
    assert_eq!(counters.convert.get(), 0);
    assert_eq!(counters.infer.get(), 0);
    assert_eq!(sim.dispatcher.state(TaskId::Pipeline), TaskState::Suspended);

    // Responder keeps its cadence; with the pipeline parked it wakes from idle
    assert_eq!(sim.reactions.len(), 10);
    assert!(sim
        .responder_dispatches
        .iter()
        .all(|(_, switch)| switch.from.is_none()));
}

#[test]
fn test_acquisition_failures_never_stall_the_system() {
    let counters = Counters::default();
    let mut sim = Sim::new(SystemConfig::DEFAULT);
    let mut pipeline = Pipeline::start(
        SimModel::new(counters.clone(), false),
        FailingSource {
            counters: counters.clone(),
        },
        sim.clock,
        NoStats,
    )
    .unwrap();

    for _ in 0..5_000 {
        sim.step();
        if sim.dispatcher.running() == Some(TaskId::Pipeline) {
            let expected = CycleOutcome::AcquisitionFailed(AcquireError::Device);
            assert_eq!(pipeline.cycle(), expected);
        }
    }

    assert_eq!(counters.acquire.get(), 5_000);
    assert_eq!(counters.infer.get(), 0);
    assert_eq!(pipeline.failed_acquisitions(), 5_000);
    assert_eq!(sim.reactions.len(), 10);
}

#[test]
fn test_allocation_failure_halts_everything() {
    let mut sim = Sim::new(SystemConfig::DEFAULT);
    sim.run_for(1_200);
    let raises = sim.raises.len();
    let reactions = sim.reactions.len();

    sim.fault(FaultKind::AllocationFailed {
        size: 49_152,
        align: 4,
    });
    assert!(!sim.platform.interrupts_enabled.get());

    sim.run_for(10_000);
    assert_eq!(sim.raises.len(), raises);
    assert_eq!(sim.reactions.len(), reactions);
    assert_eq!(sim.signal.state(), SignalState::Empty);
    assert_eq!(sim.platform.reports.borrow().len(), 1);
}

#[test]
fn test_stack_overflow_halts_with_single_report() {
    let mut sim = Sim::new(SystemConfig::DEFAULT);
    sim.run_for(600);

    let overflow = FaultKind::StackOverflow {
        task: TaskId::Pipeline,
    };
    sim.fault(overflow);
    // Nested fault while halting: no second diagnostic
    sim.fault(FaultKind::AllocationFailed { size: 64, align: 4 });

    sim.run_for(1_000);
    assert_eq!(*sim.platform.reports.borrow(), vec![overflow]);
    assert_eq!(sim.raises, vec![500]);
}
