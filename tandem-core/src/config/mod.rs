//! System configuration
//!
//! Timing constants and the two task descriptions. The firmware builds a
//! `SystemConfig` from constants generated at build time and validates it
//! again at boot before anything is scheduled.

use crate::task::{TaskId, TaskPriority, TaskSpec};

/// Default scheduler tick period (5 ms)
pub const DEFAULT_TICK_PERIOD_US: u32 = 5_000;

/// Default number of ticks between deadline events (500 × 5 ms = 2.5 s)
pub const DEFAULT_DEADLINE_THRESHOLD_TICKS: u32 = 500;

/// Default pipeline idle delay between iterations
pub const DEFAULT_PIPELINE_IDLE_MS: u32 = 1_000;

/// Highest assignable task priority by default
pub const DEFAULT_MAX_PRIORITY: u8 = 4;

/// Smallest stack budget accepted for any task (bytes)
pub const MIN_STACK_BUDGET: u32 = 256;

/// Maximum task name length (bytes)
pub const MAX_TASK_NAME_LEN: usize = 16;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Tick period must be non-zero
    ZeroTickPeriod,
    /// Deadline threshold must be non-zero
    ZeroThreshold,
    /// Pipeline idle delay must be non-zero
    ZeroIdleDelay,
    /// tick period × threshold does not fit in 32 bits of microseconds
    PeriodOverflow,
    /// Task name empty or too long
    InvalidName(TaskId),
    /// Responder must sit at the highest assignable priority
    ResponderNotHighest,
    /// Pipeline priority must be above idle and below the responder
    PriorityOrder,
    /// Stack budget too small or not word aligned
    StackBudget(TaskId),
    /// Sum of stack budgets overflows
    StackTotalOverflow,
    /// Not enough interrupt priority levels to place every context
    InterruptLevels,
}

/// Tick and delay timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Hardware tick period in microseconds
    pub tick_period_us: u32,
    /// Ticks between two deadline events
    pub deadline_threshold_ticks: u32,
    /// Pipeline idle delay after each completed iteration
    pub pipeline_idle_ms: u32,
}

impl TimingConfig {
    pub const DEFAULT: TimingConfig = TimingConfig {
        tick_period_us: DEFAULT_TICK_PERIOD_US,
        deadline_threshold_ticks: DEFAULT_DEADLINE_THRESHOLD_TICKS,
        pipeline_idle_ms: DEFAULT_PIPELINE_IDLE_MS,
    };

    /// Nominal responder wake-up period (threshold × tick period) in µs
    ///
    /// Checked in 32 bits, which bounds the period to about 71 minutes.
    /// Returns None on overflow.
    pub fn deadline_period_us(&self) -> Option<u32> {
        self.tick_period_us.checked_mul(self.deadline_threshold_ticks)
    }

    /// Tick rate in Hz, rounded down
    pub fn tick_hz(&self) -> u32 {
        if self.tick_period_us == 0 {
            return 0;
        }
        1_000_000 / self.tick_period_us
    }

    /// Validate timing values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_us == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.deadline_threshold_ticks == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.pipeline_idle_ms == 0 {
            return Err(ConfigError::ZeroIdleDelay);
        }
        if self.deadline_period_us().is_none() {
            return Err(ConfigError::PeriodOverflow);
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Complete system configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemConfig {
    pub timing: TimingConfig,
    /// Perception pipeline task
    pub pipeline: TaskSpec,
    /// Deadline responder task
    pub responder: TaskSpec,
    /// Highest priority a task may be given
    pub max_priority: u8,
    /// Stack reserved for interrupt handlers on top of the task budgets (bytes)
    pub isr_stack_reserve: u32,
}

impl SystemConfig {
    pub const DEFAULT: SystemConfig = SystemConfig {
        timing: TimingConfig::DEFAULT,
        pipeline: TaskSpec::new("pipeline", 2, 32 * 1024),
        responder: TaskSpec::new("responder", DEFAULT_MAX_PRIORITY, 2 * 1024),
        max_priority: DEFAULT_MAX_PRIORITY,
        isr_stack_reserve: 1024,
    };

    /// Look up a task description
    pub fn task(&self, id: TaskId) -> &TaskSpec {
        match id {
            TaskId::Pipeline => &self.pipeline,
            TaskId::Responder => &self.responder,
        }
    }

    /// Total stack region size: both task budgets plus the interrupt reserve
    pub fn total_stack_budget(&self) -> Option<u32> {
        self.pipeline
            .stack_budget
            .checked_add(self.responder.stack_budget)?
            .checked_add(self.isr_stack_reserve)
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;

        for id in TaskId::ALL {
            let spec = self.task(id);
            if spec.name.is_empty() || spec.name.len() > MAX_TASK_NAME_LEN {
                return Err(ConfigError::InvalidName(id));
            }
            if spec.stack_budget < MIN_STACK_BUDGET || spec.stack_budget % 4 != 0 {
                return Err(ConfigError::StackBudget(id));
            }
        }

        if self.responder.priority != TaskPriority(self.max_priority) {
            return Err(ConfigError::ResponderNotHighest);
        }
        if self.pipeline.priority <= TaskPriority::IDLE
            || !self.responder.preempts(&self.pipeline)
        {
            return Err(ConfigError::PriorityOrder);
        }

        if self.total_stack_budget().is_none() {
            return Err(ConfigError::StackTotalOverflow);
        }

        Ok(())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
