//! Mapping task priorities onto execution contexts
//!
//! Interrupt levels follow the NVIC convention: level 0 is the most
//! urgent. The tick interrupt takes level 0 so that a give made inside it
//! is acted on only when the handler returns. Every task except the
//! lowest-priority one gets its own interrupt executor level below the
//! tick; the lowest-priority task runs in thread mode.

use core::cmp::Reverse;

use crate::config::{ConfigError, SystemConfig};
use crate::task::{TaskId, TASK_COUNT};

/// Where a task's executor runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecutionContext {
    /// Interrupt executor pended through a software interrupt
    Interrupt { level: u8 },
    /// Thread-mode executor (preempted by every interrupt)
    Thread,
}

impl ExecutionContext {
    /// Check if this context can preempt `other`
    pub fn preempts(&self, other: &ExecutionContext) -> bool {
        match (self, other) {
            (Self::Interrupt { level: a }, Self::Interrupt { level: b }) => a < b,
            (Self::Interrupt { .. }, Self::Thread) => true,
            (Self::Thread, _) => false,
        }
    }
}

/// Execution context of every task plus the tick interrupt level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PriorityPlan {
    pub tick_level: u8,
    contexts: [ExecutionContext; TASK_COUNT],
}

impl PriorityPlan {
    /// Derive a plan for a validated configuration
    ///
    /// `levels` is the number of interrupt priority levels the core
    /// implements (4 on Cortex-M0+).
    pub fn derive(config: &SystemConfig, levels: u8) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut order = TaskId::ALL;
        order.sort_unstable_by_key(|id| Reverse(config.task(*id).priority));

        let mut contexts = [ExecutionContext::Thread; TASK_COUNT];
        let (lowest, above) = order.split_last().ok_or(ConfigError::InterruptLevels)?;
        contexts[lowest.index()] = ExecutionContext::Thread;

        for (rank, id) in above.iter().enumerate() {
            let level = u8::try_from(rank + 1).map_err(|_| ConfigError::InterruptLevels)?;
            if level >= levels {
                return Err(ConfigError::InterruptLevels);
            }
            contexts[id.index()] = ExecutionContext::Interrupt { level };
        }

        Ok(Self {
            tick_level: 0,
            contexts,
        })
    }

    pub fn context(&self, id: TaskId) -> ExecutionContext {
        self.contexts[id.index()]
    }

    /// Check if `a` can preempt `b`
    pub fn preempts(&self, a: TaskId, b: TaskId) -> bool {
        self.context(a).preempts(&self.context(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan() {
        let plan = PriorityPlan::derive(&SystemConfig::DEFAULT, 4).unwrap();
        assert_eq!(plan.tick_level, 0);
        assert_eq!(
            plan.context(TaskId::Responder),
            ExecutionContext::Interrupt { level: 1 }
        );
        assert_eq!(plan.context(TaskId::Pipeline), ExecutionContext::Thread);
    }

    #[test]
    fn test_responder_preempts_pipeline() {
        let plan = PriorityPlan::derive(&SystemConfig::DEFAULT, 4).unwrap();
        assert!(plan.preempts(TaskId::Responder, TaskId::Pipeline));
        assert!(!plan.preempts(TaskId::Pipeline, TaskId::Responder));
    }

    #[test]
    fn test_tick_outranks_every_task() {
        let plan = PriorityPlan::derive(&SystemConfig::DEFAULT, 4).unwrap();
        let tick = ExecutionContext::Interrupt {
            level: plan.tick_level,
        };
        for id in TaskId::ALL {
            assert!(tick.preempts(&plan.context(id)));
        }
    }

    #[test]
    fn test_needs_two_levels() {
        assert_eq!(
            PriorityPlan::derive(&SystemConfig::DEFAULT, 1),
            Err(ConfigError::InterruptLevels)
        );
        assert!(PriorityPlan::derive(&SystemConfig::DEFAULT, 2).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SystemConfig::DEFAULT;
        config.pipeline.priority = config.responder.priority;
        assert!(PriorityPlan::derive(&config, 4).is_err());
    }

    #[test]
    fn test_context_ordering() {
        let high = ExecutionContext::Interrupt { level: 1 };
        let low = ExecutionContext::Interrupt { level: 2 };
        assert!(high.preempts(&low));
        assert!(!low.preempts(&high));
        assert!(!high.preempts(&high));

        let thread = ExecutionContext::Thread;
        assert!(!thread.preempts(&thread));
        assert!(high.preempts(&thread));
    }
}
