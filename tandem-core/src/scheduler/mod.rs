//! Fixed-priority preemptive dispatch
//!
//! The firmware does not run its own scheduler; it maps each task onto an
//! execution context (interrupt executor or thread mode) whose hardware
//! priority enforces the policy. This module holds that mapping and an
//! executable model of the policy used to check it on the host.

pub mod dispatch;
pub mod priority;

pub use dispatch::{Dispatcher, Switch};
pub use priority::{ExecutionContext, PriorityPlan};
