//! Board-agnostic scheduling core for the Tandem firmware
//!
//! Tandem runs two execution contexts on one core:
//!
//! - A real-time responder woken by a deadline event raised from the
//!   timer tick interrupt through a binary signal
//! - A best-effort perception pipeline that loops acquire → convert →
//!   infer → post-process → report → idle
//!
//! This crate contains everything that does not depend on the board:
//!
//! - System configuration and validation
//! - Task model, lifecycle state machine and the dispatch policy
//! - Tick divider and deadline signal (ISR → task hand-off)
//! - Pipeline and responder task bodies
//! - Fatal fault policy and stack watermarking
//! - Tensor descriptors and collaborator traits

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod diagnostics;
pub mod fault;
pub mod pipeline;
pub mod responder;
pub mod scheduler;
pub mod signal;
pub mod stack;
pub mod task;
pub mod tensor;
pub mod tick;
pub mod traits;
