//! Embassy async tasks
//!
//! The responder runs on the interrupt executor, the pipeline on the
//! thread-mode executor. They share nothing but the deadline signal.

pub mod pipeline;
pub mod responder;

pub use pipeline::{pipeline_task, FirmwareModel};
pub use responder::responder_task;
