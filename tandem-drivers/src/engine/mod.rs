//! Inference engines

pub mod luma;

pub use luma::{LumaConfig, LumaHistogramEngine, MAX_CLASSES};
