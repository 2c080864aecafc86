//! Collaborator implementations for the Tandem core
//!
//! Concrete implementations of the collaborator traits defined in
//! tandem-core:
//!
//! - Heap-backed tensor model wiring an engine to a post-processor
//! - Luminance histogram engine (synthetic, configurable workload)
//! - Static frame image source with nearest-neighbour resampling
//! - Top-class post-processor

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod engine;
pub mod image;
pub mod model;
pub mod postproc;

pub use engine::{LumaConfig, LumaHistogramEngine};
pub use image::StaticFrameSource;
pub use model::{InferenceEngine, PostProcessor, TensorModel};
pub use postproc::{ClassScore, Detection, TopClass};
