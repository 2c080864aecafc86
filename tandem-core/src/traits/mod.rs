//! Collaborator traits
//!
//! Narrow synchronous interfaces to everything outside the scheduling
//! core: the model, the image source, the microsecond clock and the
//! runtime statistics.

pub mod clock;
pub mod image;
pub mod model;
pub mod runtime;

pub use clock::MicrosClock;
pub use image::{AcquireError, ImageSource};
pub use model::{Model, ModelError};
pub use runtime::RuntimeStats;
