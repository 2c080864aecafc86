//! Perception model collaborator

use crate::tensor::TensorInfo;

/// Errors from model initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModelError {
    /// Model data does not match the supported schema version
    SchemaMismatch,
    /// Declared tensor shape is unusable (input must be a single NHWC image)
    ShapeMismatch,
    /// Tensor element type not supported by the engine
    UnsupportedType,
    /// Tensor storage could not be set up
    ArenaSetup,
}

/// Model collaborator driven by the pipeline task
///
/// The model owns its input and output tensors. `init` is called exactly
/// once before any other method except `name`. Conversion, inference and
/// post-processing are treated as infallible.
pub trait Model {
    /// Result of post-processing, handed back to the pipeline for reporting
    type Output;

    /// Human readable model name
    fn name(&self) -> &'static str;

    /// Prepare tensors and the engine
    fn init(&mut self) -> Result<(), ModelError>;

    /// Input tensor descriptor
    fn input_info(&self) -> &TensorInfo;

    /// Output tensor descriptor
    fn output_info(&self) -> &TensorInfo;

    /// Writable input tensor storage
    fn input_buffer_mut(&mut self) -> &mut [u8];

    /// Convert the raw frame in the input tensor into the model encoding
    fn convert_input(&mut self);

    /// Run inference on the converted input
    fn run_inference(&mut self);

    /// Post-process the output tensor
    ///
    /// `latency_us` is the measured inference time.
    fn process_output(&mut self, latency_us: u32) -> Self::Output;
}
