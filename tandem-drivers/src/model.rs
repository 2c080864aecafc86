//! Heap-backed tensor model
//!
//! `TensorModel` owns the input and output tensors and wires an inference
//! engine and a post-processor into the core `Model` interface. Tensor
//! storage is allocated once in `init` and never freed.

use alloc::vec;
use alloc::vec::Vec;

use tandem_core::tensor::{convert_input, ImageGeometry, Normalization, TensorInfo, TensorType};
use tandem_core::traits::{Model, ModelError};

/// Model data schema understood by this crate
pub const SUPPORTED_SCHEMA_VERSION: u32 = 3;

/// Default upper bound for the combined tensor storage (bytes)
pub const DEFAULT_ARENA_LIMIT: usize = 96 * 1024;

/// Computes output tensor contents from a converted input tensor
pub trait InferenceEngine {
    /// Schema version of the model data the engine was built from
    fn schema_version(&self) -> u32;

    /// Declared input tensor
    fn input_info(&self) -> TensorInfo;

    /// Declared output tensor
    fn output_info(&self) -> TensorInfo;

    /// Float input normalization expected by the model
    fn normalization(&self) -> Normalization {
        Normalization::SYMMETRIC
    }

    /// Run the model
    ///
    /// `input` and `output` are sized to the declared tensors.
    fn invoke(&mut self, input: &[u8], output: &mut [u8]);
}

/// Turns a raw output tensor into a typed result
pub trait PostProcessor {
    type Output;

    fn process(&mut self, output: &[u8], info: &TensorInfo, latency_us: u32) -> Self::Output;
}

/// Tensor model made of an engine and a post-processor
pub struct TensorModel<E, P> {
    name: &'static str,
    engine: E,
    post: P,
    input_info: TensorInfo,
    output_info: TensorInfo,
    normalization: Normalization,
    geometry: Option<ImageGeometry>,
    arena_limit: usize,
    input: Vec<u8>,
    output: Vec<u8>,
}

impl<E: InferenceEngine, P: PostProcessor> TensorModel<E, P> {
    pub fn new(name: &'static str, engine: E, post: P) -> Self {
        let input_info = engine.input_info();
        let output_info = engine.output_info();
        let normalization = engine.normalization();

        Self {
            name,
            engine,
            post,
            input_info,
            output_info,
            normalization,
            geometry: None,
            arena_limit: DEFAULT_ARENA_LIMIT,
            input: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Set the tensor storage bound checked by `init`
    pub fn with_arena_limit(mut self, bytes: usize) -> Self {
        self.arena_limit = bytes;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Raw output tensor
    pub fn output_tensor(&self) -> &[u8] {
        &self.output
    }

    /// Check if `init` succeeded
    pub fn is_initialized(&self) -> bool {
        self.geometry.is_some()
    }
}

impl<E: InferenceEngine, P: PostProcessor> Model for TensorModel<E, P> {
    type Output = P::Output;

    fn name(&self) -> &'static str {
        self.name
    }

    fn init(&mut self) -> Result<(), ModelError> {
        if self.engine.schema_version() != SUPPORTED_SCHEMA_VERSION {
            return Err(ModelError::SchemaMismatch);
        }

        let geometry = self
            .input_info
            .image_geometry()
            .ok_or(ModelError::ShapeMismatch)?;
        if self.output_info.element_count() == 0 {
            return Err(ModelError::ShapeMismatch);
        }

        if self.normalization.std == 0.0 && self.input_info.dtype == TensorType::Float32 {
            return Err(ModelError::UnsupportedType);
        }

        let input_len = self.input_info.byte_len();
        let output_len = self.output_info.byte_len();
        if input_len + output_len > self.arena_limit {
            return Err(ModelError::ArenaSetup);
        }

        self.input = vec![0; input_len];
        self.output = vec![0; output_len];
        self.geometry = Some(geometry);
        Ok(())
    }

    fn input_info(&self) -> &TensorInfo {
        &self.input_info
    }

    fn output_info(&self) -> &TensorInfo {
        &self.output_info
    }

    fn input_buffer_mut(&mut self) -> &mut [u8] {
        &mut self.input
    }

    fn convert_input(&mut self) {
        if let Some(geometry) = self.geometry {
            // Storage is sized from the same descriptor, so this cannot fail
            let converted = convert_input(
                &mut self.input,
                geometry.sample_count(),
                self.input_info.dtype,
                self.normalization,
            );
            debug_assert!(converted);
        }
    }

    fn run_inference(&mut self) {
        self.engine.invoke(&self.input, &mut self.output);
    }

    fn process_output(&mut self, latency_us: u32) -> P::Output {
        self.post.process(&self.output, &self.output_info, latency_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoEngine {
        input: TensorInfo,
        version: u32,
        invoked: u32,
    }

    impl EchoEngine {
        fn new(dtype: TensorType) -> Self {
            Self {
                input: TensorInfo::new(&[1, 2, 2, 1], dtype).unwrap(),
                version: SUPPORTED_SCHEMA_VERSION,
                invoked: 0,
            }
        }
    }

    impl InferenceEngine for EchoEngine {
        fn schema_version(&self) -> u32 {
            self.version
        }

        fn input_info(&self) -> TensorInfo {
            self.input.clone()
        }

        fn output_info(&self) -> TensorInfo {
            TensorInfo::new(&[1, 4], TensorType::UInt8).unwrap()
        }

        fn invoke(&mut self, input: &[u8], output: &mut [u8]) {
            self.invoked += 1;
            output.copy_from_slice(&input[..4]);
        }
    }

    struct Sum;

    impl PostProcessor for Sum {
        type Output = (u32, u32);

        fn process(&mut self, output: &[u8], _info: &TensorInfo, latency_us: u32) -> (u32, u32) {
            (output.iter().map(|&b| b as u32).sum(), latency_us)
        }
    }

    #[test]
    fn test_init_allocates_tensors() {
        let mut model = TensorModel::new("echo", EchoEngine::new(TensorType::UInt8), Sum);
        assert!(model.input_buffer_mut().is_empty());

        model.init().unwrap();
        assert!(model.is_initialized());
        assert_eq!(model.input_buffer_mut().len(), 4);
        assert_eq!(model.output_tensor().len(), 4);
        assert_eq!(model.name(), "echo");
    }

    #[test]
    fn test_float_input_gets_widened_storage() {
        let mut model = TensorModel::new("echo", EchoEngine::new(TensorType::Float32), Sum);
        model.init().unwrap();
        assert_eq!(model.input_buffer_mut().len(), 16);
    }

    #[test]
    fn test_schema_mismatch() {
        let mut engine = EchoEngine::new(TensorType::UInt8);
        engine.version = 2;
        let mut model = TensorModel::new("echo", engine, Sum);
        assert_eq!(model.init(), Err(ModelError::SchemaMismatch));
        assert!(!model.is_initialized());
    }

    #[test]
    fn test_non_image_input() {
        let mut engine = EchoEngine::new(TensorType::UInt8);
        engine.input = TensorInfo::new(&[4], TensorType::UInt8).unwrap();
        let mut model = TensorModel::new("echo", engine, Sum);
        assert_eq!(model.init(), Err(ModelError::ShapeMismatch));
    }

    #[test]
    fn test_arena_limit() {
        let engine = EchoEngine::new(TensorType::UInt8);
        let mut model = TensorModel::new("echo", engine, Sum).with_arena_limit(7);
        assert_eq!(model.init(), Err(ModelError::ArenaSetup));
    }

    #[test]
    fn test_full_cycle() {
        let mut model = TensorModel::new("echo", EchoEngine::new(TensorType::Int8), Sum);
        model.init().unwrap();

        model.input_buffer_mut().copy_from_slice(&[127, 128, 130, 255]);
        model.convert_input();
        // 255 - 127 saturates at i8::MAX
        assert_eq!(&*model.input_buffer_mut(), &[0u8, 1, 3, 127][..]);

        model.run_inference();
        assert_eq!(model.engine().invoked, 1);
        assert_eq!(model.process_output(1234), (131, 1234));
    }
}
