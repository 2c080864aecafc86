//! Luminance histogram engine
//!
//! Stand-in for a neural network: each output class is an intensity band,
//! and its score is the share of pixels whose mean channel intensity falls
//! in that band (0..=255). An optional synthetic workload blocks for a
//! fixed time on every invocation to emulate a slow model.

use embedded_hal::delay::DelayNs;
use tandem_core::tensor::{
    ImageGeometry, Normalization, TensorInfo, TensorType, INT8_INPUT_OFFSET,
};

use crate::model::{InferenceEngine, SUPPORTED_SCHEMA_VERSION};

/// Maximum number of output classes
pub const MAX_CLASSES: u32 = 16;

/// Engine parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LumaConfig {
    pub geometry: ImageGeometry,
    /// Input tensor element type
    pub dtype: TensorType,
    /// Number of intensity bands (1..=MAX_CLASSES)
    pub classes: u32,
    /// Busy time added to every inference (0 = none)
    pub workload_ms: u32,
    pub normalization: Normalization,
}

impl Default for LumaConfig {
    fn default() -> Self {
        Self {
            geometry: ImageGeometry {
                width: 96,
                height: 96,
                channels: 3,
            },
            dtype: TensorType::Int8,
            classes: 4,
            workload_ms: 0,
            normalization: Normalization::SYMMETRIC,
        }
    }
}

/// Histogram engine with a blocking workload delay
pub struct LumaHistogramEngine<D> {
    config: LumaConfig,
    delay: D,
    invocations: u32,
}

impl<D: DelayNs> LumaHistogramEngine<D> {
    /// Create an engine; the class count is clamped to 1..=MAX_CLASSES
    pub fn new(mut config: LumaConfig, delay: D) -> Self {
        config.classes = config.classes.clamp(1, MAX_CLASSES);
        Self {
            config,
            delay,
            invocations: 0,
        }
    }

    pub fn config(&self) -> &LumaConfig {
        &self.config
    }

    pub fn invocations(&self) -> u32 {
        self.invocations
    }

    /// Recover the raw 0..=255 sample at `index` from the converted input
    fn sample(&self, input: &[u8], index: usize) -> u8 {
        match self.config.dtype {
            TensorType::UInt8 => input[index],
            TensorType::Int8 => {
                let value = input[index] as i8 as i16 + INT8_INPUT_OFFSET;
                value.clamp(0, 255) as u8
            }
            TensorType::Float32 => {
                let start = index * 4;
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(&input[start..start + 4]);
                let norm = self.config.normalization;
                let value = f32::from_ne_bytes(bytes) * norm.std + norm.mean + 0.5;
                value.clamp(0.0, 255.0) as u8
            }
        }
    }
}

impl<D: DelayNs> InferenceEngine for LumaHistogramEngine<D> {
    fn schema_version(&self) -> u32 {
        SUPPORTED_SCHEMA_VERSION
    }

    fn input_info(&self) -> TensorInfo {
        let g = self.config.geometry;
        let dims = [1, g.height, g.width, g.channels];
        TensorInfo::new(&dims, self.config.dtype).unwrap_or_default()
    }

    fn output_info(&self) -> TensorInfo {
        TensorInfo::new(&[1, self.config.classes], TensorType::UInt8).unwrap_or_default()
    }

    fn normalization(&self) -> Normalization {
        self.config.normalization
    }

    fn invoke(&mut self, input: &[u8], output: &mut [u8]) {
        self.invocations = self.invocations.wrapping_add(1);

        let g = self.config.geometry;
        let pixels = g.width as usize * g.height as usize;
        let channels = g.channels as usize;
        let classes = self.config.classes as usize;

        let mut counts = [0u32; MAX_CLASSES as usize];
        for pixel in 0..pixels {
            let sum: u32 = (0..channels)
                .map(|c| self.sample(input, pixel * channels + c) as u32)
                .sum();
            let luma = sum / channels.max(1) as u32;
            let band = (luma as usize * classes) / 256;
            counts[band] += 1;
        }

        for (score, count) in output.iter_mut().zip(&counts[..classes]) {
            *score = ((*count as u64 * 255) / pixels.max(1) as u64) as u8;
        }

        if self.config.workload_ms > 0 {
            self.delay.delay_ms(self.config.workload_ms);
        }
    }
}
