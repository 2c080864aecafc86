//! Classification post-processing

use tandem_core::tensor::{TensorInfo, TensorType};

use crate::model::PostProcessor;

/// Best-scoring class of one inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassScore {
    pub index: usize,
    pub label: &'static str,
    /// Confidence in percent (0..=100)
    pub confidence_pct: u8,
}

/// Post-processed inference result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Detection {
    /// Measured inference time (µs)
    pub inference_us: u32,
    /// Top class, if it cleared the threshold
    pub top: Option<ClassScore>,
}

/// Arg-max over the output scores with a confidence threshold
pub struct TopClass {
    labels: &'static [&'static str],
    threshold_pct: u8,
}

impl TopClass {
    pub const fn new(labels: &'static [&'static str], threshold_pct: u8) -> Self {
        Self {
            labels,
            threshold_pct,
        }
    }

    fn label(&self, index: usize) -> &'static str {
        self.labels.get(index).copied().unwrap_or("?")
    }
}

/// Confidence of element `index` in percent
fn confidence_pct(output: &[u8], dtype: TensorType, index: usize) -> u8 {
    let pct = match dtype {
        TensorType::UInt8 => output[index] as u32 * 100 / 255,
        TensorType::Int8 => (output[index] as i8 as i32 + 128) as u32 * 100 / 255,
        TensorType::Float32 => {
            let start = index * 4;
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&output[start..start + 4]);
            (f32::from_ne_bytes(bytes).clamp(0.0, 1.0) * 100.0 + 0.5) as u32
        }
    };
    pct.min(100) as u8
}

impl PostProcessor for TopClass {
    type Output = Detection;

    fn process(&mut self, output: &[u8], info: &TensorInfo, latency_us: u32) -> Detection {
        let count = info.element_count().min(output.len() / info.dtype.size_bytes());

        let mut best: Option<ClassScore> = None;
        for index in 0..count {
            let confidence_pct = confidence_pct(output, info.dtype, index);
            if best.map_or(true, |b| confidence_pct > b.confidence_pct) {
                best = Some(ClassScore {
                    index,
                    label: self.label(index),
                    confidence_pct,
                });
            }
        }

        Detection {
            inference_us: latency_us,
            top: best.filter(|b| b.confidence_pct >= self.threshold_pct),
        }
    }
}
