//! Tensor descriptors and input conversion
//!
//! The model collaborator owns the tensor memory. The core only sees
//! descriptors (NHWC dimensions and element type) and borrowed slices.

use heapless::Vec;

/// Maximum tensor rank
pub const MAX_TENSOR_DIMS: usize = 5;

/// Element type of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TensorType {
    #[default]
    UInt8,
    Int8,
    Float32,
}

impl TensorType {
    /// Element size in bytes
    pub const fn size_bytes(self) -> usize {
        match self {
            TensorType::UInt8 | TensorType::Int8 => 1,
            TensorType::Float32 => 4,
        }
    }
}

/// Tensor dimensions
pub type TensorDims = Vec<u32, MAX_TENSOR_DIMS>;

/// Image geometry derived from an NHWC input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl ImageGeometry {
    /// Number of raw 8-bit samples in one frame
    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }
}

/// Shape and element type of one tensor
///
/// The default is a rank-0 `UInt8` descriptor with no elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TensorInfo {
    pub dims: TensorDims,
    pub dtype: TensorType,
}

impl TensorInfo {
    /// Build a descriptor from a dimension slice
    ///
    /// Returns None if the rank exceeds `MAX_TENSOR_DIMS`.
    pub fn new(dims: &[u32], dtype: TensorType) -> Option<Self> {
        let dims = Vec::from_slice(dims).ok()?;
        Some(Self { dims, dtype })
    }

    /// Total number of elements
    pub fn element_count(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product()
    }

    /// Total size in bytes
    pub fn byte_len(&self) -> usize {
        self.element_count() * self.dtype.size_bytes()
    }

    /// Interpret as `[batches, height, width, channels]`
    ///
    /// Returns None unless the tensor is rank 4 with a single batch and
    /// non-zero extents.
    pub fn image_geometry(&self) -> Option<ImageGeometry> {
        match self.dims.as_slice() {
            [1, height, width, channels] if *height > 0 && *width > 0 && *channels > 0 => {
                Some(ImageGeometry {
                    width: *width,
                    height: *height,
                    channels: *channels,
                })
            }
            _ => None,
        }
    }
}

/// Input conversion parameters for float models
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Normalization {
    pub mean: f32,
    pub std: f32,
}

impl Normalization {
    /// Maps 0..=255 onto roughly -1.0..=1.0
    pub const SYMMETRIC: Normalization = Normalization {
        mean: 127.5,
        std: 127.5,
    };
}

/// Offset applied when shifting unsigned samples into int8 range
pub const INT8_INPUT_OFFSET: i16 = 127;

/// Convert raw 8-bit samples in place into the model's input encoding
///
/// `data` holds `samples` unsigned bytes at the front on entry.
/// - `UInt8`: unchanged
/// - `Int8`: `sample - 127`, clamped to the i8 range
/// - `Float32`: `(sample - mean) / std`, stored as native-endian f32
///
/// The int8 shift saturates instead of wrapping. A narrowing store would
/// turn 255 into -128 and flip the brightest samples to the darkest code;
/// here 255 maps to 127.
///
/// Float conversion widens each element to four bytes, so it walks the
/// buffer back to front; element `i` is read before bytes `4i..4i+4`
/// are written, and those bytes only overlap elements already consumed.
///
/// Returns false (leaving `data` untouched) if the buffer cannot hold the
/// converted samples.
pub fn convert_input(
    data: &mut [u8],
    samples: usize,
    dtype: TensorType,
    norm: Normalization,
) -> bool {
    if data.len() < samples * dtype.size_bytes() {
        return false;
    }

    match dtype {
        TensorType::UInt8 => {}
        TensorType::Int8 => {
            for byte in &mut data[..samples] {
                let shifted = *byte as i16 - INT8_INPUT_OFFSET;
                let clamped = shifted.clamp(i8::MIN as i16, i8::MAX as i16);
                *byte = (clamped as i8) as u8;
            }
        }
        TensorType::Float32 => {
            for i in (0..samples).rev() {
                let value = (data[i] as f32 - norm.mean) / norm.std;
                data[i * 4..i * 4 + 4].copy_from_slice(&value.to_ne_bytes());
            }
        }
    }

    true
}
