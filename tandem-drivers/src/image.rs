//! Static frame image source
//!
//! Serves a fixed frame from memory, resampled (nearest neighbour) to
//! whatever geometry the model asks for. Useful on boards without a
//! camera and for exercising the pipeline deterministically.

use tandem_core::tensor::ImageGeometry;
use tandem_core::traits::{AcquireError, ImageSource};

/// Image source backed by a borrowed frame
pub struct StaticFrameSource<'a> {
    frame: &'a [u8],
    geometry: ImageGeometry,
    frames_served: u32,
}

impl<'a> StaticFrameSource<'a> {
    /// Wrap an interleaved 8-bit frame
    ///
    /// Fails if `frame` is shorter than the geometry implies.
    pub fn new(frame: &'a [u8], geometry: ImageGeometry) -> Result<Self, AcquireError> {
        if geometry.sample_count() == 0 {
            return Err(AcquireError::Device);
        }
        if frame.len() < geometry.sample_count() {
            return Err(AcquireError::BufferTooSmall);
        }
        Ok(Self {
            frame,
            geometry,
            frames_served: 0,
        })
    }

    pub fn geometry(&self) -> ImageGeometry {
        self.geometry
    }

    pub fn frames_served(&self) -> u32 {
        self.frames_served
    }
}

impl ImageSource for StaticFrameSource<'_> {
    fn acquire(
        &mut self,
        buffer: &mut [u8],
        width: u32,
        height: u32,
        channels: u32,
    ) -> Result<(), AcquireError> {
        if channels != self.geometry.channels {
            return Err(AcquireError::UnsupportedChannels);
        }
        if width == 0 || height == 0 {
            return Err(AcquireError::Device);
        }

        let (width, height, channels) = (width as usize, height as usize, channels as usize);
        if buffer.len() < width * height * channels {
            return Err(AcquireError::BufferTooSmall);
        }

        let src_w = self.geometry.width as usize;
        let src_h = self.geometry.height as usize;

        for y in 0..height {
            let sy = y * src_h / height;
            for x in 0..width {
                let sx = x * src_w / width;
                let src = (sy * src_w + sx) * channels;
                let dst = (y * width + x) * channels;
                buffer[dst..dst + channels].copy_from_slice(&self.frame[src..src + channels]);
            }
        }

        self.frames_served = self.frames_served.wrapping_add(1);
        Ok(())
    }
}

/// Diagonal gradient test pattern
///
/// Sample value is `(x + y) * 255 / (width + height - 2)` in every channel.
/// `N` must equal `width * height * channels`; extra space stays zero.
pub const fn gradient<const N: usize>(width: u32, height: u32, channels: u32) -> [u8; N] {
    let mut frame = [0u8; N];
    let span = if width + height > 2 {
        width + height - 2
    } else {
        1
    };

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let value = ((x + y) * 255 / span) as u8;
            let mut c = 0;
            while c < channels {
                let index = ((y * width + x) * channels + c) as usize;
                if index < N {
                    frame[index] = value;
                }
                c += 1;
            }
            x += 1;
        }
        y += 1;
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn geometry(width: u32, height: u32, channels: u32) -> ImageGeometry {
        ImageGeometry {
            width,
            height,
            channels,
        }
    }

    #[test]
    fn test_same_size_copy() {
        let frame = [1u8, 2, 3, 4];
        let mut source = StaticFrameSource::new(&frame, geometry(2, 2, 1)).unwrap();
        let mut buffer = [0u8; 4];

        source.acquire(&mut buffer, 2, 2, 1).unwrap();
        assert_eq!(buffer, frame);
        assert_eq!(source.frames_served(), 1);
    }

    #[test]
    fn test_downsample_nearest() {
        #[rustfmt::skip]
        let frame = [
            1, 1, 2, 2,
            1, 1, 2, 2,
            3, 3, 4, 4,
            3, 3, 4, 4,
        ];
        let mut source = StaticFrameSource::new(&frame, geometry(4, 4, 1)).unwrap();
        let mut buffer = [0u8; 4];

        source.acquire(&mut buffer, 2, 2, 1).unwrap();
        assert_eq!(buffer, [1, 2, 3, 4]);
    }

    #[test]
    fn test_upsample_keeps_channels_together() {
        let frame = [10u8, 20, 30, 40, 50, 60];
        let mut source = StaticFrameSource::new(&frame, geometry(2, 1, 3)).unwrap();
        let mut buffer = [0u8; 12];

        source.acquire(&mut buffer, 4, 1, 3).unwrap();
        assert_eq!(buffer, [10, 20, 30, 10, 20, 30, 40, 50, 60, 40, 50, 60]);
    }

    #[test]
    fn test_channel_mismatch() {
        let frame = [0u8; 12];
        let mut source = StaticFrameSource::new(&frame, geometry(2, 2, 3)).unwrap();
        let mut buffer = [0u8; 4];
        assert_eq!(
            source.acquire(&mut buffer, 2, 2, 1),
            Err(AcquireError::UnsupportedChannels)
        );
        assert_eq!(source.frames_served(), 0);
    }

    #[test]
    fn test_short_buffer() {
        let frame = [0u8; 4];
        let mut source = StaticFrameSource::new(&frame, geometry(2, 2, 1)).unwrap();
        let mut buffer = [0u8; 3];
        assert_eq!(
            source.acquire(&mut buffer, 2, 2, 1),
            Err(AcquireError::BufferTooSmall)
        );
    }

    #[test]
    fn test_short_frame_rejected() {
        let frame = [0u8; 3];
        assert!(matches!(
            StaticFrameSource::new(&frame, geometry(2, 2, 1)),
            Err(AcquireError::BufferTooSmall)
        ));
    }

    #[test]
    fn test_gradient_pattern() {
        const FRAME: [u8; 9] = gradient::<9>(3, 3, 1);
        assert_eq!(FRAME, [0, 63, 127, 63, 127, 191, 127, 191, 255]);
    }

    proptest! {
        #[test]
        fn prop_resample_draws_from_source(w in 1u32..40, h in 1u32..40) {
            const FRAME: [u8; 16 * 12] = gradient::<{ 16 * 12 }>(16, 12, 1);
            let mut source = StaticFrameSource::new(&FRAME, geometry(16, 12, 1)).unwrap();
            let mut buffer = vec![0u8; (w * h) as usize];

            prop_assert!(source.acquire(&mut buffer, w, h, 1).is_ok());
            prop_assert_eq!(buffer[0], FRAME[0]);
            for sample in &buffer {
                prop_assert!(FRAME.contains(sample));
            }
        }
    }
}
