//! Image acquisition

/// Errors from frame acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquireError {
    /// No frame available right now
    NotReady,
    /// Caller buffer smaller than width × height × channels
    BufferTooSmall,
    /// Source cannot produce the requested channel count
    UnsupportedChannels,
    /// Sensor or bus failure
    Device,
}

/// Source of input frames
///
/// Implementations write exactly `width × height × channels` 8-bit samples
/// to the front of `buffer`.
pub trait ImageSource {
    /// Acquire one frame into the caller-provided buffer
    fn acquire(
        &mut self,
        buffer: &mut [u8],
        width: u32,
        height: u32,
        channels: u32,
    ) -> Result<(), AcquireError>;
}
