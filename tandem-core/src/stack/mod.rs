//! Stack watermarking
//!
//! The stack region is painted with a known word before tasks run. The
//! stack grows downwards, so the lowest words are the last to be touched:
//!
//! ```text
//!   low addr                                             high addr
//!   [ canary band | painted (unused) ... | used by tasks/ISRs ]
//!     word 0                                 ◄── growth
//! ```
//!
//! Headroom is the run of painted words counted from the bottom. A canary
//! word that no longer holds the paint means the stack ran past its budget.

/// Word written over the whole region before scheduling starts
pub const STACK_PAINT: u32 = 0xA5A5_A5A5;

/// Number of words at the bottom of the region treated as canary
pub const CANARY_WORDS: usize = 4;

/// Read access to a stack region, lowest address first
pub trait StackRegion {
    /// Region length in 32-bit words
    fn len_words(&self) -> usize;

    /// Read the word at `index` (0 = lowest address)
    fn read_word(&self, index: usize) -> u32;
}

impl StackRegion for [u32] {
    fn len_words(&self) -> usize {
        self.len()
    }

    fn read_word(&self, index: usize) -> u32 {
        self[index]
    }
}

impl<const N: usize> StackRegion for [u32; N] {
    fn len_words(&self) -> usize {
        N
    }

    fn read_word(&self, index: usize) -> u32 {
        self[index]
    }
}

/// Paint a writable region
pub fn paint(region: &mut [u32]) {
    region.fill(STACK_PAINT);
}

/// Number of untouched words, counted up from the bottom
pub fn unused_words<R: StackRegion + ?Sized>(region: &R) -> usize {
    let len = region.len_words();
    (0..len)
        .find(|&i| region.read_word(i) != STACK_PAINT)
        .unwrap_or(len)
}

/// Untouched stack in bytes
pub fn headroom_bytes<R: StackRegion + ?Sized>(region: &R) -> u32 {
    u32::try_from(unused_words(region) * 4).unwrap_or(u32::MAX)
}

/// Check if any canary word was overwritten
pub fn overflowed<R: StackRegion + ?Sized>(region: &R) -> bool {
    let band = CANARY_WORDS.min(region.len_words());
    (0..band).any(|i| region.read_word(i) != STACK_PAINT)
}
