//! Configuration used by the block transfer state machines.

use std::num::{NonZeroU16, NonZeroUsize};

/// Largest block size the protocol permits in either direction.
///
/// Peers may negotiate a smaller size; a larger declared size is always
/// rejected.
pub const MAX_BLOCK_SIZE: u16 = 1024;

const DEFAULT_MAX_TRANSFER: usize = 256 * 1024;

/// Settings that bound fragment sizes and reassembly resource usage.
#[derive(Clone, Copy, Debug)]
pub struct BlockwiseConfig {
    /// Largest accepted/served block payload in bytes, at most
    /// [`MAX_BLOCK_SIZE`].
    pub max_block_size: NonZeroU16,
    /// Hard cap on a fully reassembled block-1 transfer. Transfers that
    /// would grow past this are aborted with 4.13.
    pub max_transfer_size: NonZeroUsize,
}

impl BlockwiseConfig {
    /// Configuration with a custom block size, clamped to
    /// [`MAX_BLOCK_SIZE`].
    #[must_use]
    pub fn with_block_size(max_block_size: NonZeroU16) -> Self {
        let clamped = max_block_size.min(
            NonZeroU16::new(MAX_BLOCK_SIZE).unwrap_or(NonZeroU16::MIN),
        );
        Self {
            max_block_size: clamped,
            ..Self::default()
        }
    }

    /// Block size as a `usize` for offset arithmetic.
    #[must_use]
    pub const fn block_size(&self) -> usize { self.max_block_size.get() as usize }
}

impl Default for BlockwiseConfig {
    fn default() -> Self {
        Self {
            max_block_size: NonZeroU16::new(MAX_BLOCK_SIZE).unwrap_or(NonZeroU16::MIN),
            max_transfer_size: NonZeroUsize::new(DEFAULT_MAX_TRANSFER)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}
