use derive_more::Display;

/// Decoded BLOCK1/BLOCK2 option: block number, more flag and block size.
///
/// The option is agnostic of direction; whether it describes an upload
/// fragment (block-1) or a pulled response fragment (block-2) depends on
/// which field of the [`Message`](crate::coap::Message) carries it.
///
/// # Examples
///
/// ```
/// use blockwise::coap::BlockOption;
/// let block = BlockOption::new(3, false, 1024);
/// assert_eq!(block.offset(), 3072);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[display("{number}/{more}/{size}")]
pub struct BlockOption {
    /// Zero-based block number.
    pub number: u32,
    /// Whether further blocks follow this one.
    pub more: bool,
    /// Block size in bytes.
    pub size: u16,
}

impl BlockOption {
    /// Create a new block option.
    #[must_use]
    pub const fn new(number: u32, more: bool, size: u16) -> Self { Self { number, more, size } }

    /// Byte offset of this block within the full payload.
    #[must_use]
    pub fn offset(self) -> usize {
        usize::try_from(self.number)
            .unwrap_or(usize::MAX)
            .saturating_mul(usize::from(self.size))
    }

    /// Copy of this option with the size clamped to `max` bytes.
    #[must_use]
    pub fn clamped(self, max: u16) -> Self {
        Self {
            size: self.size.min(max),
            ..self
        }
    }
}
