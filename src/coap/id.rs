use derive_more::{Display, From};

/// Transport-level CoAP message identifier.
///
/// Within a block transfer the peer's message ids are assumed monotonically
/// increasing, which makes the id the sole retransmission detector: a
/// fragment whose id does not exceed the last accepted one is a duplicate.
/// The zero id is reserved to mean "none recorded yet".
///
/// # Examples
///
/// ```
/// use blockwise::coap::MessageId;
/// let newer = MessageId::new(124);
/// assert!(newer.is_newer_than(MessageId::new(123)));
/// assert!(!MessageId::UNSET.is_newer_than(MessageId::new(123)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, From)]
#[display("{_0}")]
pub struct MessageId(u16);

impl MessageId {
    /// Sentinel meaning no message id has been recorded.
    pub const UNSET: Self = Self(0);

    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Whether this id supersedes `other` under the monotonic-id rule.
    ///
    /// The zero id never supersedes anything, so an unset id cannot be
    /// mistaken for fresh traffic.
    #[must_use]
    pub const fn is_newer_than(self, other: Self) -> bool { self.0 > other.0 && self.0 != 0 }
}
