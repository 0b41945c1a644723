//! Block-1 receive reassembly.
//!
//! [`Block1Reassembly`] accumulates the fragments of one inbound block-1
//! transfer for a single peer. Fragments are accepted strictly in block
//! order; retransmissions are detected by comparing message ids and never
//! mutate state or trigger notifications. The buffer grows with the
//! transfer and is bounded by [`BlockwiseConfig::max_transfer_size`];
//! transfers that would exceed the cap are aborted as 4.13.

use log::{debug, warn};

use super::error::ReassemblyError;
use crate::{
    coap::{BlockOption, Message, MessageId, MessageType},
    config::BlockwiseConfig,
    notifier::StreamNotifier,
};

/// Result of feeding one fragment into [`Block1Reassembly::handle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReassemblyOutcome {
    /// Fragment stored, more expected; acknowledge with 2.31 Continue
    /// echoing the block-1 header.
    Accepted,
    /// Final fragment stored; the whole transfer is handed back and the
    /// peer state is gone. The caller builds the final response from it.
    Complete(Vec<u8>),
    /// Retransmission of an already accepted fragment; re-acknowledge per
    /// the incoming more flag (2.31 while in progress, 2.04 for the final
    /// block) without touching state.
    Duplicate {
        /// More flag of the retransmitted fragment.
        more: bool,
    },
    /// The message was an acknowledgement of a device-initiated push
    /// fragment; progress was reported through the notifier and the
    /// response is produced asynchronously by the application.
    PushAck,
}

/// In-flight block-1 receive state for one peer.
///
/// Exists only while a transfer is in progress: created on the first
/// fragment, consumed on completion, dropped on error or reset. A peer has
/// at most one live instance.
#[derive(Debug)]
pub struct Block1Reassembly {
    buffer: Vec<u8>,
    last_block_number: u32,
    last_block_size: u16,
    last_mid: MessageId,
}

impl Block1Reassembly {
    fn new(config: &BlockwiseConfig) -> Self {
        Self {
            buffer: Vec::with_capacity(config.block_size()),
            last_block_number: 0,
            last_block_size: 0,
            last_mid: MessageId::UNSET,
        }
    }

    /// Bytes accumulated so far.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffer.len() }

    /// Block number of the last accepted fragment.
    #[must_use]
    pub const fn last_block_number(&self) -> u32 { self.last_block_number }

    /// Block size of the last accepted fragment.
    #[must_use]
    pub const fn last_block_size(&self) -> u16 { self.last_block_size }

    /// Drop any in-flight state. Safe to call on an empty slot.
    pub fn teardown(slot: &mut Option<Self>) { *slot = None; }

    /// Feed one incoming message carrying `block` into the peer's slot.
    ///
    /// Acknowledgement-typed messages are a pass-through for the
    /// device-push flow and report TX progress instead of touching receive
    /// state. Request fragments are validated, deduplicated and appended.
    ///
    /// Exactly one notifier call fires per transition: `rx_progress` on an
    /// accepted non-final fragment, `rx_complete` on the final one,
    /// `rx_error` on every hard failure. Duplicates notify nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the fragment violates size or
    /// ordering invariants; the slot is always empty afterwards.
    pub fn handle(
        slot: &mut Option<Self>,
        config: &BlockwiseConfig,
        message: &Message,
        block: BlockOption,
        notifier: &mut dyn StreamNotifier,
    ) -> Result<ReassemblyOutcome, ReassemblyError> {
        if message.message_type() == MessageType::Acknowledgement {
            // Ack for a block-1 push initiated from this device.
            if block.more {
                notifier.tx_progress(message);
            } else {
                notifier.tx_complete(message);
            }
            return Ok(ReassemblyOutcome::PushAck);
        }

        if block.size > config.max_block_size.get() {
            warn!(
                "block-1 fragment declares size {} above maximum {}",
                block.size,
                config.max_block_size
            );
            notifier.rx_error(message);
            Self::teardown(slot);
            return Err(ReassemblyError::BlockTooLarge {
                size: block.size,
                max: config.max_block_size.get(),
            });
        }

        if block.number == 0 {
            match slot.as_mut() {
                Some(state) if message.mid().is_newer_than(state.last_mid) => {
                    // Genuine new transfer from the same peer; reuse the
                    // allocation but discard the stale content.
                    debug!("block-1 restart at mid {}", message.mid());
                    state.buffer.clear();
                }
                Some(_) => {
                    debug!("retransmitted block 0 discarded, mid {}", message.mid());
                    return Ok(ReassemblyOutcome::Duplicate { more: block.more });
                }
                None => *slot = Some(Self::new(config)),
            }
        } else {
            match slot.as_mut() {
                None => {
                    warn!("block-1 continuation {} without start", block.number);
                    notifier.rx_error(message);
                    return Err(ReassemblyError::MissingStart { number: block.number });
                }
                Some(state) if message.mid().is_newer_than(state.last_mid) => {
                    let expected = block.offset();
                    let buffered = state.buffer.len();
                    if buffered != expected {
                        warn!(
                            "block-1 gap: buffered {buffered} bytes, block {} implies {expected}",
                            block.number
                        );
                        notifier.rx_error(message);
                        Self::teardown(slot);
                        return Err(ReassemblyError::OffsetMismatch { expected, buffered });
                    }
                }
                Some(_) => {
                    debug!("retransmitted block {} discarded, mid {}", block.number, message.mid());
                    return Ok(ReassemblyOutcome::Duplicate { more: block.more });
                }
            }
        }

        let buffered = slot.as_ref().map_or(0, |state| state.buffer.len());
        let attempted = buffered.saturating_add(message.payload().len());
        if attempted > config.max_transfer_size.get() {
            warn!("block-1 transfer of {attempted} bytes exceeds cap");
            notifier.rx_error(message);
            Self::teardown(slot);
            return Err(ReassemblyError::TransferTooLarge {
                attempted,
                limit: config.max_transfer_size,
            });
        }

        let Some(state) = slot.as_mut() else {
            // Block 0 inserted above; continuations verified presence.
            return Err(ReassemblyError::MissingStart { number: block.number });
        };
        state.buffer.extend_from_slice(message.payload());
        state.last_block_number = block.number;
        state.last_block_size = block.size;
        state.last_mid = message.mid();

        if block.more {
            notifier.rx_progress(message);
            Ok(ReassemblyOutcome::Accepted)
        } else {
            let buffer = slot.take().map(|state| state.buffer).unwrap_or_default();
            debug!("block-1 transfer complete, {} bytes", buffer.len());
            notifier.rx_complete(message, &buffer);
            Ok(ReassemblyOutcome::Complete(buffer))
        }
    }
}
