//! Block-2 transmit segmentation.
//!
//! [`Block2Segmentation`] is the single transmit context: it serves one
//! large response fragment by fragment as the peer pulls them with GET
//! requests carrying a BLOCK2 option. The full response of the last served
//! fragment is cached so retransmitted pulls are answered verbatim without
//! re-entering the application.
//!
//! Starting a new transfer implicitly cancels any other; there is no
//! per-peer keying.

use log::{debug, warn};

use super::error::SegmentationError;
use crate::{
    coap::{BlockOption, Code, Message, MessageId},
    config::BlockwiseConfig,
    notifier::StreamNotifier,
};

/// Position of a fragment within an outbound stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamStatus {
    /// First fragment of a new transfer.
    Start,
    /// Intermediate fragment.
    InProgress,
    /// Final fragment.
    End,
}

/// Result of servicing a pull request against the transmit context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentationOutcome {
    /// The pull was forwarded to the application via `tx_pull`; it will
    /// prepare the next fragment and respond out of band.
    Deferred,
    /// The pull was a retransmission; the cached response fragment is
    /// re-served verbatim.
    Reserve(Message),
    /// A role-reversed error reply was absorbed; the transfer is torn down
    /// and no reply is owed.
    Ignored,
}

/// Single in-flight block-2 transmit context.
#[derive(Debug)]
pub struct Block2Segmentation {
    saved: Message,
    block_number: u32,
    expected_request: u32,
    last_mid: MessageId,
}

impl Block2Segmentation {
    /// Block number of the last prepared fragment.
    #[must_use]
    pub const fn block_number(&self) -> u32 { self.block_number }

    /// Block number the next pull is expected to carry.
    #[must_use]
    pub const fn expected_request(&self) -> u32 { self.expected_request }

    /// Message id of the last serviced pull.
    #[must_use]
    pub const fn last_mid(&self) -> MessageId { self.last_mid }

    /// Whether the cached fragment was the final one of the stream. The
    /// context is kept around after `End` only to re-serve retransmitted
    /// pulls of that fragment.
    #[must_use]
    pub fn stream_ended(&self) -> bool {
        self.saved.block2().is_some_and(|block| !block.more)
    }

    /// Zero the transmit context. Safe to call on an empty slot.
    pub fn teardown(slot: &mut Option<Self>) { *slot = None; }

    /// Stamp `response` as the next outbound fragment and cache it.
    ///
    /// `Start` resets the context at block 0; `InProgress` and `End`
    /// advance the block counter by one. The BLOCK2 header is set from the
    /// counter (more flag clear only on `End`, size fixed to the configured
    /// block size) and the payload is truncated to one block. This is the
    /// only place the expected pull number advances.
    pub fn prepare(
        slot: &mut Option<Self>,
        config: &BlockwiseConfig,
        response: &mut Message,
        status: StreamStatus,
    ) {
        let (number, last_mid) = match (status, slot.as_ref()) {
            (StreamStatus::Start, _) => (0, MessageId::UNSET),
            (_, Some(state)) => (state.block_number.wrapping_add(1), state.last_mid),
            (_, None) => {
                warn!("block-2 fragment prepared without a started transfer");
                (0, MessageId::UNSET)
            }
        };

        let more = status != StreamStatus::End;
        response.set_block2(BlockOption::new(number, more, config.max_block_size.get()));
        if response.payload().len() > config.block_size() {
            let truncated = response.payload_bytes().slice(..config.block_size());
            response.set_payload(truncated);
        }
        debug!("block-2 prepared fragment {number}, more {more}");

        *slot = Some(Self {
            saved: response.clone(),
            block_number: number,
            expected_request: number.wrapping_add(1),
            last_mid,
        });
    }

    /// Service one pull request (or role-reversed error reply) against the
    /// context.
    ///
    /// Retransmitted pulls (message id not newer than the last serviced
    /// one) re-serve the cached fragment without advancing the counter or
    /// notifying anyone. A fresh pull for the expected block records the
    /// message id and emits exactly one `tx_pull` notification.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError`] on size mismatch, block sequencing
    /// violations or unexpected codes; the context is torn down first and
    /// one `tx_error` notification fires.
    pub fn service(
        slot: &mut Option<Self>,
        config: &BlockwiseConfig,
        message: &Message,
        block: BlockOption,
        notifier: &mut dyn StreamNotifier,
    ) -> Result<SegmentationOutcome, SegmentationError> {
        match message.code() {
            Code::RequestEntityIncomplete | Code::RequestEntityTooLarge => {
                // The peer rejected a transmitted fragment; fatal.
                Self::teardown(slot);
                notifier.tx_error(message);
                Ok(SegmentationOutcome::Ignored)
            }
            Code::Get => {
                if slot.is_none() {
                    return Err(SegmentationError::Inactive);
                }
                if block.size != config.max_block_size.get() {
                    warn!(
                        "unexpected block size {}, serving {}",
                        block.size,
                        config.max_block_size
                    );
                    notifier.tx_error(message);
                    Self::teardown(slot);
                    return Err(SegmentationError::SizeMismatch {
                        requested: block.size,
                        expected: config.max_block_size.get(),
                    });
                }

                let Some(state) = slot.as_mut() else {
                    return Err(SegmentationError::Inactive);
                };
                if !message.mid().is_newer_than(state.last_mid) {
                    debug!("retransmitted pull for block {}", block.number);
                    return Ok(SegmentationOutcome::Reserve(state.saved.clone()));
                }
                if block.number != state.expected_request {
                    let expected = state.expected_request;
                    warn!(
                        "unexpected block number {}, expected {expected}",
                        block.number
                    );
                    notifier.tx_error(message);
                    Self::teardown(slot);
                    return Err(SegmentationError::UnexpectedBlock {
                        requested: block.number,
                        expected,
                    });
                }

                state.last_mid = message.mid();
                notifier.tx_pull(message);
                Ok(SegmentationOutcome::Deferred)
            }
            code => {
                warn!("unexpected message code {code} on block-2 path");
                notifier.tx_error(message);
                Self::teardown(slot);
                Err(SegmentationError::UnexpectedCode { code })
            }
        }
    }
}
