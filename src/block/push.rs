//! Device-initiated block-1 upload.
//!
//! [`PushTransfer`] drives the role-reversed flow where this device is the
//! one with a payload too large for a single message: the payload is sent
//! as confirmable block-1 fragments and the peer acknowledges each one
//! with 2.31 Continue until the final 2.04 Changed. Only one push runs at
//! a time.

use bytes::Bytes;
use log::debug;

use super::error::PushError;
use crate::{
    coap::{BlockOption, Code, Message, MessageId, MessageType},
    config::BlockwiseConfig,
};

/// In-flight device-initiated block-1 upload.
///
/// Holds the full payload; individual fragments are zero-copy slices of
/// it. Exists only while fragments remain outstanding, so a push that fits
/// in a single message never creates one.
#[derive(Debug)]
pub struct PushTransfer {
    buffer: Bytes,
    content_type: Option<u16>,
    first_mid: MessageId,
    block_size: u16,
}

impl PushTransfer {
    /// Message id of the first fragment, for correlating the transfer.
    #[must_use]
    pub const fn first_mid(&self) -> MessageId { self.first_mid }

    /// Total payload length of the transfer.
    #[must_use]
    pub fn total_len(&self) -> usize { self.buffer.len() }

    /// Drop any in-flight push. Safe to call on an empty slot.
    pub fn teardown(slot: &mut Option<Self>) { *slot = None; }

    /// Begin pushing `payload` and return the first message to send.
    ///
    /// When the payload fits in one block the returned message carries it
    /// whole, no block-1 option is set and no state is retained. Larger
    /// payloads get a block-1 header `0/1/size`, the first slice as
    /// payload, and the remainder parked in the slot until the peer
    /// acknowledges.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::EmptyPayload`] for an empty payload and
    /// [`PushError::Busy`] while another push is in flight.
    pub fn start(
        slot: &mut Option<Self>,
        config: &BlockwiseConfig,
        payload: Bytes,
        content_type: Option<u16>,
        mid: MessageId,
    ) -> Result<Message, PushError> {
        if payload.is_empty() {
            return Err(PushError::EmptyPayload);
        }
        if slot.is_some() {
            return Err(PushError::Busy);
        }

        let mut message = Message::new(MessageType::Confirmable, Code::Post, mid);
        if let Some(content_type) = content_type {
            message.set_content_type(content_type);
        }

        let block_size = config.max_block_size.get();
        if payload.len() > config.block_size() {
            debug!(
                "starting block-1 push of {} bytes in {block_size}-byte fragments",
                payload.len()
            );
            message.set_block1(BlockOption::new(0, true, block_size));
            message.set_payload(payload.slice(..config.block_size()));
            *slot = Some(Self {
                buffer: payload,
                content_type,
                first_mid: mid,
                block_size,
            });
        } else {
            message.set_payload(payload);
        }
        Ok(message)
    }

    /// Build the fragment that follows the block the peer just
    /// acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::OffsetOutOfRange`] when the acknowledged block
    /// implies an offset past the buffered payload, which means the peer
    /// and this device disagree on the transfer's shape.
    pub fn next_fragment(
        &self,
        acked: BlockOption,
        mid: MessageId,
    ) -> Result<Message, PushError> {
        let next = acked.number.wrapping_add(1);
        let offset = BlockOption::new(next, false, self.block_size).offset();
        if offset > self.buffer.len() {
            return Err(PushError::OffsetOutOfRange {
                offset,
                length: self.buffer.len(),
            });
        }

        let remaining = self.buffer.len() - offset;
        let chunk = remaining.min(usize::from(self.block_size));
        let more = remaining > usize::from(self.block_size);

        let mut message = Message::new(MessageType::Confirmable, Code::Post, mid);
        if let Some(content_type) = self.content_type {
            message.set_content_type(content_type);
        }
        message.set_block1(BlockOption::new(next, more, self.block_size));
        message.set_payload(self.buffer.slice(offset..offset + chunk));
        debug!("block-1 push fragment {next}, more {more}, {chunk} bytes");
        Ok(message)
    }
}
