//! Packet-level dispatch driving the block transfer state machines.
//!
//! [`TransferManager`] owns every piece of block transfer state: one
//! receive slot per peer, the single transmit segmentation context and the
//! single outbound push. [`TransferManager::handle`] routes one parsed
//! message through classification, the appropriate state machine and the
//! [`RequestHandler`] collaborator, and says explicitly whether a reply
//! goes out now, later, or not at all.
//!
//! Processing is synchronous and run to completion; the manager holds no
//! locks and runs no timers.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use derive_more::{Display, From};
use log::{debug, warn};

use crate::{
    block::{
        Block1Reassembly, Block2Segmentation, PushError, PushTransfer, ReassemblyOutcome,
        SegmentationOutcome, StreamStatus,
    },
    coap::{BlockOption, Code, Message, MessageId, MessageType},
    config::BlockwiseConfig,
    handler::{HandlerReply, HandlerResponse, RequestHandler},
    notifier::StreamNotifier,
    transaction::Transactions,
};

mod classify;

pub use classify::{MessageClass, classify};


/// Opaque identifier for a remote endpoint, assigned by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From)]
#[display("{_0}")]
pub struct PeerId(u64);

impl PeerId {
    /// Create a peer identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    /// Return the inner identifier.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

/// What the caller owes the peer after one message was processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Send this message now.
    Respond(Message),
    /// A response is owed but the application produces it out of band.
    Deferred,
    /// Nothing to send.
    Silent,
}

/// Owner of all block transfer state and the single packet entry point.
#[derive(Debug)]
pub struct TransferManager {
    config: BlockwiseConfig,
    reassembly: HashMap<PeerId, Block1Reassembly>,
    segmentation: Option<Block2Segmentation>,
    push: Option<PushTransfer>,
    next_mid: u16,
}

impl Default for TransferManager {
    fn default() -> Self { Self::new(BlockwiseConfig::default()) }
}

impl TransferManager {
    /// Create a manager with the given configuration.
    #[must_use]
    pub fn new(config: BlockwiseConfig) -> Self {
        Self {
            config,
            reassembly: HashMap::new(),
            segmentation: None,
            push: None,
            next_mid: 0,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &BlockwiseConfig { &self.config }

    /// Whether a block-2 transmit context is active.
    #[must_use]
    pub const fn segmentation_active(&self) -> bool { self.segmentation.is_some() }

    /// Whether a device-initiated push is in flight.
    #[must_use]
    pub const fn push_active(&self) -> bool { self.push.is_some() }

    /// Drop every piece of state held for `peer`.
    pub fn reset_peer(&mut self, peer: PeerId) {
        if self.reassembly.remove(&peer).is_some() {
            debug!("dropped receive state for peer {peer}");
        }
    }

    /// Next message id for a locally originated message, never zero.
    fn fresh_mid(&mut self) -> MessageId {
        self.next_mid = self.next_mid.wrapping_add(1);
        if self.next_mid == 0 {
            self.next_mid = 1;
        }
        MessageId::new(self.next_mid)
    }

    /// Route one incoming message and return what the caller should send.
    ///
    /// `handler` resolves fully assembled requests, `transactions` matches
    /// responses against outstanding confirmable exchanges, and `notifier`
    /// receives the stream lifecycle callbacks.
    pub fn handle(
        &mut self,
        peer: PeerId,
        message: &Message,
        handler: &mut dyn RequestHandler,
        transactions: &mut dyn Transactions,
        notifier: &mut dyn StreamNotifier,
    ) -> Dispatch {
        match classify(message) {
            MessageClass::DataRequest => self.handle_request(peer, message, handler, notifier),
            MessageClass::BlockContinuationAck => {
                self.handle_continuation(peer, message, transactions, notifier)
            }
            MessageClass::PlainAck => self.handle_plain_ack(message, transactions, notifier),
            MessageClass::Reset => {
                transactions.take_response(message);
                Dispatch::Silent
            }
            MessageClass::Response => {
                if transactions.take_response(message) {
                    Dispatch::Silent
                } else if message.message_type() == MessageType::Confirmable {
                    // Unsolicited confirmable responses still get acked so
                    // the peer stops retransmitting.
                    Dispatch::Respond(Message::ack(Code::Empty, message.mid()))
                } else {
                    Dispatch::Silent
                }
            }
        }
    }

    fn handle_request(
        &mut self,
        peer: PeerId,
        message: &Message,
        handler: &mut dyn RequestHandler,
        notifier: &mut dyn StreamNotifier,
    ) -> Dispatch {
        let mut reply = Message::reply_shell(message, self.fresh_mid());
        let window = message
            .block2()
            .map(|block| block.clamped(self.config.max_block_size.get()));

        // Continuation pulls against an active transmit context never reach
        // the handler; the context either re-serves or defers, and must see
        // the size the peer declared, not the clamped window. A fresh pull
        // after the final fragment means the stream is over; the context is
        // dropped and the request handled like any other.
        if message.code() == Code::Get
            && let Some(block) = message.block2()
            && block.number != 0
            && let Some(state) = self.segmentation.as_ref()
        {
            if state.stream_ended() && message.mid().is_newer_than(state.last_mid()) {
                debug!("block-2 stream finished, dropping transmit context");
                Block2Segmentation::teardown(&mut self.segmentation);
            } else {
                return self.service_pull(message, block, reply, notifier);
            }
        }

        let mut assembled = None;
        if let Some(block1) = message.block1() {
            let mut slot = self.reassembly.remove(&peer);
            let result =
                Block1Reassembly::handle(&mut slot, &self.config, message, block1, notifier);
            if let Some(state) = slot {
                self.reassembly.insert(peer, state);
            }
            match result {
                Ok(ReassemblyOutcome::Accepted) => {
                    reply.set_code(Code::Continue);
                    reply.set_block1(block1);
                    return Dispatch::Respond(reply);
                }
                Ok(ReassemblyOutcome::Duplicate { more }) => {
                    reply.set_code(if more { Code::Continue } else { Code::Changed });
                    reply.set_block1(block1);
                    return Dispatch::Respond(reply);
                }
                Ok(ReassemblyOutcome::PushAck) => return Dispatch::Deferred,
                Ok(ReassemblyOutcome::Complete(buffer)) => assembled = Some(buffer),
                Err(error) => {
                    return Dispatch::Respond(Self::error_reply(reply, error.code(), &error));
                }
            }
        }

        let whole;
        let request = if let Some(buffer) = assembled {
            let mut assembled_request = message.clone();
            assembled_request.set_payload(Bytes::from(buffer));
            whole = assembled_request;
            &whole
        } else {
            message
        };

        match handler.handle(request) {
            HandlerReply::Deferred => Dispatch::Deferred,
            HandlerReply::Ignore => Dispatch::Silent,
            HandlerReply::Respond(response) => {
                self.build_response(reply, window, response)
            }
        }
    }

    /// Service a continuation GET against the transmit context.
    fn service_pull(
        &mut self,
        message: &Message,
        window: BlockOption,
        reply: Message,
        notifier: &mut dyn StreamNotifier,
    ) -> Dispatch {
        match Block2Segmentation::service(
            &mut self.segmentation,
            &self.config,
            message,
            window,
            notifier,
        ) {
            Ok(SegmentationOutcome::Deferred) => Dispatch::Deferred,
            Ok(SegmentationOutcome::Reserve(cached)) => {
                Dispatch::Respond(Self::reserve(&cached, reply))
            }
            Ok(SegmentationOutcome::Ignored) => Dispatch::Silent,
            Err(error) => Dispatch::Respond(Self::error_reply(reply, error.code(), &error)),
        }
    }

    /// Rebuild a cached fragment on top of a fresh reply shell so the
    /// retransmitted request's message id is the one mirrored.
    fn reserve(cached: &Message, mut reply: Message) -> Message {
        reply.set_code(cached.code());
        reply.set_payload(cached.payload_bytes().clone());
        if let Some(content_type) = cached.content_type() {
            reply.set_content_type(content_type);
        }
        if let Some(block) = cached.block2() {
            reply.set_block2(block);
        }
        reply
    }

    /// Turn a handler response into the wire reply, slicing the payload
    /// into block-2 fragments where needed.
    fn build_response(
        &mut self,
        mut reply: Message,
        window: Option<BlockOption>,
        response: HandlerResponse,
    ) -> Dispatch {
        reply.set_code(response.code);
        if let Some(content_type) = response.content_type {
            reply.set_content_type(content_type);
        }

        let block_size = self.config.block_size();
        let payload = response.payload;

        if let Some(window) = window {
            let size = usize::from(window.size);
            if let Some(chunk) = response.chunk {
                // Block-aware resource: the payload already is one chunk.
                // It may still exceed the window, hence the second clause.
                let more = chunk.next_offset.is_some() || payload.len() > size;
                reply.set_block2(BlockOption::new(window.number, more, window.size));
                reply.set_payload(payload.slice(..payload.len().min(size)));
            } else {
                let offset = window.offset();
                if offset >= payload.len() {
                    warn!(
                        "block {} at offset {offset} past payload of {} bytes",
                        window.number,
                        payload.len()
                    );
                    reply.set_code(Code::BadOption);
                    reply.clear_blocks();
                    reply.set_payload(Bytes::from_static(b"BlockOutOfScope"));
                    return Dispatch::Respond(reply);
                }
                let remaining = payload.len() - offset;
                reply.set_block2(BlockOption::new(window.number, remaining > size, window.size));
                reply.set_payload(payload.slice(offset..offset + remaining.min(size)));
            }
        } else if response.chunk.is_some() || payload.len() > block_size {
            // Large response to a plain request: initiate block-2 at
            // block 0 ourselves.
            let more = response
                .chunk
                .is_some_and(|chunk| chunk.next_offset.is_some())
                || payload.len() > block_size;
            reply.set_block2(BlockOption::new(0, more, self.config.max_block_size.get()));
            reply.set_payload(payload.slice(..payload.len().min(block_size)));
        } else {
            reply.set_payload(payload);
        }
        Dispatch::Respond(reply)
    }

    /// Continue a device-initiated push after the peer acked a fragment.
    fn handle_continuation(
        &mut self,
        peer: PeerId,
        message: &Message,
        transactions: &mut dyn Transactions,
        notifier: &mut dyn StreamNotifier,
    ) -> Dispatch {
        transactions.take_response(message);
        let Some(acked) = message.block1() else {
            return Dispatch::Silent;
        };

        if self.push.is_some() {
            let mid = self.fresh_mid();
            let next = self
                .push
                .as_ref()
                .map(|push| push.next_fragment(acked, mid));
            return match next {
                Some(Ok(fragment)) => {
                    notifier.tx_progress(message);
                    Dispatch::Respond(fragment)
                }
                Some(Err(error)) => {
                    warn!("push continuation failed: {error}");
                    PushTransfer::teardown(&mut self.push);
                    notifier.tx_error(message);
                    let mut rejection =
                        Message::new(MessageType::Confirmable, error.code(), mid);
                    rejection.set_payload(Bytes::from(error.to_string()));
                    Dispatch::Respond(rejection)
                }
                None => Dispatch::Silent,
            };
        }

        // No push of our own in flight: the stream is application managed,
        // so only report progress through the notifier.
        let mut slot = self.reassembly.remove(&peer);
        let result = Block1Reassembly::handle(&mut slot, &self.config, message, acked, notifier);
        if let Some(state) = slot {
            self.reassembly.insert(peer, state);
        }
        match result {
            Ok(ReassemblyOutcome::PushAck) => Dispatch::Deferred,
            _ => Dispatch::Silent,
        }
    }

    fn handle_plain_ack(
        &mut self,
        message: &Message,
        transactions: &mut dyn Transactions,
        notifier: &mut dyn StreamNotifier,
    ) -> Dispatch {
        match message.code() {
            Code::RequestEntityIncomplete | Code::RequestEntityTooLarge => {
                // The rejected fragment was a confirmable transaction of
                // ours; the transaction layer sees the ack either way.
                transactions.take_response(message);
                if self.segmentation.is_some() {
                    let block = message
                        .block2()
                        .unwrap_or(BlockOption::new(0, false, self.config.max_block_size.get()));
                    let _ = Block2Segmentation::service(
                        &mut self.segmentation,
                        &self.config,
                        message,
                        block,
                        notifier,
                    );
                } else if self.push.is_some() {
                    PushTransfer::teardown(&mut self.push);
                    notifier.tx_error(message);
                }
                Dispatch::Silent
            }
            Code::Changed if self.push.is_some() => {
                // Final fragment of the push was accepted.
                PushTransfer::teardown(&mut self.push);
                notifier.tx_complete(message);
                transactions.take_response(message);
                Dispatch::Silent
            }
            _ => {
                transactions.take_response(message);
                Dispatch::Silent
            }
        }
    }

    /// Begin pushing `payload` to the peer; returns the first message to
    /// send as a confirmable request.
    ///
    /// # Errors
    ///
    /// Returns [`PushError`] when the payload is empty or a push is
    /// already in flight.
    pub fn start_push(
        &mut self,
        payload: Bytes,
        content_type: Option<u16>,
    ) -> Result<Message, PushError> {
        let mid = self.fresh_mid();
        PushTransfer::start(&mut self.push, &self.config, payload, content_type, mid)
    }

    /// Abandon any in-flight push.
    pub fn end_push(&mut self) { PushTransfer::teardown(&mut self.push); }

    /// Stamp `response` as the next block-2 fragment of the outbound
    /// stream. Called by the application after a `tx_pull` notification
    /// (or to open the stream with [`StreamStatus::Start`]).
    pub fn prepare_fragment(&mut self, response: &mut Message, status: StreamStatus) {
        Block2Segmentation::prepare(&mut self.segmentation, &self.config, response, status);
    }

    /// Drop the block-2 transmit context.
    pub fn end_stream(&mut self) { Block2Segmentation::teardown(&mut self.segmentation); }

    fn error_reply(mut reply: Message, code: Code, error: &dyn fmt::Display) -> Message {
        reply.set_code(code);
        reply.clear_blocks();
        reply.set_payload(Bytes::from(error.to_string()));
        reply
    }
}
