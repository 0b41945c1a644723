//! Parsed CoAP message and reply-shell construction.

use bytes::Bytes;

use super::{BlockOption, Code, MessageId};

/// Transport-level message type from the CoAP header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    /// Reliable request; the peer expects an acknowledgement.
    Confirmable,
    /// Fire-and-forget request.
    NonConfirmable,
    /// Acknowledgement, possibly piggybacking a response.
    Acknowledgement,
    /// Reset; the peer rejected or cannot process a message.
    Reset,
}

/// A parsed CoAP message as handed over by the external codec.
///
/// Only the fields the block transfer core consumes are modelled; option
/// parsing and serialisation happen outside the crate. Payloads and tokens
/// are [`Bytes`] so fragment slices share the underlying buffer instead of
/// copying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    message_type: MessageType,
    code: Code,
    mid: MessageId,
    token: Bytes,
    content_type: Option<u16>,
    payload: Bytes,
    block1: Option<BlockOption>,
    block2: Option<BlockOption>,
    uri_path: Option<String>,
}

impl Message {
    /// Create a message with an empty token and payload.
    #[must_use]
    pub const fn new(message_type: MessageType, code: Code, mid: MessageId) -> Self {
        Self {
            message_type,
            code,
            mid,
            token: Bytes::new(),
            content_type: None,
            payload: Bytes::new(),
            block1: None,
            block2: None,
            uri_path: None,
        }
    }

    /// Shorthand for an acknowledgement mirroring `mid`.
    #[must_use]
    pub const fn ack(code: Code, mid: MessageId) -> Self {
        Self::new(MessageType::Acknowledgement, code, mid)
    }

    /// Build the reply shell for `request`: an ACK mirroring the request's
    /// message id when the request was confirmable, otherwise a
    /// non-confirmable reply carrying `fresh_mid`. The token is mirrored in
    /// both cases and the code starts at 2.05 Content.
    #[must_use]
    pub fn reply_shell(request: &Self, fresh_mid: MessageId) -> Self {
        let mut reply = if request.message_type == MessageType::Confirmable {
            Self::ack(Code::Content, request.mid)
        } else {
            Self::new(MessageType::NonConfirmable, Code::Content, fresh_mid)
        };
        reply.token = request.token.clone();
        reply
    }

    /// Transport-level message type.
    #[must_use]
    pub const fn message_type(&self) -> MessageType { self.message_type }

    /// Message code.
    #[must_use]
    pub const fn code(&self) -> Code { self.code }

    /// Replace the message code.
    pub fn set_code(&mut self, code: Code) { self.code = code; }

    /// Message id.
    #[must_use]
    pub const fn mid(&self) -> MessageId { self.mid }

    /// Request/response correlation token.
    #[must_use]
    pub fn token(&self) -> &[u8] { &self.token }

    /// Replace the token.
    pub fn set_token(&mut self, token: Bytes) { self.token = token; }

    /// Declared content type, when present.
    #[must_use]
    pub const fn content_type(&self) -> Option<u16> { self.content_type }

    /// Set the content type.
    pub fn set_content_type(&mut self, content_type: u16) {
        self.content_type = Some(content_type);
    }

    /// Message payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Payload as a shared buffer, for slicing without copying.
    #[must_use]
    pub const fn payload_bytes(&self) -> &Bytes { &self.payload }

    /// Replace the payload.
    pub fn set_payload(&mut self, payload: Bytes) { self.payload = payload; }

    /// BLOCK1 option, when present.
    #[must_use]
    pub const fn block1(&self) -> Option<BlockOption> { self.block1 }

    /// Set the BLOCK1 option.
    pub fn set_block1(&mut self, block: BlockOption) { self.block1 = Some(block); }

    /// BLOCK2 option, when present.
    #[must_use]
    pub const fn block2(&self) -> Option<BlockOption> { self.block2 }

    /// Set the BLOCK2 option.
    pub fn set_block2(&mut self, block: BlockOption) { self.block2 = Some(block); }

    /// Drop both block options (used when a reply degenerates to an error).
    pub fn clear_blocks(&mut self) {
        self.block1 = None;
        self.block2 = None;
    }

    /// URI path, when the codec decoded one.
    #[must_use]
    pub fn uri_path(&self) -> Option<&str> { self.uri_path.as_deref() }

    /// Set the URI path.
    pub fn set_uri_path(&mut self, path: impl Into<String>) { self.uri_path = Some(path.into()); }
}
