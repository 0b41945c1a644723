//! Coarse classification of incoming messages.

use crate::coap::{Code, Message, MessageType};

/// What an incoming message is, decided once before any state is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageClass {
    /// A request (GET, POST, PUT or DELETE), block-wise or not.
    DataRequest,
    /// An acknowledgement carrying 2.31 Continue and a BLOCK1 option: the
    /// peer accepted a pushed fragment and wants the next one.
    BlockContinuationAck,
    /// Any other acknowledgement, bare or piggybacking a response.
    PlainAck,
    /// A reset; the peer rejected a message outright.
    Reset,
    /// A standalone response (confirmable or non-confirmable).
    Response,
}

/// Classify `message` by type, code and block options.
#[must_use]
pub fn classify(message: &Message) -> MessageClass {
    if message.message_type() == MessageType::Reset {
        return MessageClass::Reset;
    }
    if message.code().is_request() {
        return MessageClass::DataRequest;
    }
    if message.message_type() == MessageType::Acknowledgement {
        if message.block1().is_some() && message.code() == Code::Continue {
            return MessageClass::BlockContinuationAck;
        }
        return MessageClass::PlainAck;
    }
    MessageClass::Response
}
