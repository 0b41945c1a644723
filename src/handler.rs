//! Generic request handling collaborator.
//!
//! The dispatcher hands every fully assembled request to a
//! [`RequestHandler`]; the LwM2M object model, URI routing and any external
//! application callback all live behind this trait.

use bytes::Bytes;

use crate::coap::{Code, Message};

/// Continuation marker for resources that provide their data chunk by
/// chunk instead of as one contiguous payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Offset of the chunk that follows this one, or `None` when this is
    /// the final chunk.
    pub next_offset: Option<u64>,
}

/// Status code and payload produced by a handled request.
#[derive(Clone, Debug)]
pub struct HandlerResponse {
    /// Response code.
    pub code: Code,
    /// Full response payload; the dispatcher slices it into block-2
    /// fragments when it exceeds one block.
    pub payload: Bytes,
    /// Content type of the payload, when one applies.
    pub content_type: Option<u16>,
    /// Set when the resource is itself block-aware and `payload` is a
    /// single chunk rather than the whole representation.
    pub chunk: Option<Chunk>,
}

impl HandlerResponse {
    /// Response with a code and no payload.
    #[must_use]
    pub const fn empty(code: Code) -> Self {
        Self {
            code,
            payload: Bytes::new(),
            content_type: None,
            chunk: None,
        }
    }

    /// Response with a code and payload.
    #[must_use]
    pub const fn with_payload(code: Code, payload: Bytes) -> Self {
        Self {
            code,
            payload,
            content_type: None,
            chunk: None,
        }
    }
}

/// Outcome of handing a request to the application.
#[derive(Clone, Debug)]
pub enum HandlerReply {
    /// Respond immediately with the given status and payload.
    Respond(HandlerResponse),
    /// The application will construct and send the response later.
    Deferred,
    /// No response is warranted.
    Ignore,
}

/// Resolves a decoded request to a status and payload.
pub trait RequestHandler {
    /// Handle `request`, whose payload is fully reassembled when it arrived
    /// block-wise.
    fn handle(&mut self, request: &Message) -> HandlerReply;
}
