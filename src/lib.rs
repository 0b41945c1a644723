//! Public API for the `blockwise` library.
//!
//! This crate provides the CoAP block-wise transfer core for a constrained
//! LwM2M device: block-1 receive reassembly, block-2 transmit segmentation,
//! and the packet-level dispatch that routes incoming messages to either
//! state machine or to the generic request handler. Wire parsing and the
//! transport itself are external collaborators; the crate consumes and
//! produces parsed [`coap::Message`] values.

pub mod block;
pub mod coap;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod notifier;
pub mod transaction;

pub use block::{
    Block1Reassembly,
    Block2Segmentation,
    PushError,
    PushTransfer,
    ReassemblyError,
    ReassemblyOutcome,
    SegmentationError,
    SegmentationOutcome,
    StreamStatus,
};
pub use coap::{BlockOption, Code, Message, MessageId, MessageType};
pub use config::{BlockwiseConfig, MAX_BLOCK_SIZE};
pub use dispatch::{Dispatch, MessageClass, PeerId, TransferManager, classify};
pub use handler::{Chunk, HandlerReply, HandlerResponse, RequestHandler};
pub use notifier::{NullNotifier, StreamNotifier};
pub use transaction::{NullTransactions, Transactions};
