//! Error types emitted by the block transfer state machines.
//!
//! Every hard failure tears down the state it belongs to before the error
//! is returned, and each error knows the CoAP code it maps to so the
//! dispatcher can surface wire-compatible replies.

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::coap::Code;

/// Errors produced by block-1 receive reassembly.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The fragment declared a block size above the configured maximum.
    #[error("block size {size} exceeds maximum {max}")]
    BlockTooLarge {
        /// Declared block size.
        size: u16,
        /// Configured maximum.
        max: u16,
    },
    /// A continuation fragment arrived with no transfer in progress.
    #[error("continuation block {number} without a started transfer")]
    MissingStart {
        /// Block number of the stray fragment.
        number: u32,
    },
    /// The accumulated length does not match the offset the fragment
    /// implies, so at least one block was lost or reordered.
    #[error("buffered {buffered} bytes but block implies offset {expected}")]
    OffsetMismatch {
        /// Offset implied by block number and size.
        expected: usize,
        /// Bytes actually buffered.
        buffered: usize,
    },
    /// The transfer would grow past the configured cap.
    #[error("transfer of {attempted} bytes exceeds cap of {limit}")]
    TransferTooLarge {
        /// Total bytes the transfer would reach.
        attempted: usize,
        /// Configured cap.
        limit: NonZeroUsize,
    },
}

impl ReassemblyError {
    /// CoAP code this failure is reported as.
    #[must_use]
    pub const fn code(&self) -> Code {
        match self {
            Self::BlockTooLarge { .. } | Self::TransferTooLarge { .. } => {
                Code::RequestEntityTooLarge
            }
            Self::MissingStart { .. } | Self::OffsetMismatch { .. } => {
                Code::RequestEntityIncomplete
            }
        }
    }
}

/// Errors produced by block-2 transmit segmentation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SegmentationError {
    /// No transmit context is active.
    #[error("no block-2 transfer in progress")]
    Inactive,
    /// The peer requested a block size other than the one being served.
    /// Size negotiation is not supported on this path.
    #[error("requested block size {requested}, serving {expected}")]
    SizeMismatch {
        /// Size the peer asked for.
        requested: u16,
        /// Size the context serves.
        expected: u16,
    },
    /// The peer skipped ahead or fell behind the expected block number.
    #[error("requested block {requested}, expected {expected}")]
    UnexpectedBlock {
        /// Block number the peer asked for.
        requested: u32,
        /// Block number the context expected.
        expected: u32,
    },
    /// A message with a code the transmit path cannot service.
    #[error("unexpected message code {code}")]
    UnexpectedCode {
        /// Offending code.
        code: Code,
    },
}

impl SegmentationError {
    /// CoAP code this failure is reported as. All segmentation failures are
    /// fatal to the transfer and surface as 5.00.
    #[must_use]
    pub const fn code(&self) -> Code { Code::InternalServerError }
}

/// Errors produced by the device-initiated block-1 push.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PushError {
    /// A push is already in flight; only one runs at a time.
    #[error("block transfer already in progress")]
    Busy,
    /// Push payloads must be non-empty.
    #[error("push payload is empty")]
    EmptyPayload,
    /// The acknowledged block implies an offset past the buffered payload.
    #[error("block offset {offset} out of scope, payload length is {length}")]
    OffsetOutOfRange {
        /// Offset the next fragment would start at.
        offset: usize,
        /// Buffered payload length.
        length: usize,
    },
}

impl PushError {
    /// CoAP code this failure is reported as.
    #[must_use]
    pub const fn code(&self) -> Code {
        match self {
            Self::Busy => Code::PreconditionFailed,
            Self::EmptyPayload => Code::BadRequest,
            Self::OffsetOutOfRange { .. } => Code::BadOption,
        }
    }
}
