//! Block-wise transfer state machines.
//!
//! This module holds the two directional state machines: block-1 receive
//! reassembly ([`Block1Reassembly`]) and block-2 transmit segmentation
//! ([`Block2Segmentation`]), plus the device-initiated block-1 upload
//! ([`PushTransfer`]). The dispatcher in [`crate::dispatch`] drives all
//! three from incoming packets.

pub mod error;
pub mod push;
pub mod reassembly;
pub mod segmentation;

pub use error::{PushError, ReassemblyError, SegmentationError};
pub use push::PushTransfer;
pub use reassembly::{Block1Reassembly, ReassemblyOutcome};
pub use segmentation::{Block2Segmentation, SegmentationOutcome, StreamStatus};
