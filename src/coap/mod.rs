//! Parsed CoAP message model consumed by the block transfer core.
//!
//! Wire parsing and serialisation live outside this crate; the collaborators
//! that perform them exchange the types defined here. Each sub-module covers
//! a single concept so the dispatch and block state machines can stay free
//! of encoding detail.

pub mod code;
pub mod id;
pub mod message;
pub mod option;

pub use code::Code;
pub use id::MessageId;
pub use message::{Message, MessageType};
pub use option::BlockOption;
