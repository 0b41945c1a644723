//! Stream lifecycle notifications delivered to the owning application.
//!
//! [`StreamNotifier`] is the external collaborator informed of every block
//! transfer transition: receive progress and completion, transmit pulls and
//! push acknowledgements, and errors in either direction. All methods have
//! no-op defaults so implementations only override what they react to.
//!
//! Calls are synchronous and happen at most once per transition; duplicate
//! retransmissions are filtered out before any notification fires.

use crate::coap::Message;

/// Callbacks invoked on block transfer lifecycle transitions.
pub trait StreamNotifier {
    /// A block-1 fragment was accepted and more are expected.
    fn rx_progress(&mut self, _message: &Message) {}

    /// The final block-1 fragment arrived; `payload` is the fully
    /// reassembled transfer.
    fn rx_complete(&mut self, _message: &Message, _payload: &[u8]) {}

    /// Reassembly failed; the receive state has been torn down.
    fn rx_error(&mut self, _message: &Message) {}

    /// The peer requested the next block-2 fragment. The application is
    /// expected to prepare the fragment (via
    /// [`TransferManager::prepare_fragment`](crate::dispatch::TransferManager::prepare_fragment))
    /// and send its response out of band.
    fn tx_pull(&mut self, _message: &Message) {}

    /// The peer acknowledged a pushed block-1 fragment mid-stream.
    fn tx_progress(&mut self, _message: &Message) {}

    /// The peer acknowledged the final pushed fragment.
    fn tx_complete(&mut self, _message: &Message) {}

    /// Segmentation or push failed; the transmit context has been torn
    /// down.
    fn tx_error(&mut self, _message: &Message) {}
}

/// Notifier that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl StreamNotifier for NullNotifier {}
