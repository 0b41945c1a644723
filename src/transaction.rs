//! Outstanding-transaction matching collaborator.

use crate::coap::Message;

/// Matches responses and acknowledgements against outstanding confirmable
/// transactions. Retransmission timers and the transaction store itself are
/// external; the dispatcher only needs to know whether a message was
/// consumed.
pub trait Transactions {
    /// Offer `message` to the transaction layer. Returns `true` when the
    /// message matched (and completed) an outstanding transaction.
    fn take_response(&mut self, message: &Message) -> bool;
}

/// Transaction layer that matches nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransactions;

impl Transactions for NullTransactions {
    fn take_response(&mut self, _message: &Message) -> bool { false }
}
