//! Log capture checks for the block transfer state machines.

use std::sync::{Mutex, MutexGuard, OnceLock};

use bytes::Bytes;
use blockwise::{
    Block1Reassembly, BlockOption, BlockwiseConfig, Code, Message, MessageId, MessageType,
    NullNotifier,
};
use logtest::Logger;

/// Handle to the global logger with exclusive access, serialising tests
/// that capture log output.
struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let guard = logger.lock().expect("logger poisoned");
        Self { guard }
    }

    fn drain(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Some(record) = self.guard.pop() {
            messages.push(record.args().to_owned());
        }
        messages
    }
}

fn stray_fragment(mid: u16, number: u32) -> (Message, BlockOption) {
    let block = BlockOption::new(number, true, 1024);
    let mut message = Message::new(MessageType::Confirmable, Code::Put, MessageId::new(mid));
    message.set_block1(block);
    message.set_payload(Bytes::from(vec![0; 1024]));
    (message, block)
}

#[test]
fn rejected_continuation_is_logged() {
    let mut logger = LoggerHandle::new();
    logger.drain();

    let config = BlockwiseConfig::default();
    let mut slot = None;
    let (message, block) = stray_fragment(30, 2);
    Block1Reassembly::handle(&mut slot, &config, &message, block, &mut NullNotifier)
        .expect_err("continuation without state is rejected");

    let messages = logger.drain();
    assert!(
        messages.iter().any(|m| m.contains("without start")),
        "expected a warning about the missing start, got {messages:?}"
    );
}
