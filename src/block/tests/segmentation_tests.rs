//! Tests for block-2 transmit segmentation and retransmission re-serving.

use bytes::Bytes;

use super::{RecordingNotifier, pull_request};
use crate::{
    block::{Block2Segmentation, SegmentationError, SegmentationOutcome, StreamStatus},
    coap::{Code, Message, MessageId, MessageType},
    config::BlockwiseConfig,
};

fn start_stream(slot: &mut Option<Block2Segmentation>, config: &BlockwiseConfig) -> Message {
    let mut response = Message::ack(Code::Content, MessageId::new(100));
    response.set_payload(Bytes::from(vec![0xAB; 4096]));
    Block2Segmentation::prepare(slot, config, &mut response, StreamStatus::Start);
    response
}

#[test]
fn start_stamps_block_zero_and_truncates() {
    let config = BlockwiseConfig::default();
    let mut slot = None;

    let response = start_stream(&mut slot, &config);

    let block = response.block2().expect("block-2 header set");
    assert_eq!((block.number, block.more, block.size), (0, true, 1024));
    assert_eq!(response.payload().len(), 1024);
    let state = slot.as_ref().expect("context created");
    assert_eq!(state.block_number(), 0);
    assert_eq!(state.expected_request(), 1);
}

#[test]
fn end_clears_the_more_flag() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    start_stream(&mut slot, &config);
    assert!(!slot.as_ref().expect("context created").stream_ended());

    let mut last = Message::ack(Code::Content, MessageId::new(101));
    last.set_payload(Bytes::from(vec![0xCD; 128]));
    Block2Segmentation::prepare(&mut slot, &config, &mut last, StreamStatus::End);

    let block = last.block2().expect("block-2 header set");
    assert_eq!((block.number, block.more), (1, false));
    assert_eq!(last.payload().len(), 128);
    assert!(slot.as_ref().expect("context kept for retransmissions").stream_ended());
}

#[test]
fn serviced_pull_advances_the_counter_once() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let mut notifier = RecordingNotifier::default();
    start_stream(&mut slot, &config);

    let (pull, block) = pull_request(200, 1, 1024);
    let outcome = Block2Segmentation::service(&mut slot, &config, &pull, block, &mut notifier)
        .expect("expected pull serviced");
    assert_eq!(outcome, SegmentationOutcome::Deferred);
    assert_eq!(notifier.tx_pull, 1);

    let mut next = Message::ack(Code::Content, MessageId::new(102));
    next.set_payload(Bytes::from(vec![0xAB; 4096]));
    Block2Segmentation::prepare(&mut slot, &config, &mut next, StreamStatus::InProgress);
    let state = slot.as_ref().expect("context alive");
    assert_eq!(state.block_number(), 1);
    assert_eq!(state.expected_request(), 2);
}

#[test]
fn retransmitted_pull_reserves_the_cached_fragment() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let mut notifier = RecordingNotifier::default();
    let cached = start_stream(&mut slot, &config);

    let (pull, block) = pull_request(200, 1, 1024);
    Block2Segmentation::service(&mut slot, &config, &pull, block, &mut notifier)
        .expect("first pull serviced");

    // The same message id again, any number of times, re-serves the cached
    // fragment without advancing or notifying.
    for _ in 0..3 {
        let outcome = Block2Segmentation::service(&mut slot, &config, &pull, block, &mut notifier)
            .expect("retransmission serviced");
        assert_eq!(outcome, SegmentationOutcome::Reserve(cached.clone()));
    }
    assert_eq!(notifier.tx_pull, 1, "retransmissions must not notify");
    let state = slot.as_ref().expect("context alive");
    assert_eq!(state.expected_request(), 1, "retransmissions must not advance");
}

#[test]
fn unsupported_block_size_tears_down() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let mut notifier = RecordingNotifier::default();
    start_stream(&mut slot, &config);

    let (pull, block) = pull_request(200, 1, 512);
    let err = Block2Segmentation::service(&mut slot, &config, &pull, block, &mut notifier)
        .expect_err("size renegotiation is not supported");
    assert_eq!(err, SegmentationError::SizeMismatch { requested: 512, expected: 1024 });
    assert_eq!(err.code(), Code::InternalServerError);
    assert_eq!(notifier.tx_error, 1);
    assert!(slot.is_none(), "failure must drop the transmit context");

    // A further pull finds no context; the stream needs a fresh start.
    let (retry, retry_block) = pull_request(201, 1, 1024);
    let err = Block2Segmentation::service(&mut slot, &config, &retry, retry_block, &mut notifier)
        .expect_err("torn-down stream cannot be pulled");
    assert_eq!(err, SegmentationError::Inactive);
}

#[test]
fn out_of_sequence_pull_tears_down() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let mut notifier = RecordingNotifier::default();
    start_stream(&mut slot, &config);

    let (pull, block) = pull_request(200, 3, 1024);
    let err = Block2Segmentation::service(&mut slot, &config, &pull, block, &mut notifier)
        .expect_err("skipped block must be rejected");
    assert_eq!(err, SegmentationError::UnexpectedBlock { requested: 3, expected: 1 });
    assert!(slot.is_none());
    assert_eq!(notifier.tx_error, 1);
}

#[test]
fn role_reversed_rejection_is_absorbed() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let mut notifier = RecordingNotifier::default();
    start_stream(&mut slot, &config);

    let rejection = Message::ack(Code::RequestEntityTooLarge, MessageId::new(300));
    let (_, block) = pull_request(300, 1, 1024);
    let outcome = Block2Segmentation::service(&mut slot, &config, &rejection, block, &mut notifier)
        .expect("rejection absorbed, not an error");
    assert_eq!(outcome, SegmentationOutcome::Ignored);
    assert!(slot.is_none());
    assert_eq!(notifier.tx_error, 1);
}

#[test]
fn pull_without_a_stream_is_inactive() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let mut notifier = RecordingNotifier::default();

    let (pull, block) = pull_request(10, 1, 1024);
    let err = Block2Segmentation::service(&mut slot, &config, &pull, block, &mut notifier)
        .expect_err("no stream to pull from");
    assert_eq!(err, SegmentationError::Inactive);
}

#[test]
fn non_pull_code_tears_down() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let mut notifier = RecordingNotifier::default();
    start_stream(&mut slot, &config);

    let mut post = Message::new(MessageType::Confirmable, Code::Post, MessageId::new(400));
    post.set_payload(Bytes::from_static(b"stray"));
    let (_, block) = pull_request(400, 1, 1024);
    let err = Block2Segmentation::service(&mut slot, &config, &post, block, &mut notifier)
        .expect_err("only pulls are serviced");
    assert_eq!(err, SegmentationError::UnexpectedCode { code: Code::Post });
    assert!(slot.is_none());
}
