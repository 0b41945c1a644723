//! Tests for the device-initiated block-1 upload.

use bytes::Bytes;

use crate::{
    block::{PushError, PushTransfer},
    coap::{BlockOption, Code, MessageId},
    config::BlockwiseConfig,
};

#[test]
fn small_payload_goes_out_whole() {
    let config = BlockwiseConfig::default();
    let mut slot = None;

    let message = PushTransfer::start(
        &mut slot,
        &config,
        Bytes::from(vec![7; 100]),
        Some(42),
        MessageId::new(1),
    )
    .expect("single-block push");

    assert!(message.block1().is_none());
    assert_eq!(message.payload().len(), 100);
    assert_eq!(message.content_type(), Some(42));
    assert!(slot.is_none(), "single-block pushes keep no state");
}

#[test]
fn large_payload_is_fragmented() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let payload: Vec<u8> = (0..2500_u32).map(|i| u8::try_from(i % 251).unwrap_or(0)).collect();

    let first = PushTransfer::start(
        &mut slot,
        &config,
        Bytes::from(payload.clone()),
        None,
        MessageId::new(9),
    )
    .expect("fragmented push");

    let block = first.block1().expect("block-1 header set");
    assert_eq!((block.number, block.more, block.size), (0, true, 1024));
    assert_eq!(first.payload(), &payload[..1024]);
    assert_eq!(first.code(), Code::Post);

    let push = slot.as_ref().expect("state retained");
    assert_eq!(push.first_mid(), MessageId::new(9));
    assert_eq!(push.total_len(), 2500);

    let second = push
        .next_fragment(BlockOption::new(0, true, 1024), MessageId::new(10))
        .expect("second fragment");
    let block = second.block1().expect("block-1 header set");
    assert_eq!((block.number, block.more), (1, true));
    assert_eq!(second.payload(), &payload[1024..2048]);

    let third = push
        .next_fragment(BlockOption::new(1, true, 1024), MessageId::new(11))
        .expect("final fragment");
    let block = third.block1().expect("block-1 header set");
    assert_eq!((block.number, block.more), (2, false));
    assert_eq!(third.payload(), &payload[2048..]);
}

#[test]
fn acknowledged_block_past_the_payload_is_rejected() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    PushTransfer::start(
        &mut slot,
        &config,
        Bytes::from(vec![1; 2500]),
        None,
        MessageId::new(5),
    )
    .expect("fragmented push");

    let err = slot
        .as_ref()
        .expect("state retained")
        .next_fragment(BlockOption::new(3, true, 1024), MessageId::new(6))
        .expect_err("offset past the payload");
    assert_eq!(err, PushError::OffsetOutOfRange { offset: 4096, length: 2500 });
    assert_eq!(err.code(), Code::BadOption);
}

#[test]
fn second_push_while_one_is_in_flight_is_refused() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    PushTransfer::start(
        &mut slot,
        &config,
        Bytes::from(vec![1; 2000]),
        None,
        MessageId::new(1),
    )
    .expect("first push");

    let err = PushTransfer::start(
        &mut slot,
        &config,
        Bytes::from(vec![2; 2000]),
        None,
        MessageId::new(2),
    )
    .expect_err("only one push at a time");
    assert_eq!(err, PushError::Busy);
    assert_eq!(err.code(), Code::PreconditionFailed);
}

#[test]
fn empty_payload_is_refused() {
    let config = BlockwiseConfig::default();
    let mut slot = None;
    let err = PushTransfer::start(&mut slot, &config, Bytes::new(), None, MessageId::new(1))
        .expect_err("nothing to push");
    assert_eq!(err, PushError::EmptyPayload);
}
