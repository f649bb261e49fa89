use lnic_core::LNIC::framer::frame_passthrough;
use lnic_core::Sim::LoopbackQueue;
use lnic_core::{
    AppHeader, Endpoint, LengthMode, LnicError, QueueInterface, RoleBuilder, RoleState, WaitPolicy,
};

const NIC_IP: u32 = 0x0a00_0001;
const MY_IP: u32 = 0x0a01_0203;
const MY_CONTEXT: u16 = 0x1234;

const BOUNDED: WaitPolicy = WaitPolicy::Bounded { max_polls: 1000 };

fn nic() -> Endpoint<LoopbackQueue> {
    let mut endpoint = Endpoint::new(LoopbackQueue::new(NIC_IP));
    endpoint.add_context(0, 0).unwrap();
    endpoint
}

#[test]
fn loopback_echoes_header_and_payload() {
    let mut endpoint = nic();
    let value = 0x0123_4567_89ab_cdef;

    // Send one word to ourselves; it comes straight back into context 0.
    let request = AppHeader::new(NIC_IP, 0, 8);
    let queue = endpoint.queue_mut();
    queue.write(request.encode());
    queue.write(value);
    assert!(queue.ready());
    assert_eq!(queue.rx_pending(), 2);

    let report = endpoint.run_passthrough(LengthMode::Variable, BOUNDED, 1).unwrap();
    assert_eq!(report.messages, 1);

    let sent = endpoint.queue().transmitted();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], vec![request.encode(), value]);
    assert_eq!(sent[1], sent[0], "echo must match the request word for word");
    assert_eq!(endpoint.queue().done_count(), 1);
}

#[test]
fn fixed_length_rejects_before_copying() {
    let mut queue = LoopbackQueue::new(NIC_IP);
    let mut endpoint = Endpoint::new(&mut queue);
    endpoint.add_context(0, 0).unwrap();

    let header = AppHeader::new(MY_IP, MY_CONTEXT, 16);
    queue.inject(0, header, &[1, 2]).unwrap();
    let word = queue.read().unwrap();
    assert_eq!(AppHeader::decode(word), header);

    let err = frame_passthrough(&mut queue, 16, LengthMode::Fixed(8)).unwrap_err();
    match err {
        LnicError::LengthMismatch { expected, declared } => {
            assert_eq!((expected, declared), (8, 16));
        }
        other => panic!("expected LengthMismatch, got {other:?}"),
    }

    // Nothing copied, nothing completed.
    assert!(queue.transmitted().is_empty());
    assert_eq!(queue.rx_pending(), 2);
    assert_eq!(queue.done_count(), 0);
}

#[test]
fn fixed_length_server_does_not_echo_rejected_header() {
    let mut endpoint = nic();
    endpoint
        .queue_mut()
        .inject(0, AppHeader::new(MY_IP, MY_CONTEXT, 16), &[1, 2])
        .unwrap();

    let config = RoleBuilder::new()
        .with_iterations(1)
        .with_length_mode(LengthMode::Fixed(8))
        .with_wait_policy(BOUNDED)
        .build_server()
        .unwrap();
    let err = endpoint.run_server(&config).unwrap_err();

    assert!(matches!(err, LnicError::LengthMismatch { expected: 8, declared: 16 }));
    assert_eq!(endpoint.state(), RoleState::Terminal(lnic_core::LNIC::Outcome::Error(err.code())));
    assert!(endpoint.queue().transmitted().is_empty());
}

#[test]
fn fixed_length_accepts_matching_messages() {
    let mut endpoint = nic();
    endpoint
        .queue_mut()
        .inject(0, AppHeader::new(MY_IP, MY_CONTEXT, 8), &[99])
        .unwrap();

    let report = endpoint.run_passthrough(LengthMode::Fixed(8), BOUNDED, 1).unwrap();
    assert_eq!(report.messages, 1);
    assert_eq!(
        endpoint.queue().transmitted(),
        &[vec![AppHeader::new(MY_IP, MY_CONTEXT, 8).encode(), 99]]
    );
}

#[test]
fn zero_length_message_still_completes() {
    let mut queue = LoopbackQueue::new(NIC_IP);
    let mut endpoint = Endpoint::new(&mut queue);
    endpoint.add_context(0, 0).unwrap();
    queue.inject(0, AppHeader::new(MY_IP, MY_CONTEXT, 0), &[]).unwrap();

    queue.read().unwrap();
    let copied = frame_passthrough(&mut queue, 0, LengthMode::Variable).unwrap();

    assert_eq!(copied, 0);
    assert_eq!(queue.done_count(), 1);
    assert_eq!(queue.rx_pending(), 0);
}

#[test]
fn variable_length_copies_every_word_in_order() {
    let mut endpoint = nic();
    let payload: Vec<u64> = (0..5).map(|i| 0x1000 + i).collect();
    // 33 bytes: four full words plus one partial word
    let header = AppHeader::new(MY_IP, MY_CONTEXT, 33);
    endpoint.queue_mut().inject(0, header, &payload).unwrap();

    endpoint.run_passthrough(LengthMode::Variable, BOUNDED, 1).unwrap();

    let sent = endpoint.queue().transmitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0][0], header.encode());
    assert_eq!(&sent[0][1..], payload.as_slice());
    assert_eq!(endpoint.queue().rx_pending(), 0);
}

#[test]
fn higher_priority_context_is_served_first() {
    // Priority 0 is HIGH, 1 is LOW.
    let mut endpoint = Endpoint::new(LoopbackQueue::new(NIC_IP));
    endpoint.add_context(0, 1).unwrap();
    endpoint.add_context(1, 0).unwrap();

    let low = AppHeader::new(MY_IP, MY_CONTEXT, 8);
    let high = AppHeader::new(MY_IP, MY_CONTEXT + 1, 8);
    let queue = endpoint.queue_mut();
    queue.inject(0, low, &[1]).unwrap();
    queue.inject(0, low, &[2]).unwrap();
    queue.inject(1, high, &[3]).unwrap();

    endpoint.run_passthrough(LengthMode::Variable, BOUNDED, 3).unwrap();

    let order: Vec<u64> = endpoint.queue().transmitted().iter().map(|m| m[1]).collect();
    assert_eq!(order, vec![3, 1, 2]);
}

#[test]
fn passthrough_loop_stops_on_first_bad_message() {
    let mut endpoint = nic();
    let queue = endpoint.queue_mut();
    queue.inject(0, AppHeader::new(MY_IP, MY_CONTEXT, 8), &[1]).unwrap();
    queue.inject(0, AppHeader::new(MY_IP, MY_CONTEXT, 8), &[2]).unwrap();
    queue.inject(0, AppHeader::new(MY_IP, MY_CONTEXT, 24), &[3, 4, 5]).unwrap();

    let err = match endpoint.run_passthrough_loop(LengthMode::Fixed(8)) {
        Err(e) => e,
        Ok(never) => match never {},
    };

    assert!(matches!(err, LnicError::LengthMismatch { expected: 8, declared: 24 }));
    assert_eq!(endpoint.queue().transmitted().len(), 2);
    assert_eq!(endpoint.queue().rx_pending(), 3);
}
