use std::sync::Arc;
use std::thread;

use lnic_core::Core::CoreBarrier;
use lnic_core::LNIC::Outcome;
use lnic_core::Sim::{LoopbackQueue, SimNetwork};
use lnic_core::{
    AppHeader, Endpoint, LengthMode, LnicError, QueueInterface, RoleBuilder, RoleState, WaitPolicy,
};

const CLIENT_IP: u32 = 0x0a00_0001;
const CLIENT_CONTEXT: u64 = 0;

const SERVER_IP: u32 = 0x0a00_0001;
const SERVER_CONTEXT: u64 = 1;

const NUM_MSGS: u64 = 10;

// Generous enough for a loaded CI box; keeps a broken run from hanging the suite.
const BOUNDED: WaitPolicy = WaitPolicy::Bounded {
    max_polls: 50_000_000,
};

#[test]
fn client_and_server_exchange_ten_messages() {
    let network = SimNetwork::new();
    let barrier = Arc::new(CoreBarrier::new(2).unwrap());

    let server = {
        let network = network.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let mut endpoint = Endpoint::new(network.attach(SERVER_IP));
            endpoint.add_context(SERVER_CONTEXT, 0).unwrap();
            barrier.wait();

            let config = RoleBuilder::new()
                .with_iterations(NUM_MSGS)
                .with_wait_policy(BOUNDED)
                .build_server()
                .unwrap();
            let report = endpoint.run_server(&config);
            (report, endpoint.state(), endpoint.queue().rx_pending())
        })
    };

    let mut client = Endpoint::new(network.attach(CLIENT_IP));
    client.add_context(CLIENT_CONTEXT, 0).unwrap();
    assert_eq!(client.state(), RoleState::Registered);
    barrier.wait();

    let config = RoleBuilder::new()
        .with_iterations(NUM_MSGS)
        .with_server(SERVER_IP, SERVER_CONTEXT as u16)
        .with_payload_length(8)
        .with_wait_policy(BOUNDED)
        .build_client()
        .unwrap();
    let report = client.run_client(&config).unwrap();

    // run_client only returns Ok once every response carried the server's
    // address, context 1 and the request length.
    assert_eq!(report.messages, NUM_MSGS);
    assert_eq!(report.latencies.len(), NUM_MSGS as usize);
    assert_eq!(client.queue().rx_pending(), 0);
    assert_eq!(client.queue().done_count(), NUM_MSGS);
    assert_eq!(client.state(), RoleState::Terminal(Outcome::Ok));
    println!("latency: {:?}", report.stats());

    let (server_report, server_state, server_pending) = server.join().unwrap();
    assert_eq!(server_report.unwrap().messages, NUM_MSGS);
    assert_eq!(server_state, RoleState::Terminal(Outcome::Ok));
    assert_eq!(server_pending, 0);

    assert_eq!(network.delivered(), 2 * NUM_MSGS);
    assert_eq!(network.dropped(), 0);
}

#[test]
fn multi_word_requests_round_trip() {
    let network = SimNetwork::new();
    let barrier = Arc::new(CoreBarrier::new(2).unwrap());

    let server = {
        let network = network.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let mut endpoint = Endpoint::new(network.attach(0x0a00_0002));
            endpoint.add_context(7, 0).unwrap();
            barrier.wait();
            let config = RoleBuilder::new()
                .with_iterations(5)
                .with_length_mode(LengthMode::Fixed(20))
                .with_wait_policy(BOUNDED)
                .build_server()
                .unwrap();
            endpoint.run_server(&config).map(|r| r.messages)
        })
    };

    let mut client = Endpoint::new(network.attach(CLIENT_IP));
    client.add_context(0, 0).unwrap();
    barrier.wait();

    let config = RoleBuilder::new()
        .with_iterations(5)
        .with_server(0x0a00_0002, 7)
        .with_payload_length(20)
        .with_wait_policy(BOUNDED)
        .build_client()
        .unwrap();
    let report = client.run_client(&config).unwrap();

    assert_eq!(report.messages, 5);
    assert_eq!(server.join().unwrap().unwrap(), 5);
    assert_eq!(client.queue().rx_pending(), 0);
}

#[test]
fn client_talking_to_itself_measures_one_tick() {
    // Loopback cycle counter ticks once per sample: send, then receive.
    let mut endpoint = Endpoint::new(LoopbackQueue::new(CLIENT_IP));
    endpoint.add_context(0, 0).unwrap();

    let config = RoleBuilder::new()
        .with_iterations(3)
        .with_server(CLIENT_IP, 0)
        .with_wait_policy(WaitPolicy::Bounded { max_polls: 10 })
        .build_client()
        .unwrap();
    let report = endpoint.run_client(&config).unwrap();

    assert_eq!(report.latencies, vec![1, 1, 1]);
    let stats = report.stats().unwrap();
    assert_eq!((stats.min, stats.mean, stats.max), (1, 1, 1));
    assert_eq!(endpoint.queue().done_count(), 3);
    assert_eq!(endpoint.queue().transmitted().len(), 3);
}

#[test]
fn response_from_wrong_context_aborts_the_run() {
    let mut endpoint = Endpoint::new(LoopbackQueue::new(CLIENT_IP));
    endpoint.add_context(0, 0).unwrap();
    endpoint.add_context(5, 0).unwrap();

    // The request loops back into context 5 but names context 0 as its source.
    let config = RoleBuilder::new()
        .with_iterations(NUM_MSGS)
        .with_server(CLIENT_IP, 5)
        .with_wait_policy(WaitPolicy::Bounded { max_polls: 10 })
        .build_client()
        .unwrap();
    let err = endpoint.run_client(&config).unwrap_err();

    match err {
        LnicError::UnexpectedSource {
            expected_context,
            context,
            ..
        } => assert_eq!((expected_context, context), (5, 0)),
        ref other => panic!("expected UnexpectedSource, got {other:?}"),
    }
    assert_eq!(endpoint.state(), RoleState::Terminal(Outcome::Error(err.code())));
    // Aborted on the first iteration.
    assert_eq!(endpoint.queue().transmitted().len(), 1);
    assert_eq!(endpoint.queue().done_count(), 0);
}

#[test]
fn response_with_wrong_length_aborts_the_run() {
    let mut endpoint = Endpoint::new(LoopbackQueue::new(CLIENT_IP));
    endpoint.add_context(0, 0).unwrap();
    endpoint
        .queue_mut()
        .inject(0, AppHeader::new(SERVER_IP + 1, 1, 16), &[0, 0])
        .unwrap();

    let config = RoleBuilder::new()
        .with_iterations(1)
        .with_server(SERVER_IP + 1, 1)
        .with_wait_policy(WaitPolicy::Bounded { max_polls: 10 })
        .build_client()
        .unwrap();
    let err = endpoint.run_client(&config).unwrap_err();

    assert!(matches!(err, LnicError::LengthMismatch { expected: 8, declared: 16 }));
}

#[test]
fn leftover_words_fail_the_drain_check() {
    let mut endpoint = Endpoint::new(LoopbackQueue::new(CLIENT_IP));
    endpoint.add_context(0, 0).unwrap();
    let reply = AppHeader::new(SERVER_IP + 1, 1, 8);
    endpoint.queue_mut().inject(0, reply, &[0]).unwrap();
    endpoint.queue_mut().inject(0, reply, &[0]).unwrap();

    let config = RoleBuilder::new()
        .with_iterations(1)
        .with_server(SERVER_IP + 1, 1)
        .with_wait_policy(WaitPolicy::Bounded { max_polls: 10 })
        .build_client()
        .unwrap();
    let err = endpoint.run_client(&config).unwrap_err();

    match err {
        LnicError::QueueNotDrained { pending } => assert_eq!(pending, 2),
        other => panic!("expected QueueNotDrained, got {other:?}"),
    }
    assert_eq!(endpoint.state(), RoleState::Terminal(Outcome::Error(-5)));
}

#[test]
fn unanswered_request_surfaces_hang_under_bounded_wait() {
    let network = SimNetwork::new();
    let mut client = Endpoint::new(network.attach(CLIENT_IP));
    client.add_context(0, 0).unwrap();

    // Nobody owns context 9, so the request is dropped.
    let config = RoleBuilder::new()
        .with_iterations(1)
        .with_server(SERVER_IP, 9)
        .with_wait_policy(WaitPolicy::Bounded { max_polls: 1000 })
        .build_client()
        .unwrap();
    let err = client.run_client(&config).unwrap_err();

    assert!(matches!(err, LnicError::Hang { polls: 1000 }));
    assert_eq!(network.dropped(), 1);
    assert_eq!(network.delivered(), 0);
}

#[test]
fn sim_network_serves_contexts_by_priority() {
    let network = SimNetwork::new();
    let mut tester = Endpoint::new(network.attach(0x0a01_0203));
    tester.add_context(0x1234, 0).unwrap();

    let mut nic = Endpoint::new(network.attach(SERVER_IP));
    nic.add_context(0, 1).unwrap(); // LOW
    nic.add_context(1, 0).unwrap(); // HIGH

    let queue = tester.queue_mut();
    for (context, value) in [(0u16, 10u64), (0, 11), (1, 20)] {
        queue.write(AppHeader::new(SERVER_IP, context, 8).encode());
        queue.write(value);
        queue.done();
    }

    nic.run_passthrough(LengthMode::Variable, WaitPolicy::Bounded { max_polls: 10 }, 3)
        .unwrap();

    let queue = tester.queue_mut();
    let mut replies = Vec::new();
    while queue.ready() {
        let header = AppHeader::decode(queue.read().unwrap());
        let value = queue.read().unwrap();
        queue.done();
        replies.push((header.address, header.context, value));
    }
    assert_eq!(
        replies,
        vec![(SERVER_IP, 1, 20), (SERVER_IP, 0, 10), (SERVER_IP, 0, 11)]
    );
    assert_eq!(queue.rx_pending(), 0);
}

#[test]
fn context_registration_fails_fast() {
    let network = SimNetwork::new();
    let mut endpoint = Endpoint::new(network.attach(SERVER_IP));

    let config = RoleBuilder::new().with_iterations(1).build_server().unwrap();
    assert!(matches!(
        endpoint.run_server(&config),
        Err(LnicError::ContextNotRegistered(_))
    ));
    assert_eq!(endpoint.state(), RoleState::Init);

    endpoint.add_context(1, 0).unwrap();
    assert!(matches!(
        endpoint.add_context(1, 3),
        Err(LnicError::ContextAlreadyRegistered(1))
    ));
    assert!(matches!(
        endpoint.add_context(70_000, 0),
        Err(LnicError::ContextOutOfRange(70_000))
    ));
    assert_eq!(endpoint.contexts().contexts().len(), 1);

    // Another core at the same address cannot claim the same context.
    let mut other = Endpoint::new(network.attach(SERVER_IP));
    assert!(matches!(
        other.add_context(1, 0),
        Err(LnicError::ContextAlreadyRegistered(1))
    ));
    other.add_context(2, 0).unwrap();
    println!("{:?} {:?}", network, other.queue());
}

#[test]
fn builder_rejects_unusable_client_configs() {
    assert!(matches!(
        RoleBuilder::new().with_payload_length(4).build_client(),
        Err(LnicError::InvalidConfig(_))
    ));
    assert!(matches!(
        RoleBuilder::new().with_payload_length(70_000).build_client(),
        Err(LnicError::LengthOverflow { length: 70_000 })
    ));
    assert!(matches!(
        RoleBuilder::new()
            .with_payload_length(16)
            .with_length_mode(LengthMode::Fixed(8))
            .build_client(),
        Err(LnicError::InvalidConfig(_))
    ));

    let config = RoleBuilder::new().build_client().unwrap();
    assert_eq!(config.iterations, 10);
    assert_eq!(config.server_address, 0x0a00_0001);
    assert_eq!(config.server_context, 1);
    assert_eq!(config.payload_length, 8);
    assert_eq!(config.wait, WaitPolicy::Unbounded);
}
