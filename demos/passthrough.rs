// Echo server core fed by a tester core, as in the multi-core loopback test.
//
//   cargo run --example passthrough [num_msgs] [--auto-exit]
use lnic_core::Sim::SimNetwork;
use lnic_core::{AppHeader, Endpoint, LengthMode, QueueInterface};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;

const NIC_IP: u32 = 0x0a000001;
const MY_IP: u32 = 0x0a010203;
const MY_CONTEXT: u64 = 0x1234;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let num_msgs: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);
    let auto_exit = args.iter().any(|s| s == "--auto-exit");

    let network = SimNetwork::new();

    // Register before any traffic; the echo core then runs forever on its own thread.
    let mut nic = Endpoint::new(network.attach(NIC_IP));
    nic.add_context(0, 0)?;
    thread::spawn(move || {
        if let Err(e) = nic.run_passthrough_loop(LengthMode::Variable) {
            eprintln!("Passthrough: stopped: {}", e);
        }
    });

    let mut tester = Endpoint::new(network.attach(MY_IP));
    tester.add_context(MY_CONTEXT, 0)?;
    let queue = tester.queue_mut();

    let start = std::time::Instant::now();
    for i in 0..num_msgs {
        let len = (i % 64) as usize * 8;
        queue.write(AppHeader::try_new(NIC_IP, 0, len)?.encode());
        for w in 0..len / 8 {
            queue.write(i ^ w as u64);
        }
        queue.done();

        queue.wait();
        let reply = AppHeader::decode(queue.read()?);
        for w in 0..reply.word_count() {
            let word = queue.read()?;
            if word != i ^ w as u64 {
                return Err(format!("msg {}: word {} corrupted", i, w).into());
            }
        }
        queue.done();
    }
    let elapsed = start.elapsed();
    println!("Tester: {} msgs echoed in {:.2?}", num_msgs, elapsed);

    if !auto_exit {
        let keep_alive = Arc::new(AtomicBool::new(true));
        let keep_alive_for_handler = Arc::clone(&keep_alive);

        // Handle Ctrl+C to shut down
        ctrlc::set_handler(move || {
            keep_alive_for_handler.store(false, Ordering::SeqCst);
        })?;

        println!("Press Ctrl+C to exit...");
        while keep_alive.load(Ordering::SeqCst) {
            thread::sleep(std::time::Duration::from_millis(100));
        }
    }
    println!("Tester: Shutting down");

    Ok(())
}
