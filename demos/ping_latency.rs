// Ping latency between two simulated cores sharing one controller.
//
//   cargo run --example ping_latency [num_msgs] [payload_bytes]
use lnic_core::Core::CoreBarrier;
use lnic_core::Sim::SimNetwork;
use lnic_core::{Endpoint, RoleBuilder};
use std::env;
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;

const CLIENT_IP: u32 = 0x0a000001;
const CLIENT_CONTEXT: u64 = 0;

const SERVER_IP: u32 = 0x0a000001;
const SERVER_CONTEXT: u64 = 1;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let args: Vec<String> = env::args().collect();
    let num_msgs: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10);
    let payload: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(8);

    let network = SimNetwork::new();
    let barrier = Arc::new(CoreBarrier::new(2)?);

    let server = {
        let network = network.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || -> lnic_core::Result<u64> {
            let mut endpoint = Endpoint::new(network.attach(SERVER_IP));
            endpoint.add_context(SERVER_CONTEXT, 0)?;
            barrier.wait();

            let config = RoleBuilder::new().with_iterations(num_msgs).build_server()?;
            Ok(endpoint.run_server(&config)?.messages)
        })
    };

    let mut client = Endpoint::new(network.attach(CLIENT_IP));
    client.add_context(CLIENT_CONTEXT, 0)?;
    barrier.wait();

    let config = RoleBuilder::new()
        .with_iterations(num_msgs)
        .with_server(SERVER_IP, SERVER_CONTEXT as u16)
        .with_payload_length(payload)
        .build_client()?;
    let report = client.run_client(&config)?;

    let served = server.join().map_err(|_| "server thread panicked")??;
    println!("Client: {} msgs, server echoed {}", report.messages, served);
    if let Some(stats) = report.stats() {
        println!(
            "Latency (cycles): min {} / mean {} / max {}",
            stats.min, stats.mean, stats.max
        );
    }
    println!("{:?}", network);

    Ok(())
}
