pub mod inbox;
pub mod loopback;
pub mod network;

pub use loopback::LoopbackQueue;
pub use network::{SimCore, SimNetwork};
