use std::fmt;
use std::sync::atomic::Ordering;

use crate::Core::registers::MmioQueue;
use crate::Sim::network::{SimCore, SimNetwork};

/// Debug function for MmioQueue
///
/// Shows the register block address without touching the registers: a read of
/// `rx_word` would pop the receive queue.
pub fn debug_mmio_queue(queue: &MmioQueue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MmioQueue")
        .field("regs", &format_args!("{:p}", queue.regs.as_ptr()))
        .finish_non_exhaustive()
}

/// Debug function for SimNetwork
///
/// Shows:
/// - Number of registered (address, context) routes
/// - Delivered and dropped message counters
pub fn debug_sim_network(network: &SimNetwork, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let fabric = network.fabric.lock();
    f.debug_struct("SimNetwork")
        .field("routes", &fabric.route_count())
        .field("delivered", &fabric.delivered)
        .field("dropped", &fabric.dropped)
        .finish()
}

/// Debug function for SimCore
///
/// Shows the core's address and contexts, queued and in-flight message state.
/// The shared fabric is not locked.
pub fn debug_sim_core(core: &SimCore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SimCore")
        .field("address", &format_args!("{:#x}", core.address))
        .field("contexts", &core.contexts)
        .field("queued", &core.signal.queued.load(Ordering::Relaxed))
        .field("active_words", &core.active.as_ref().map_or(0, |m| m.remaining()))
        .field("done_count", &core.done_count)
        .finish_non_exhaustive()
}
