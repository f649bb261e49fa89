#[allow(non_snake_case)]
pub mod StructDebug;

use std::fmt;

use crate::Core::registers::MmioQueue;
use crate::Sim::network::{SimCore, SimNetwork};

// Debug proxy implementations that call the standalone debug functions
impl fmt::Debug for MmioQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        StructDebug::debug_mmio_queue(self, f)
    }
}

impl fmt::Debug for SimNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        StructDebug::debug_sim_network(self, f)
    }
}

impl fmt::Debug for SimCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        StructDebug::debug_sim_core(self, f)
    }
}
