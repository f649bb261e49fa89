// Monotonic cycle counter used for request timestamps.

/// Read the core's cycle counter.
#[cfg(target_arch = "riscv64")]
#[inline]
pub fn cycles() -> u64 {
    let count: u64;
    unsafe {
        core::arch::asm!("rdcycle {0}", out(reg) count, options(nomem, nostack));
    }
    count
}

#[cfg(not(target_arch = "riscv64"))]
lazy_static::lazy_static! {
    static ref EPOCH: std::time::Instant = std::time::Instant::now();
}

/// Nanoseconds since the first call stand in for cycles off-target.
#[cfg(not(target_arch = "riscv64"))]
#[inline]
pub fn cycles() -> u64 {
    EPOCH.elapsed().as_nanos() as u64
}
