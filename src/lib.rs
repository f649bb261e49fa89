// Module naming follows project convention (LNIC = lightweight network interface,
// Core = hardware-facing primitives, Sim = in-memory queue controllers)
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod LNIC;
#[allow(non_snake_case)]
pub mod Sim;
#[allow(non_snake_case)]
mod Debug;

pub mod error;
pub mod ffi;

pub use error::{LnicError, Result};
pub use LNIC::{
    AppHeader, Context, ContextController, ContextManager, Endpoint, LengthMode,
    QueueInterface, RoleBuilder, RoleState, RunReport, WaitPolicy,
};
