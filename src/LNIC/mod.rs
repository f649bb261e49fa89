pub mod builder;
pub mod context;
pub mod endpoint;
pub mod framer;
pub mod header;
pub mod protocol;
pub mod queue;

pub use builder::{ClientConfig, RoleBuilder, ServerConfig};
pub use context::{Context, ContextManager};
pub use endpoint::Endpoint;
pub use framer::{frame_passthrough, LengthMode};
pub use header::{AppHeader, WORD_SIZE};
pub use protocol::{LatencyStats, Outcome, Role, RoleState, RunReport};
pub use queue::{await_message, ContextController, QueueInterface, WaitPolicy};
