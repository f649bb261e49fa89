use std::convert::Infallible;

use super::builder::{ClientConfig, ServerConfig};
use super::context::{Context, ContextManager};
use super::framer::LengthMode;
use super::protocol::{self, RoleState, RunReport};
use super::queue::{ContextController, QueueInterface, WaitPolicy};
use crate::error::{LnicError, Result};

/// One core's handle on the queue controller.
///
/// Owns the backend, the contexts this core registered and the state of the
/// role it is running. A role can only start once a context is registered.
#[derive(Debug)]
pub struct Endpoint<Q> {
    queue: Q,
    contexts: ContextManager,
    state: RoleState,
}

impl<Q: QueueInterface + ContextController> Endpoint<Q> {
    pub fn new(queue: Q) -> Self {
        Self {
            queue,
            contexts: ContextManager::new(),
            state: RoleState::Init,
        }
    }

    pub fn add_context(&mut self, id: u64, priority: u64) -> Result<Context> {
        let context = self.contexts.add_context(&mut self.queue, id, priority)?;
        if self.state == RoleState::Init {
            self.state = RoleState::Registered;
        }
        Ok(context)
    }

    pub fn run_client(&mut self, config: &ClientConfig) -> Result<RunReport> {
        self.ensure_registered()?;
        let report = protocol::run_client(&mut self.queue, config, &mut self.state)?;
        if let Some(stats) = report.stats() {
            tracing::info!(
                messages = report.messages,
                min = stats.min,
                mean = stats.mean,
                max = stats.max,
                "client run complete"
            );
        }
        Ok(report)
    }

    pub fn run_server(&mut self, config: &ServerConfig) -> Result<RunReport> {
        self.ensure_registered()?;
        let report = protocol::run_server(&mut self.queue, config, &mut self.state)?;
        tracing::info!(messages = report.messages, "server run complete");
        Ok(report)
    }

    /// Echo `limit` messages and stop.
    pub fn run_passthrough(&mut self, mode: LengthMode, wait: WaitPolicy, limit: u64) -> Result<RunReport> {
        self.ensure_registered()?;
        protocol::run_passthrough(&mut self.queue, mode, wait, limit, &mut self.state)
    }

    /// Echo messages until one fails validation.
    pub fn run_passthrough_loop(&mut self, mode: LengthMode) -> Result<Infallible> {
        self.ensure_registered()?;
        protocol::run_passthrough_loop(&mut self.queue, mode, WaitPolicy::Unbounded, &mut self.state)
    }

    pub fn state(&self) -> RoleState {
        self.state
    }

    pub fn contexts(&self) -> &ContextManager {
        &self.contexts
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    pub fn into_inner(self) -> Q {
        self.queue
    }

    fn ensure_registered(&self) -> Result<()> {
        if self.contexts.is_empty() {
            tracing::error!("role started before any context was registered");
            // Context 0 is the conventional per-core context.
            return Err(LnicError::ContextNotRegistered(0));
        }
        Ok(())
    }
}
