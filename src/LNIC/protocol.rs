// Client/server round-trip protocol.
//
// Both roles walk the same state machine:
//   Init -> Registered -> Running{0..N} -> DrainCheck -> Terminal(ok | error)
// Any failure jumps straight to Terminal(error); remaining iterations are skipped.

use std::convert::Infallible;

use super::builder::{ClientConfig, ServerConfig};
use super::framer::{frame_passthrough, LengthMode};
use super::header::AppHeader;
use super::queue::{await_message, QueueInterface, WaitPolicy};
use crate::error::{LnicError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
    Passthrough,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Carries `LnicError::code()` of the failure.
    Error(i32),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RoleState {
    #[default]
    Init,
    Registered,
    Running { iteration: u64 },
    DrainCheck,
    Terminal(Outcome),
}

/// What a finished run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub role: Role,
    pub messages: u64,
    /// Per-message round-trip latency in cycles (client only).
    pub latencies: Vec<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub mean: u64,
}

impl RunReport {
    fn new(role: Role) -> Self {
        Self {
            role,
            messages: 0,
            latencies: Vec::new(),
        }
    }

    pub fn stats(&self) -> Option<LatencyStats> {
        let min = *self.latencies.iter().min()?;
        let max = *self.latencies.iter().max()?;
        let sum: u128 = self.latencies.iter().map(|&l| l as u128).sum();
        Some(LatencyStats {
            min,
            max,
            mean: (sum / self.latencies.len() as u128) as u64,
        })
    }
}

/// Check a response header against the request it answers.
pub fn validate_response(response: AppHeader, request: AppHeader) -> Result<()> {
    if response.address != request.address || response.context != request.context {
        tracing::error!(
            expected_address = request.address,
            expected_context = request.context,
            address = response.address,
            context = response.context,
            "response from unexpected source"
        );
        return Err(LnicError::UnexpectedSource {
            expected_address: request.address,
            expected_context: request.context,
            address: response.address,
            context: response.context,
        });
    }
    if response.length != request.length {
        tracing::error!(
            expected = request.length,
            received = response.length,
            "response length mismatch"
        );
        return Err(LnicError::LengthMismatch {
            expected: request.length,
            declared: response.length,
        });
    }
    Ok(())
}

/// Fail if any receive word is left over.
pub fn drain_check<Q: QueueInterface + ?Sized>(queue: &Q) -> Result<()> {
    let pending = queue.rx_pending();
    if pending != 0 {
        tracing::error!(pending, "RX queue is not empty after processing all msgs");
        return Err(LnicError::QueueNotDrained { pending });
    }
    Ok(())
}

pub fn run_client<Q: QueueInterface + ?Sized>(
    queue: &mut Q,
    config: &ClientConfig,
    state: &mut RoleState,
) -> Result<RunReport> {
    let result = client_iterations(queue, config, state).and_then(|report| {
        *state = RoleState::DrainCheck;
        drain_check(queue)?;
        Ok(report)
    });
    finish(state, result)
}

fn client_iterations<Q: QueueInterface + ?Sized>(
    queue: &mut Q,
    config: &ClientConfig,
    state: &mut RoleState,
) -> Result<RunReport> {
    let request = AppHeader::new(
        config.server_address,
        config.server_context,
        config.payload_length,
    );
    let words = request.word_count();
    let mut report = RunReport::new(Role::Client);

    for n in 0..config.iterations {
        *state = RoleState::Running { iteration: n };

        // Send
        queue.write(request.encode());
        let sent_at = queue.cycles();
        queue.write(sent_at);
        for _ in 1..words {
            queue.write(n);
        }

        // Wait + receive
        await_message(queue, config.wait)?;
        let response = AppHeader::decode(queue.read()?);
        let now = queue.cycles();
        let echoed = queue.read()?;
        let latency = now.wrapping_sub(echoed);
        tracing::debug!(time = now, latency, "response received");

        validate_response(response, request)?;
        for _ in 1..response.word_count() {
            queue.read()?;
        }
        queue.done();

        report.latencies.push(latency);
        report.messages += 1;
    }

    Ok(report)
}

pub fn run_server<Q: QueueInterface + ?Sized>(
    queue: &mut Q,
    config: &ServerConfig,
    state: &mut RoleState,
) -> Result<RunReport> {
    let result = serve(
        queue,
        config.length_mode,
        config.wait,
        config.iterations,
        state,
        Role::Server,
    )
    .and_then(|report| {
        *state = RoleState::DrainCheck;
        drain_check(queue)?;
        Ok(report)
    });
    finish(state, result)
}

/// Bounded passthrough: echo `limit` messages, no drain check.
pub fn run_passthrough<Q: QueueInterface + ?Sized>(
    queue: &mut Q,
    mode: LengthMode,
    wait: WaitPolicy,
    limit: u64,
    state: &mut RoleState,
) -> Result<RunReport> {
    let result = serve(queue, mode, wait, limit, state, Role::Passthrough);
    finish(state, result)
}

/// Echo messages forever. Only returns on failure.
pub fn run_passthrough_loop<Q: QueueInterface + ?Sized>(
    queue: &mut Q,
    mode: LengthMode,
    wait: WaitPolicy,
    state: &mut RoleState,
) -> Result<Infallible> {
    let mut n = 0u64;
    let err = loop {
        *state = RoleState::Running { iteration: n };
        if let Err(e) = serve_one(queue, mode, wait) {
            break e;
        }
        n = n.wrapping_add(1);
    };
    *state = RoleState::Terminal(Outcome::Error(err.code()));
    Err(err)
}

fn serve<Q: QueueInterface + ?Sized>(
    queue: &mut Q,
    mode: LengthMode,
    wait: WaitPolicy,
    limit: u64,
    state: &mut RoleState,
    role: Role,
) -> Result<RunReport> {
    let mut report = RunReport::new(role);

    for n in 0..limit {
        *state = RoleState::Running { iteration: n };
        serve_one(queue, mode, wait)?;
        report.messages += 1;
    }

    Ok(report)
}

/// Wait for one request, echo its header, mirror its payload.
fn serve_one<Q: QueueInterface + ?Sized>(
    queue: &mut Q,
    mode: LengthMode,
    wait: WaitPolicy,
) -> Result<()> {
    await_message(queue, wait)?;
    let word = queue.read()?;
    let header = AppHeader::decode(word);
    tracing::trace!(?header, "request received");

    // Rejected requests leave nothing on the transmit side.
    if let Err(e) = mode.validate(header.length) {
        tracing::error!(declared = header.length, ?mode, "request length rejected");
        return Err(e);
    }
    queue.write(word);
    frame_passthrough(queue, header.length, mode)?;
    Ok(())
}

fn finish(state: &mut RoleState, result: Result<RunReport>) -> Result<RunReport> {
    *state = RoleState::Terminal(match &result {
        Ok(_) => Outcome::Ok,
        Err(e) => Outcome::Error(e.code()),
    });
    result
}
