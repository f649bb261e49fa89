use super::framer::LengthMode;
use super::header::{MAX_MESSAGE_LEN, WORD_SIZE};
use super::queue::WaitPolicy;
use crate::error::{LnicError, Result};

/// Settings for the client side of a round-trip run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub iterations: u64,
    pub server_address: u32,
    pub server_context: u16,
    /// Request length in bytes; the first payload word carries the send timestamp.
    pub payload_length: u16,
    pub wait: WaitPolicy,
}

/// Settings for the server (echo) side of a round-trip run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub iterations: u64,
    pub length_mode: LengthMode,
    pub wait: WaitPolicy,
}

/// Builder for role configurations.
///
/// Defaults match the ping-latency test: 10 one-word messages to context 1
/// at 10.0.0.1, variable length, no wait timeout.
pub struct RoleBuilder {
    iterations: u64,
    server_address: u32,
    server_context: u16,
    payload_length: usize,
    length_mode: LengthMode,
    wait: WaitPolicy,
}

impl Default for RoleBuilder {
    fn default() -> Self {
        Self {
            iterations: 10,
            server_address: 0x0a00_0001, // 10.0.0.1
            server_context: 1,
            payload_length: WORD_SIZE,
            length_mode: LengthMode::Variable,
            wait: WaitPolicy::Unbounded,
        }
    }
}

impl RoleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_server(mut self, address: u32, context: u16) -> Self {
        self.server_address = address;
        self.server_context = context;
        self
    }

    pub fn with_payload_length(mut self, length_bytes: usize) -> Self {
        self.payload_length = length_bytes;
        self
    }

    pub fn with_length_mode(mut self, mode: LengthMode) -> Self {
        self.length_mode = mode;
        self
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn build_client(self) -> Result<ClientConfig> {
        if self.payload_length > MAX_MESSAGE_LEN {
            return Err(LnicError::LengthOverflow {
                length: self.payload_length,
            });
        }
        // One word is needed for the timestamp.
        if self.payload_length < WORD_SIZE {
            return Err(LnicError::InvalidConfig(format!(
                "client payload must hold a {WORD_SIZE}-byte timestamp, got {} bytes",
                self.payload_length
            )));
        }
        if let LengthMode::Fixed(expected) = self.length_mode {
            if expected as usize != self.payload_length {
                return Err(LnicError::InvalidConfig(format!(
                    "payload length {} conflicts with fixed length {expected}",
                    self.payload_length
                )));
            }
        }

        Ok(ClientConfig {
            iterations: self.iterations,
            server_address: self.server_address,
            server_context: self.server_context,
            payload_length: self.payload_length as u16,
            wait: self.wait,
        })
    }

    pub fn build_server(self) -> Result<ServerConfig> {
        Ok(ServerConfig {
            iterations: self.iterations,
            length_mode: self.length_mode,
            wait: self.wait,
        })
    }
}
