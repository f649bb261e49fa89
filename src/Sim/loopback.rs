// Single-core queue controller: no threads, fully deterministic.

use std::cell::Cell;

use super::inbox::{next_inbox, stamp_source, ActiveMessage, Inbox, TxAssembler};
use crate::error::{LnicError, Result};
use crate::LNIC::context::Context;
use crate::LNIC::header::AppHeader;
use crate::LNIC::queue::{ContextController, QueueInterface};

/// In-memory controller for one core.
///
/// Every completed outbound message is logged. Messages addressed to this
/// core's own address and a registered context are looped back into that
/// context's inbox, with the header naming the sending context. Inbound
/// traffic from elsewhere is injected with [`LoopbackQueue::inject`].
///
/// The cycle counter is a tick that advances by one each time it is sampled.
#[derive(Debug)]
pub struct LoopbackQueue {
    address: u32,
    inboxes: Vec<Inbox>,
    active: Option<ActiveMessage>,
    current_context: Option<u16>,
    tx: TxAssembler,
    transmitted: Vec<Vec<u64>>,
    done_count: u64,
    tick: Cell<u64>,
}

impl LoopbackQueue {
    pub fn new(address: u32) -> Self {
        Self {
            address,
            inboxes: Vec::new(),
            active: None,
            current_context: None,
            tx: TxAssembler::default(),
            transmitted: Vec::new(),
            done_count: 0,
            tick: Cell::new(0),
        }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    /// Queue an inbound message for `context`, as if it came off the network.
    ///
    /// `header` is delivered as given, so it should carry the source address
    /// and context.
    pub fn inject(&mut self, context: u16, header: AppHeader, payload: &[u64]) -> Result<()> {
        let inbox = self
            .inboxes
            .iter_mut()
            .find(|inbox| inbox.context() == context)
            .ok_or(LnicError::ContextNotRegistered(context as u64))?;

        let mut message = Vec::with_capacity(1 + payload.len());
        message.push(header.encode());
        message.extend_from_slice(payload);
        inbox.push(message);
        Ok(())
    }

    /// Completed outbound messages, header word first.
    pub fn transmitted(&self) -> &[Vec<u64>] {
        &self.transmitted
    }

    pub fn take_transmitted(&mut self) -> Vec<Vec<u64>> {
        std::mem::take(&mut self.transmitted)
    }

    /// How many times `done()` was called.
    pub fn done_count(&self) -> u64 {
        self.done_count
    }

    /// Inbound messages not yet started.
    pub fn queued_messages(&self) -> usize {
        self.inboxes.iter().map(Inbox::len).sum()
    }

    fn source_context(&self) -> u16 {
        self.current_context
            .or_else(|| self.inboxes.first().map(Inbox::context))
            .unwrap_or(0)
    }

    fn deliver(&mut self, mut message: Vec<u64>) {
        self.transmitted.push(message.clone());

        let header = AppHeader::decode(message[0]);
        if header.address != self.address {
            tracing::trace!(?header, "message left the core");
            return;
        }

        let source = self.source_context();
        match self
            .inboxes
            .iter_mut()
            .find(|inbox| inbox.context() == header.context)
        {
            Some(inbox) => {
                stamp_source(&mut message, self.address, source);
                inbox.push(message);
            }
            None => tracing::warn!(?header, "loopback to unregistered context dropped"),
        }
    }
}

impl QueueInterface for LoopbackQueue {
    fn ready(&self) -> bool {
        self.active.as_ref().is_some_and(|m| m.remaining() > 0)
            || self.inboxes.iter().any(|inbox| !inbox.is_empty())
    }

    fn read(&mut self) -> Result<u64> {
        if self.active.as_ref().map_or(true, |m| m.remaining() == 0) {
            let idx = next_inbox(&self.inboxes).ok_or(LnicError::QueueEmpty)?;
            let inbox = &mut self.inboxes[idx];
            let context = inbox.context();
            let message = inbox.pop().ok_or(LnicError::QueueEmpty)?;
            self.active = Some(ActiveMessage::new(context, message));
            self.current_context = Some(context);
        }

        self.active
            .as_mut()
            .and_then(|m| m.words.pop_front())
            .ok_or(LnicError::QueueEmpty)
    }

    fn write(&mut self, word: u64) {
        if let Some(message) = self.tx.push(word) {
            self.deliver(message);
        }
    }

    fn done(&mut self) {
        if self.tx.partial() > 0 {
            tracing::warn!(words = self.tx.partial(), "done() with a partially written message");
        }
        self.done_count += 1;
        self.current_context = None;
    }

    fn rx_pending(&self) -> u64 {
        let active = self.active.as_ref().map_or(0, ActiveMessage::remaining);
        active + self.inboxes.iter().map(Inbox::words).sum::<u64>()
    }

    fn cycles(&self) -> u64 {
        let now = self.tick.get() + 1;
        self.tick.set(now);
        now
    }
}

impl ContextController for LoopbackQueue {
    fn register_context(&mut self, context: Context) -> Result<()> {
        let id = context.header_id()?;
        if self.inboxes.iter().any(|inbox| inbox.context() == id) {
            return Err(LnicError::ContextAlreadyRegistered(context.id()));
        }
        self.inboxes.push(Inbox::new(id, context.priority()));
        Ok(())
    }
}
