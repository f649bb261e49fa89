// Multi-core queue controller shared between threads.
//
// Routing is by (address, context). Several cores may share an address as
// long as each context is owned by exactly one of them.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

use super::inbox::{next_inbox, stamp_source, ActiveMessage, Inbox, TxAssembler};
use crate::error::{LnicError, Result};
use crate::Core::clock;
use crate::LNIC::context::Context;
use crate::LNIC::header::AppHeader;
use crate::LNIC::queue::{ContextController, QueueInterface};

/// Per-core readiness indicator, polled without taking the fabric lock.
#[derive(Debug, Default)]
pub(crate) struct CoreSignal {
    /// Messages queued for this core and not yet started.
    pub(crate) queued: CachePadded<AtomicU64>,
}

struct Route {
    inbox: Inbox,
    owner: Arc<CoreSignal>,
}

#[derive(Default)]
pub(crate) struct Fabric {
    routes: HashMap<(u32, u16), Route>,
    pub(crate) delivered: u64,
    pub(crate) dropped: u64,
}

impl Fabric {
    pub(crate) fn route_count(&self) -> usize {
        self.routes.len()
    }
}

/// The simulated controller. Cheap to clone; clones share one fabric.
#[derive(Clone, Default)]
pub struct SimNetwork {
    pub(crate) fabric: Arc<Mutex<Fabric>>,
}

impl SimNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new core at `address`.
    pub fn attach(&self, address: u32) -> SimCore {
        SimCore {
            network: self.clone(),
            address,
            contexts: Vec::new(),
            signal: Arc::new(CoreSignal::default()),
            active: None,
            current_context: None,
            tx: TxAssembler::default(),
            done_count: 0,
        }
    }

    /// Messages handed to a registered context so far.
    pub fn delivered(&self) -> u64 {
        self.fabric.lock().delivered
    }

    /// Messages sent to an unregistered (address, context).
    pub fn dropped(&self) -> u64 {
        self.fabric.lock().dropped
    }
}

/// One core attached to a [`SimNetwork`].
pub struct SimCore {
    pub(crate) network: SimNetwork,
    pub(crate) address: u32,
    /// Registered header context ids, in registration order.
    pub(crate) contexts: Vec<u16>,
    pub(crate) signal: Arc<CoreSignal>,
    pub(crate) active: Option<ActiveMessage>,
    current_context: Option<u16>,
    tx: TxAssembler,
    pub(crate) done_count: u64,
}

impl SimCore {
    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn done_count(&self) -> u64 {
        self.done_count
    }

    fn source_context(&self) -> u16 {
        self.current_context
            .or_else(|| self.contexts.first().copied())
            .unwrap_or(0)
    }

    fn deliver(&mut self, mut message: Vec<u64>) {
        let header = AppHeader::decode(message[0]);
        let source = self.source_context();

        let mut guard = self.network.fabric.lock();
        let fabric = &mut *guard;
        match fabric.routes.get_mut(&(header.address, header.context)) {
            Some(route) => {
                stamp_source(&mut message, self.address, source);
                route.inbox.push(message);
                route.owner.queued.fetch_add(1, Release);
                fabric.delivered += 1;
                tracing::trace!(?header, source, "message delivered");
            }
            None => {
                fabric.dropped += 1;
                tracing::warn!(
                    address = header.address,
                    context = header.context,
                    "no context registered for destination, message dropped"
                );
            }
        }
    }

    /// Move the next message (by priority) out of this core's inboxes.
    fn activate_next(&mut self) -> Result<()> {
        let mut fabric = self.network.fabric.lock();

        let mut owned: Vec<&mut Route> = Vec::with_capacity(self.contexts.len());
        let address = self.address;
        let contexts = &self.contexts;
        for (key, route) in fabric.routes.iter_mut() {
            if key.0 == address && contexts.contains(&key.1) {
                owned.push(route);
            }
        }
        // Registration order decides ties between equal priorities.
        owned.sort_by_key(|route| {
            contexts
                .iter()
                .position(|&c| c == route.inbox.context())
                .unwrap_or(usize::MAX)
        });

        let idx = next_inbox(owned.iter().map(|route| &route.inbox)).ok_or(LnicError::QueueEmpty)?;
        let route = &mut owned[idx];
        let context = route.inbox.context();
        let message = route.inbox.pop().ok_or(LnicError::QueueEmpty)?;
        self.signal.queued.fetch_sub(1, AcqRel);

        self.active = Some(ActiveMessage::new(context, message));
        self.current_context = Some(context);
        Ok(())
    }
}

impl QueueInterface for SimCore {
    fn ready(&self) -> bool {
        self.active.as_ref().is_some_and(|m| m.remaining() > 0)
            || self.signal.queued.load(Acquire) > 0
    }

    fn read(&mut self) -> Result<u64> {
        if self.active.as_ref().map_or(true, |m| m.remaining() == 0) {
            self.activate_next()?;
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
        let fabric = self.network.fabric.lock();
        let queued: u64 = self
            .contexts
            .iter()
            .filter_map(|&c| fabric.routes.get(&(self.address, c)))
            .map(|route| route.inbox.words())
            .sum();
        active + queued
    }

    fn cycles(&self) -> u64 {
        clock::cycles()
    }
}

impl ContextController for SimCore {
    fn register_context(&mut self, context: Context) -> Result<()> {
        let id = context.header_id()?;
        let mut fabric = self.network.fabric.lock();
        if fabric.routes.contains_key(&(self.address, id)) {
            return Err(LnicError::ContextAlreadyRegistered(context.id()));
        }
        fabric.routes.insert(
            (self.address, id),
            Route {
                inbox: Inbox::new(id, context.priority()),
                owner: Arc::clone(&self.signal),
            },
        );
        self.contexts.push(id);
        Ok(())
    }
}
