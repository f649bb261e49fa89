use super::queue::ContextController;
use crate::error::{LnicError, Result};

/// A logical inbound/outbound message stream owned by one core.
///
/// Lower `priority` values are scheduled first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Context {
    id: u64,
    priority: u64,
}

impl Context {
    pub fn new(id: u64, priority: u64) -> Self {
        Self { id, priority }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn priority(&self) -> u64 {
        self.priority
    }

    /// The id as carried in the 16-bit header context field.
    pub fn header_id(&self) -> Result<u16> {
        u16::try_from(self.id).map_err(|_| LnicError::ContextOutOfRange(self.id))
    }
}

/// Per-core record of the contexts registered with the controller.
#[derive(Debug, Default)]
pub struct ContextManager {
    registered: Vec<Context>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` with the controller.
    ///
    /// A second registration of the same id is a programming error and fails
    /// before the controller is touched.
    pub fn add_context<C: ContextController + ?Sized>(
        &mut self,
        controller: &mut C,
        id: u64,
        priority: u64,
    ) -> Result<Context> {
        if self.get(id).is_some() {
            tracing::error!(context = id, "context registered twice");
            return Err(LnicError::ContextAlreadyRegistered(id));
        }

        let context = Context::new(id, priority);
        controller.register_context(context)?;
        self.registered.push(context);
        tracing::debug!(context = id, priority, "context registered");
        Ok(context)
    }

    pub fn get(&self, id: u64) -> Option<&Context> {
        self.registered.iter().find(|c| c.id == id)
    }

    /// Look up `id`, failing fast if it was never registered.
    pub fn require(&self, id: u64) -> Result<&Context> {
        self.get(id).ok_or(LnicError::ContextNotRegistered(id))
    }

    pub fn contexts(&self) -> &[Context] {
        &self.registered
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}
