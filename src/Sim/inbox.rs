// Building blocks shared by the simulated queue controllers.

use std::collections::VecDeque;

use crate::LNIC::header::AppHeader;

/// Whole messages queued for one context, header word first.
#[derive(Debug)]
pub struct Inbox {
    context: u16,
    priority: u64,
    messages: VecDeque<Vec<u64>>,
    words: u64,
}

impl Inbox {
    pub fn new(context: u16, priority: u64) -> Self {
        Self {
            context,
            priority,
            messages: VecDeque::new(),
            words: 0,
        }
    }

    pub fn context(&self) -> u16 {
        self.context
    }

    pub fn priority(&self) -> u64 {
        self.priority
    }

    pub fn push(&mut self, message: Vec<u64>) {
        self.words += message.len() as u64;
        self.messages.push_back(message);
    }

    pub fn pop(&mut self) -> Option<Vec<u64>> {
        let message = self.messages.pop_front()?;
        self.words -= message.len() as u64;
        Some(message)
    }

    /// Words queued across all messages.
    pub fn words(&self) -> u64 {
        self.words
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Index of the inbox to serve next: lowest priority value wins, earlier
/// registration breaks ties.
pub fn next_inbox<'a, I>(inboxes: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a Inbox>,
{
    inboxes
        .into_iter()
        .enumerate()
        .filter(|(_, inbox)| !inbox.is_empty())
        .min_by_key(|(idx, inbox)| (inbox.priority, *idx))
        .map(|(idx, _)| idx)
}

/// The message a core is currently reading.
#[derive(Debug)]
pub struct ActiveMessage {
    pub context: u16,
    pub words: VecDeque<u64>,
}

impl ActiveMessage {
    pub fn new(context: u16, message: Vec<u64>) -> Self {
        Self {
            context,
            words: message.into(),
        }
    }

    pub fn remaining(&self) -> u64 {
        self.words.len() as u64
    }
}

/// Collects transmit words until the header's declared payload is complete.
#[derive(Debug, Default)]
pub struct TxAssembler {
    words: Vec<u64>,
}

impl TxAssembler {
    /// Push one word; returns the message once header + payload are written.
    pub fn push(&mut self, word: u64) -> Option<Vec<u64>> {
        self.words.push(word);
        let expected = 1 + AppHeader::decode(self.words[0]).word_count();
        if self.words.len() == expected {
            return Some(std::mem::take(&mut self.words));
        }
        None
    }

    /// Words of an unfinished message.
    pub fn partial(&self) -> usize {
        self.words.len()
    }
}

/// Rewrite a delivered message's header so it names its source.
pub fn stamp_source(message: &mut [u64], address: u32, context: u16) {
    if let Some(first) = message.first_mut() {
        let header = AppHeader::decode(*first);
        *first = AppHeader::new(address, context, header.length).encode();
    }
}
