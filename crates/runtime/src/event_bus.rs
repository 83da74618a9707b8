use std::collections::VecDeque;

use tracing::trace;

use crate::frame::Frame;

/// An emitted event stamped with the frame it was raised in.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<E> {
    pub frame_index: u64,
    /// Monotonic emission counter, unique per bus.
    pub seq: u64,
    pub event: E,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&Envelope<E>)>;

struct Subscriber<E> {
    id: SubscriptionId,
    once: bool,
    handler: Handler<E>,
}

/// Typed notification channel.
///
/// Handlers run synchronously inside `emit`, in subscription order. Every
/// emitted event is also kept in a bounded journal that pull-style consumers
/// (the CLI, the wasm bridge, tests) read with `events` / `drain`.
pub struct EventBus<E> {
    next_seq: u64,
    next_subscription: u64,
    subscribers: Vec<Subscriber<E>>,
    journal: VecDeque<Envelope<E>>,
    journal_limit: usize,
}

pub const DEFAULT_JOURNAL_LIMIT: usize = 1024;

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::with_journal_limit(DEFAULT_JOURNAL_LIMIT)
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("next_seq", &self.next_seq)
            .field("subscribers", &self.subscribers.len())
            .field("journal", &self.journal.len())
            .finish()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A journal limit of 0 disables recording; handlers still run.
    pub fn with_journal_limit(journal_limit: usize) -> Self {
        Self {
            next_seq: 0,
            next_subscription: 0,
            subscribers: Vec::new(),
            journal: VecDeque::new(),
            journal_limit,
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&Envelope<E>) + 'static) -> SubscriptionId {
        self.push_subscriber(false, Box::new(handler))
    }

    /// Subscribes a handler that is removed after its first invocation.
    pub fn subscribe_once(
        &mut self,
        handler: impl FnMut(&Envelope<E>) + 'static,
    ) -> SubscriptionId {
        self.push_subscriber(true, Box::new(handler))
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        before != self.subscribers.len()
    }

    pub fn emit(&mut self, frame: Frame, event: E) {
        let envelope = Envelope {
            frame_index: frame.index,
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;
        trace!(seq = envelope.seq, frame = envelope.frame_index, "event emitted");

        for sub in &mut self.subscribers {
            (sub.handler)(&envelope);
        }
        self.subscribers.retain(|s| !s.once);

        if self.journal_limit == 0 {
            return;
        }
        if self.journal.len() == self.journal_limit {
            self.journal.pop_front();
        }
        self.journal.push_back(envelope);
    }

    pub fn events(&self) -> impl Iterator<Item = &Envelope<E>> + '_ {
        self.journal.iter()
    }

    pub fn len(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Envelope<E>> {
        self.journal.drain(..).collect()
    }

    fn push_subscriber(&mut self, once: bool, handler: Handler<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber { id, once, handler });
        id
    }
}
