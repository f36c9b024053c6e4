//! Queue-and-flush message dispatch between stages and the host.
//!
//! Messages published during a frame accumulate in a FIFO queue; the
//! orchestrator flushes them once at the end of the frame. Listeners filter
//! by channel and decide after each delivery whether to stay subscribed.
//!
//! Flush takes a snapshot of the queue, so messages published from inside a
//! listener land in the next frame's batch. A listener that returns
//! [`ListenerAction::Unsubscribe`] still receives the rest of the current
//! batch; removal applies once the whole batch has been delivered.

use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A channel-tagged payload published through the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Routing key listeners filter on.
    pub channel: String,
    /// Entity the message originated from, when one exists.
    pub source: Option<EntityId>,
    /// Structured payload; conventions are per channel.
    pub payload: Value,
}

impl Message {
    /// Build a message on `channel` carrying `payload`, with no source.
    pub fn new(channel: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            source: None,
            payload,
        }
    }

    /// Build a message attributed to `source`.
    pub fn from_entity(source: EntityId, channel: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            source: Some(source),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What a listener wants after handling a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    /// Stay subscribed.
    Keep,
    /// Drop the subscription once the current batch finishes.
    Unsubscribe,
}

type ListenerFn = Box<dyn FnMut(&Message, f32) -> ListenerAction>;

struct Listener {
    id: ListenerId,
    channel: String,
    callback: ListenerFn,
}

// ---------------------------------------------------------------------------
// MessageDispatcher
// ---------------------------------------------------------------------------

/// FIFO message queue with channel-filtered listeners.
#[derive(Default)]
pub struct MessageDispatcher {
    queue: VecDeque<Message>,
    listeners: Vec<Listener>,
    next_id: u64,
}

impl MessageDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for delivery at the next flush.
    pub fn publish(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    /// Subscribe `callback` to every message on `channel`.
    ///
    /// The callback receives each matching message and the frame's timestep,
    /// and returns whether to stay subscribed.
    pub fn subscribe(
        &mut self,
        channel: impl Into<String>,
        callback: impl FnMut(&Message, f32) -> ListenerAction + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            channel: channel.into(),
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a subscription. Returns `false` if the id is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Deliver every queued message to matching listeners in FIFO order.
    ///
    /// The queue is snapshotted first, so publications made by listeners
    /// during delivery wait for the next flush. Unsubscribe requests are
    /// collected during the batch and applied after it completes.
    pub fn flush(&mut self, dt: f32) {
        if self.queue.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.queue);
        let mut dropped: Vec<ListenerId> = Vec::new();
        for message in &batch {
            for listener in &mut self.listeners {
                if listener.channel != message.channel {
                    continue;
                }
                if (listener.callback)(message, dt) == ListenerAction::Unsubscribe {
                    dropped.push(listener.id);
                }
            }
        }
        if !dropped.is_empty() {
            self.listeners
                .retain(|listener| !dropped.contains(&listener.id));
        }
    }

    /// Number of messages waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of active subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("pending", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publish_queues_until_flush() {
        let mut dispatcher = MessageDispatcher::new();
        let received = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&received);
        dispatcher.subscribe("hit", move |message, _dt| {
            sink.borrow_mut().push(message.payload.clone());
            ListenerAction::Keep
        });

        dispatcher.publish(Message::new("hit", json!({"amount": 3})));
        assert_eq!(dispatcher.pending(), 1);
        assert!(received.borrow().is_empty(), "nothing delivered before flush");

        dispatcher.flush(0.016);
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(received.borrow().as_slice(), &[json!({"amount": 3})]);
    }

    #[test]
    fn channel_filtering() {
        let mut dispatcher = MessageDispatcher::new();
        let hits = Rc::new(RefCell::new(0u32));

        let sink = Rc::clone(&hits);
        dispatcher.subscribe("hit", move |_message, _dt| {
            *sink.borrow_mut() += 1;
            ListenerAction::Keep
        });

        dispatcher.publish(Message::new("hit", json!(null)));
        dispatcher.publish(Message::new("miss", json!(null)));
        dispatcher.publish(Message::new("hit", json!(null)));
        dispatcher.flush(0.016);

        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn fifo_delivery_order() {
        let mut dispatcher = MessageDispatcher::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&order);
        dispatcher.subscribe("seq", move |message, _dt| {
            sink.borrow_mut().push(message.payload.clone());
            ListenerAction::Keep
        });

        for i in 0..5 {
            dispatcher.publish(Message::new("seq", json!(i)));
        }
        dispatcher.flush(0.016);

        assert_eq!(
            order.borrow().as_slice(),
            &[json!(0), json!(1), json!(2), json!(3), json!(4)]
        );
    }

    #[test]
    fn unsubscribing_listener_receives_rest_of_batch() {
        let mut dispatcher = MessageDispatcher::new();
        let count = Rc::new(RefCell::new(0u32));

        let sink = Rc::clone(&count);
        dispatcher.subscribe("tick", move |_message, _dt| {
            *sink.borrow_mut() += 1;
            ListenerAction::Unsubscribe
        });

        dispatcher.publish(Message::new("tick", json!(1)));
        dispatcher.publish(Message::new("tick", json!(2)));
        dispatcher.publish(Message::new("tick", json!(3)));
        dispatcher.flush(0.016);

        assert_eq!(*count.borrow(), 3, "full batch delivered before removal");
        assert_eq!(dispatcher.listener_count(), 0);

        dispatcher.publish(Message::new("tick", json!(4)));
        dispatcher.flush(0.016);
        assert_eq!(*count.borrow(), 3, "removed listener sees nothing new");
    }

    #[test]
    fn messages_published_during_flush_wait_for_next_flush() {
        let mut dispatcher = MessageDispatcher::new();
        let echoes = Rc::new(RefCell::new(0u32));

        let sink = Rc::clone(&echoes);
        dispatcher.subscribe("echo", move |_message, _dt| {
            *sink.borrow_mut() += 1;
            ListenerAction::Keep
        });

        // A listener on "ping" that republishes onto "echo" cannot publish
        // directly into the dispatcher it is borrowed from, so the host
        // pattern is to queue follow-ups itself. Model that by publishing
        // after the first flush and asserting batch separation.
        dispatcher.publish(Message::new("ping", json!(null)));
        dispatcher.flush(0.016);
        assert_eq!(*echoes.borrow(), 0);

        dispatcher.publish(Message::new("echo", json!(null)));
        assert_eq!(*echoes.borrow(), 0, "still queued");
        dispatcher.flush(0.016);
        assert_eq!(*echoes.borrow(), 1);
    }

    #[test]
    fn explicit_unsubscribe_by_id() {
        let mut dispatcher = MessageDispatcher::new();
        let id = dispatcher.subscribe("x", |_message, _dt| ListenerAction::Keep);
        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id), "second removal is a no-op");
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn listener_receives_frame_dt() {
        let mut dispatcher = MessageDispatcher::new();
        let seen_dt = Rc::new(RefCell::new(0.0f32));

        let sink = Rc::clone(&seen_dt);
        dispatcher.subscribe("dt", move |_message, dt| {
            *sink.borrow_mut() = dt;
            ListenerAction::Keep
        });

        dispatcher.publish(Message::new("dt", json!(null)));
        dispatcher.flush(0.25);
        assert_eq!(*seen_dt.borrow(), 0.25);
    }
}
