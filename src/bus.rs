//! Event dispatch bus.
//!
//! Connects the decoders to whoever is currently listening: the engine's
//! prompt-routing listener plus any session-level observers. Fan-out is
//! synchronous and ordered by registration. A failing listener is logged and
//! skipped; it never prevents the remaining listeners from running.

use tracing::warn;

use crate::error::Error;
use crate::input::Event;

/// A registered listener. Returning `Err` marks this dispatch as failed for
/// this listener only.
pub type Listener = Box<dyn FnMut(&Event) -> Result<(), Error>>;

/// Token returned by [`EventBus::subscribe`]; pass back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

/// Ordered synchronous pub/sub registry.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; fan-out order is registration order.
    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&Event) -> Result<(), Error> + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        Subscription(id)
    }

    /// Remove a listener. Unknown tokens are ignored.
    pub fn unsubscribe(&mut self, sub: Subscription) {
        self.listeners.retain(|(id, _)| *id != sub.0);
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Dispatch an event to every listener in order. Listener failures are
    /// isolated: logged, then dispatch continues.
    pub fn emit(&mut self, event: &Event) {
        for (id, listener) in &mut self.listeners {
            if let Err(e) = listener(event) {
                warn!(listener = *id, error = %e, "event listener failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, KeyEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn key_event() -> Event {
        Event::Key(KeyEvent::press(Key::Enter, b"\r"))
    }

    #[test]
    fn test_fanout_preserves_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["first", "second", "third"] {
            let order = order.clone();
            bus.subscribe(move |_| {
                order.borrow_mut().push(tag);
                Ok(())
            });
        }
        bus.emit(&key_event());
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_listener_does_not_stop_dispatch() {
        let reached = Rc::new(RefCell::new(false));
        let mut bus = EventBus::new();
        bus.subscribe(|_| Err(Error::Listener("boom".into())));
        {
            let reached = reached.clone();
            bus.subscribe(move |_| {
                *reached.borrow_mut() = true;
                Ok(())
            });
        }
        bus.emit(&key_event());
        assert!(*reached.borrow());
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let sub = {
            let count = count.clone();
            bus.subscribe(move |_| {
                *count.borrow_mut() += 1;
                Ok(())
            })
        };
        bus.emit(&key_event());
        bus.unsubscribe(sub);
        bus.emit(&key_event());
        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }
}
