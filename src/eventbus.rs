use crate::error::{Error, Result};
use crate::event::{DeviceEvent, Transition};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::{mpsc, Arc, Weak};

/// Default cap on registered listeners per bus.
pub const MAX_LISTENERS_DEFAULT: usize = 64;

/// Trait for reacting to decoded device events.
pub trait EventListener: Send {
    fn on_event(&mut self, event: &DeviceEvent);

    /// `true` once the listener can no longer deliver anything. Closed listeners are
    /// unregistered by the bus and stop counting against its cap.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Determines which kinds of events a listener wants to receive.
#[derive(Debug, Clone, Copy)]
pub enum EventFilter {
    All,
    SticksOnly,
    ButtonsOnly,
    StatusesOnly,
    Custom(fn(&DeviceEvent) -> bool),
}

impl EventFilter {
    fn accepts(&self, event: &DeviceEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::SticksOnly => event.transition() == Transition::Move,
            EventFilter::ButtonsOnly => matches!(
                event.transition(),
                Transition::Press | Transition::Release
            ),
            EventFilter::StatusesOnly => event.transition() == Transition::Change,
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Metadata-wrapped listener with filters and control flags.
struct ListenerEntry {
    listener: Box<dyn EventListener>,
    enabled: bool,
    filter: EventFilter,
    field: Option<String>, // only events from this field
}

/// Publish/subscribe surface for decoded events.
///
/// Listeners are called synchronously, in registration order, from [`emit_all`]. The bus
/// refuses registrations beyond its listener cap so long-running processes that keep
/// resubscribing surface the leak as an error.
///
/// [`emit_all`]: EventBus::emit_all
pub struct EventBus {
    next_id: u64,
    max_listeners: usize,
    listeners: BTreeMap<u64, ListenerEntry>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_max_listeners(MAX_LISTENERS_DEFAULT)
    }

    pub fn with_max_listeners(max_listeners: usize) -> Self {
        Self {
            next_id: 0,
            max_listeners,
            listeners: BTreeMap::new(),
        }
    }

    /// Registers a listener with optional filtering by field name.
    pub fn add_listener(
        &mut self,
        listener: impl EventListener + 'static,
        filter: EventFilter,
        field: Option<String>,
    ) -> Result<u64> {
        self.prune();
        if self.listeners.len() >= self.max_listeners {
            return Err(Error::TooManyListeners {
                max: self.max_listeners,
            });
        }
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
                field,
            },
        );
        self.next_id += 1;
        Ok(id)
    }

    /// Registers a channel-backed listener and returns its id and receiving end.
    ///
    /// Dropping the [`Subscription`] unregisters the listener the next time the bus emits
    /// or registers a listener.
    pub fn subscribe(
        &mut self,
        filter: EventFilter,
        field: Option<String>,
    ) -> Result<(u64, Subscription)> {
        let (tx, rx) = mpsc::channel();
        let alive = Arc::new(());
        let listener = ChannelListener {
            tx,
            alive: Some(Arc::downgrade(&alive)),
            closed: false,
        };
        let id = self.add_listener(listener, filter, field)?;
        Ok((id, Subscription { rx, _alive: alive }))
    }

    /// Enables a previously registered listener.
    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Disables (mutes) a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    /// Unregisters a listener entirely.
    pub fn remove_listener(&mut self, id: u64) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Number of registered listeners, closed ones included until the next prune.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Emits one event to all active and matching listeners.
    fn emit(&mut self, event: &DeviceEvent) {
        for entry in self.listeners.values_mut() {
            if !entry.enabled {
                continue;
            }

            if let Some(ref wanted) = entry.field {
                if event.field() != wanted {
                    continue;
                }
            }

            if entry.filter.accepts(event) {
                entry.listener.on_event(event);
            }
        }
    }

    /// Emits a batch of events to matching listeners.
    pub fn emit_all(&mut self, events: &[DeviceEvent]) {
        for event in events {
            self.emit(event);
        }
        self.prune();
    }

    fn prune(&mut self) {
        self.listeners.retain(|_, entry| !entry.listener.is_closed());
    }
}

/// Receiving end of [`EventBus::subscribe`].
///
/// Derefs to the underlying [`mpsc::Receiver`]. Dropping it closes the subscription.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<DeviceEvent>,
    _alive: Arc<()>,
}

impl Deref for Subscription {
    type Target = mpsc::Receiver<DeviceEvent>;

    fn deref(&self) -> &Self::Target {
        &self.rx
    }
}

/// Forwards events into an `mpsc` channel.
///
/// The listener closes once a send fails because the receiver is gone.
pub struct ChannelListener {
    tx: mpsc::Sender<DeviceEvent>,
    alive: Option<Weak<()>>,
    closed: bool,
}

impl ChannelListener {
    pub fn new(tx: mpsc::Sender<DeviceEvent>) -> Self {
        Self {
            tx,
            alive: None,
            closed: false,
        }
    }
}

impl EventListener for ChannelListener {
    fn on_event(&mut self, event: &DeviceEvent) {
        if self.closed {
            return;
        }
        if self.tx.send(event.clone()).is_err() {
            self.closed = true;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
            || self
                .alive
                .as_ref()
                .is_some_and(|alive| alive.strong_count() == 0)
    }
}
