use crate::event::DeviceEvent;
use crate::eventbus::EventListener;

/// Wraps a listener and filters events based on a user-supplied predicate.
///
/// Useful when [`EventFilter`](crate::eventbus::EventFilter) is too coarse, e.g. to only
/// forward stick moves past some threshold.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&DeviceEvent) -> bool + Send + Sync>,
    inner: Box<dyn EventListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&DeviceEvent) -> bool + Send + Sync + 'static,
        inner: impl EventListener + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner: Box::new(inner),
        }
    }
}

impl EventListener for FilteredListener {
    fn on_event(&mut self, event: &DeviceEvent) {
        if (self.predicate)(event) {
            self.inner.on_event(event);
        }
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventbus::{EventBus, EventFilter};

    #[test]
    fn forwards_only_matching_events() {
        let mut bus = EventBus::new();
        let (tx, rx) = std::sync::mpsc::channel();
        let far_right = FilteredListener::new(
            |e| matches!(e, DeviceEvent::StickMoved { x, .. } if *x > 200),
            crate::eventbus::ChannelListener::new(tx),
        );
        bus.add_listener(far_right, EventFilter::All, None).unwrap();

        bus.emit_all(&[
            DeviceEvent::StickMoved {
                name: "left".into(),
                x: 128,
                y: 128,
            },
            DeviceEvent::StickMoved {
                name: "left".into(),
                x: 250,
                y: 128,
            },
        ]);

        let got: Vec<DeviceEvent> = rx.try_iter().collect();
        assert_eq!(got.len(), 1);
        assert!(matches!(got[0], DeviceEvent::StickMoved { x: 250, .. }));

        // Closing the wrapped listener closes the wrapper too.
        drop(rx);
        bus.emit_all(&[DeviceEvent::StickMoved {
            name: "left".into(),
            x: 255,
            y: 128,
        }]);
        assert!(bus.is_empty());
    }
}
